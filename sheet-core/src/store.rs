//! Character persistence.
//!
//! Normalized records are kept under a generated id together with a display
//! name and upload time. `JsonFileStore` keeps everything in one versioned
//! JSON file; `MemoryStore` keeps it in process.

use crate::character::CharacterRecord;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current store file version.
const STORE_VERSION: u32 = 1;

/// Store file used when nothing else is configured.
pub const DEFAULT_STORE_PATH: &str = "characters.json";

/// Environment variable overriding the store path.
pub const STORE_PATH_ENV: &str = "SHEET_STORE";

/// Display name for a character saved without one.
pub const UNNAMED_CHARACTER: &str = "Unnamed Character";

/// Where the file store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store file path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Default config, with the path taken from `SHEET_STORE` when set.
    pub fn from_env() -> Self {
        match std::env::var(STORE_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::new().with_path(path),
            _ => Self::new(),
        }
    }
}

/// A normalized record as kept by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCharacter {
    pub id: String,
    /// Display name; independent of `data.name` once renamed.
    pub name: String,
    pub data: CharacterRecord,
    /// RFC 3339 timestamp.
    pub uploaded_at: String,
}

impl StoredCharacter {
    /// Wrap a record under a fresh id.
    ///
    /// The display name is `name` if non-empty, else the record's own name,
    /// else "Unnamed Character".
    pub fn new(data: CharacterRecord, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| Some(data.name.as_str()).filter(|n| !n.is_empty()))
            .unwrap_or(UNNAMED_CHARACTER)
            .to_string();

        Self {
            id: new_id(),
            name,
            data,
            uploaded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn new_id() -> String {
    format!("char-{}", Uuid::new_v4().simple())
}

/// Storage for normalized characters.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Every stored character, in insertion order.
    async fn list(&self) -> Result<Vec<StoredCharacter>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<StoredCharacter>, StoreError>;

    /// Store a record and return its new id.
    async fn save(
        &self,
        record: CharacterRecord,
        name: Option<&str>,
    ) -> Result<String, StoreError>;

    /// Remove a character. Returns false if no character had this id.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Change the display name only. Returns false if no character had this id.
    async fn rename(&self, id: &str, name: &str) -> Result<bool, StoreError>;
}

/// On-disk layout of the store file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    characters: Vec<StoredCharacter>,
}

/// All characters in a single JSON file.
///
/// Every write rewrites the whole file. The mutex serializes
/// read-modify-write cycles within one process.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<StoredCharacter>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let file: StoreFile = serde_json::from_str(&content)?;

        if file.version != STORE_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: STORE_VERSION,
                found: file.version,
            });
        }

        Ok(file.characters)
    }

    async fn write(&self, characters: Vec<StoredCharacter>) -> Result<(), StoreError> {
        let file = StoreFile {
            version: STORE_VERSION,
            characters,
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl CharacterStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<StoredCharacter>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get(&self, id: &str) -> Result<Option<StoredCharacter>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|c| c.id == id))
    }

    async fn save(
        &self,
        record: CharacterRecord,
        name: Option<&str>,
    ) -> Result<String, StoreError> {
        let _guard = self.lock.lock().await;
        let mut characters = self.load().await?;
        let stored = StoredCharacter::new(record, name);
        let id = stored.id.clone();
        info!(%id, name = %stored.name, path = %self.path.display(), "saving character");
        characters.push(stored);
        self.write(characters).await?;
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut characters = self.load().await?;
        let before = characters.len();
        characters.retain(|c| c.id != id);
        if characters.len() == before {
            return Ok(false);
        }
        info!(%id, path = %self.path.display(), "deleted character");
        self.write(characters).await?;
        Ok(true)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut characters = self.load().await?;
        let Some(stored) = characters.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        stored.name = name.to_string();
        info!(%id, %name, path = %self.path.display(), "renamed character");
        self.write(characters).await?;
        Ok(true)
    }
}

/// Characters held in process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    characters: RwLock<Vec<StoredCharacter>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn list(&self) -> Result<Vec<StoredCharacter>, StoreError> {
        Ok(self.characters.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredCharacter>, StoreError> {
        Ok(self
            .characters
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn save(
        &self,
        record: CharacterRecord,
        name: Option<&str>,
    ) -> Result<String, StoreError> {
        let stored = StoredCharacter::new(record, name);
        let id = stored.id.clone();
        self.characters.write().await.push(stored);
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut characters = self.characters.write().await;
        let before = characters.len();
        characters.retain(|c| c.id != id);
        Ok(characters.len() != before)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<bool, StoreError> {
        let mut characters = self.characters.write().await;
        match characters.iter_mut().find(|c| c.id == id) {
            Some(stored) => {
                stored.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
