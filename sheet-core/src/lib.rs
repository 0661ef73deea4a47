//! Normalizer and party store for exported D&D 5e character sheets.
//!
//! This crate provides:
//! - A lenient reader for virtual-tabletop actor exports
//! - Normalization of an export into a flat [`CharacterRecord`]
//! - 5e derivations (level from XP, modifiers, proficiency)
//! - Spellbook and inventory views over normalized records
//! - Character persistence behind the [`CharacterStore`] trait
//!
//! # Quick Start
//!
//! ```ignore
//! use sheet_core::{import_file, CharacterStore, JsonFileStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let record = import_file("aria.json").await?;
//!     println!("{} is level {}", record.name, record.level);
//!
//!     let store = JsonFileStore::from_config(&StoreConfig::from_env());
//!     let id = store.save(record, None).await?;
//!     println!("saved as {id}");
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod classify;
pub mod inventory;
pub mod normalize;
pub mod rules;
pub mod source;
pub mod spellbook;
pub mod store;
pub mod testing;

// Primary public API
pub use character::{Ability, CharacterRecord, Item, Skill, Spell};
pub use inventory::{character_inventory, party_inventory, EquippedFilter, ItemFilter};
pub use normalize::{import_file, import_str, import_value, normalize, ImportError};
pub use source::SourceDocument;
pub use spellbook::{spellbook, PreparedFilter, SpellFilter};
pub use store::{
    CharacterStore, JsonFileStore, MemoryStore, StoreConfig, StoreError, StoredCharacter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_camel_case() {
        let record = import_value(json!({
            "name": "Aria",
            "system": {
                "details": { "xp": { "value": 900 } },
                "abilities": { "str": { "value": 14, "proficient": 1 } }
            },
            "items": []
        }))
        .unwrap();

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["name"], "Aria");
        assert_eq!(out["level"], 3);
        assert_eq!(out["abilityScores"]["str"]["value"], 14);
        assert_eq!(out["abilityScores"]["str"]["modifier"], 2);
        assert_eq!(out["abilityScores"]["str"]["proficient"], true);
        assert_eq!(out["items"], json!([]));
        assert_eq!(out["spells"], json!([]));
        assert_eq!(out["containers"], json!([]));
    }

    #[test]
    fn test_record_deserializes_from_own_output() {
        let record = import_value(json!({ "name": "Pip", "items": [] })).unwrap();
        let text = serde_json::to_string(&record).unwrap();
        let back: CharacterRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }
}
