//! Command-line viewer for exported D&D 5e character sheets.
//!
//! Normalizes virtual-tabletop exports and keeps a party of them in a JSON
//! store file:
//!
//! ```bash
//! cargo run -p sheet -- import aria.json --name "Aria"
//! cargo run -p sheet -- show char-3f2a... --spells --inventory
//! cargo run -p sheet -- party --equipped
//! ```
//!
//! The store path comes from `--store`, then `SHEET_STORE` (a `.env` file is
//! read), then `characters.json`.

mod render;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use sheet_core::inventory::EquippedFilter;
use sheet_core::{
    character_inventory, import_file, party_inventory, spellbook, CharacterStore, ItemFilter,
    JsonFileStore, SpellFilter, StoreConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheet", about = "Normalize and browse exported D&D 5e characters")]
struct Cli {
    /// Character store file.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the normalized record of an export as JSON.
    Normalize {
        file: PathBuf,
    },
    /// Normalize an export and add it to the store.
    Import {
        file: PathBuf,
        /// Display name; defaults to the character's own name.
        #[arg(long)]
        name: Option<String>,
    },
    /// List stored characters.
    List,
    /// Show a stored character's sheet.
    Show {
        id: String,
        /// Include the spellbook.
        #[arg(long)]
        spells: bool,
        /// Include the inventory.
        #[arg(long)]
        inventory: bool,
    },
    /// Change a stored character's display name.
    Rename { id: String, name: String },
    /// Remove a stored character.
    Delete { id: String },
    /// Inventory across every stored character.
    Party(PartyArgs),
}

#[derive(Args)]
struct PartyArgs {
    /// Only items of this type.
    #[arg(long = "type")]
    item_type: Option<String>,
    #[arg(long, conflicts_with = "unequipped")]
    equipped: bool,
    #[arg(long)]
    unequipped: bool,
}

impl PartyArgs {
    fn filter(&self) -> ItemFilter {
        let equipped = if self.equipped {
            EquippedFilter::Equipped
        } else if self.unequipped {
            EquippedFilter::Unequipped
        } else {
            EquippedFilter::All
        };
        let filter = ItemFilter::default().with_equipped(equipped);
        match &self.item_type {
            Some(t) => filter.with_type(t.clone()),
            None => filter,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.store {
        Some(path) => StoreConfig::new().with_path(path),
        None => StoreConfig::from_env(),
    };
    let store = JsonFileStore::from_config(&config);

    match cli.command {
        Command::Normalize { file } => {
            let record = import_file(&file).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Import { file, name } => {
            let record = import_file(&file).await?;
            let id = store.save(record, name.as_deref()).await?;
            println!("{id}");
        }
        Command::List => {
            let characters = store.list().await?;
            print!("{}", render::character_list(&characters));
        }
        Command::Show {
            id,
            spells,
            inventory,
        } => {
            let Some(stored) = store.get(&id).await? else {
                bail!("no character with id {id}");
            };
            print!("{}", render::sheet(&stored.name, &stored.data));
            if spells {
                let groups = spellbook(&stored.data, &SpellFilter::default());
                println!("\nSpellbook");
                print!("{}", render::spellbook(&stored.data, &groups));
            }
            if inventory {
                let groups = character_inventory(&stored.data, &ItemFilter::default());
                println!("\nInventory");
                print!("{}", render::inventory(&groups));
            }
        }
        Command::Rename { id, name } => {
            if !store.rename(&id, &name).await? {
                bail!("no character with id {id}");
            }
        }
        Command::Delete { id } => {
            if !store.delete(&id).await? {
                bail!("no character with id {id}");
            }
        }
        Command::Party(args) => {
            let characters = store.list().await?;
            let inventory = party_inventory(&characters, &args.filter());
            print!("{}", render::party(&inventory));
        }
    }

    Ok(())
}
