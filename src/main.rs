use anyhow::{bail, Context};
use moving_inventory::config::AppConfig;
use moving_inventory::logic::InventoryOperations;
use moving_inventory::model::{InventoryRow, UserContext};
use moving_inventory::seed;
use moving_inventory::store::{InventoryStore, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    moving_inventory::init_logging(&config.logging.level);

    let store = MemoryStore::new();
    match config.input_path() {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let rows: Vec<InventoryRow> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse inventory rows from {}", path.display()))?;
            log::info!("Loaded {} rows from {}", rows.len(), path.display());
            store.load_rows(rows);
        }
        None if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" => {
            log::info!("Loading seed data...");
            seed::load_seed_data(&store).await?;
        }
        None => bail!(
            "No input configured: set MOVINV_INVENTORY__INPUT_PATH or LOAD_SEED_DATA=true"
        ),
    }

    let user = UserContext::system();
    for stop_id in store.list_stops().await? {
        if config.inventory.migrate_to_storage {
            let migration = InventoryOperations::migrate_to_storage(
                &store,
                &stop_id,
                None,
                &config.inventory.storage_tag,
                &user,
            )
            .await?;
            for (room, rows) in migration.rooms() {
                let room = room.map(|r| r.to_string()).unwrap_or_else(|| "unassigned".to_string());
                log::info!("Stop {} room {}: {} row(s) in storage", stop_id, room, rows.len());
            }
        } else if config.inventory.consolidate {
            InventoryOperations::consolidate_stop(&store, &stop_id, &user).await?;
        }
    }

    let output = serde_json::to_string_pretty(&store.all_rows())?;
    match config.output_path() {
        Some(path) => {
            std::fs::write(&path, output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {} rows to {}", store.len(), path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}
