use anyhow::{bail, Context, Result};
use moving_inventory::config::AppConfig;
use moving_inventory::logic::{audit_grouping_keys, KeyProblem};
use moving_inventory::model::InventoryRow;

/// Check an inventory export for grouping keys that no longer match their rows.
///
/// The export path is taken from the first argument, falling back to the
/// configured input path.
fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    moving_inventory::init_logging(&config.logging.level);

    let path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .or_else(|| config.input_path())
        .context("Usage: verify-grouping-keys <export.json>")?;

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let rows: Vec<InventoryRow> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse inventory rows from {}", path.display()))?;

    let audit = audit_grouping_keys(&rows);
    println!("Checked {} rows from {}", audit.rows_checked, path.display());

    for problem in &audit.problems {
        match problem {
            KeyProblem::Missing { row_id, expected } => {
                println!("  {}: no stored key, expected {:?}", row_id, expected)
            }
            KeyProblem::Stale {
                row_id,
                stored,
                expected,
            } => println!("  {}: stored {:?}, expected {:?}", row_id, stored, expected),
            KeyProblem::NoIdentity { row_id } => {
                println!("  {}: neither furnitureItemId nor id is set", row_id)
            }
        }
    }

    if !audit.is_clean() {
        bail!("{} row(s) need attention", audit.problems.len());
    }
    println!("All grouping keys match");
    Ok(())
}
