pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

pub use error::{IdentityError, InventoryError, InventoryResult};

// Export logic types
pub use logic::{
    apply_storage_migration, audit_grouping_keys, compute_grouping_key, consolidate_rows,
    group_by_room, rolling_hash32, Consolidation, ConsolidationReport, GroupingKeyComputer, InventoryOperations,
    KeyAudit, KeyProblem, MutationOutcome, RoomGroups, StorageMigration, UpdateOutcome,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{InventoryStore, MemoryStore, Store};

/// Initialise `env_logger` from `RUST_LOG`, falling back to `default_level`
pub fn init_logging(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env).try_init();
}
