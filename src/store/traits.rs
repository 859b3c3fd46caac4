use crate::model::{Id, InventoryRow};
use anyhow::Result;

/// Persistence seam for inventory rows.
///
/// Each call is atomic on its own. Multi-step mutations built on top of it
/// assume a single writer per stop.
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get_row(&self, row_id: &Id) -> Result<Option<InventoryRow>>;
    /// Rows of one stop, oldest first
    async fn list_rows_for_stop(&self, stop_id: &Id) -> Result<Vec<InventoryRow>>;
    /// Distinct stop ids that currently hold rows
    async fn list_stops(&self) -> Result<Vec<Id>>;
    async fn upsert_row(&self, row: InventoryRow) -> Result<()>;
    async fn delete_row(&self, row_id: &Id) -> Result<bool>;
}

pub trait Store: InventoryStore + Send + Sync {}
impl<T: InventoryStore> Store for T {}
