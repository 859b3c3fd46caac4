use anyhow::Result;
use itertools::Itertools;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::model::{Id, InventoryRow};
use crate::store::traits::InventoryStore;

/// In-memory inventory store used by tests and the offline tools
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<Id, InventoryRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load rows, replacing any with the same row id
    pub fn load_rows(&self, rows: impl IntoIterator<Item = InventoryRow>) {
        let mut guard = self.rows.write();
        for row in rows {
            guard.insert(row.row_id.clone(), row);
        }
    }

    /// Every row, ordered by stop then creation time
    pub fn all_rows(&self) -> Vec<InventoryRow> {
        self.rows
            .read()
            .values()
            .cloned()
            .sorted_by(|a, b| {
                a.stop_id
                    .cmp(&b.stop_id)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.row_id.cmp(&b.row_id))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait::async_trait]
impl InventoryStore for MemoryStore {
    async fn get_row(&self, row_id: &Id) -> Result<Option<InventoryRow>> {
        Ok(self.rows.read().get(row_id).cloned())
    }

    async fn list_rows_for_stop(&self, stop_id: &Id) -> Result<Vec<InventoryRow>> {
        let rows = self
            .rows
            .read()
            .values()
            .filter(|row| &row.stop_id == stop_id)
            .cloned()
            .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then(a.row_id.cmp(&b.row_id)))
            .collect();
        Ok(rows)
    }

    async fn list_stops(&self) -> Result<Vec<Id>> {
        let stops = self
            .rows
            .read()
            .values()
            .map(|row| row.stop_id.clone())
            .unique()
            .sorted()
            .collect();
        Ok(stops)
    }

    async fn upsert_row(&self, row: InventoryRow) -> Result<()> {
        self.rows.write().insert(row.row_id.clone(), row);
        Ok(())
    }

    async fn delete_row(&self, row_id: &Id) -> Result<bool> {
        Ok(self.rows.write().remove(row_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventoryItemInstance, UserContext};

    fn row(stop_id: &str, furniture_item_id: i64) -> InventoryRow {
        InventoryRow::new(
            stop_id.to_string(),
            InventoryItemInstance::for_furniture(furniture_item_id),
            format!("{}|", furniture_item_id),
            &UserContext::system(),
        )
    }

    #[tokio::test]
    async fn test_upsert_get_delete() {
        let store = MemoryStore::new();
        let row = row("stop-1", 7);
        let row_id = row.row_id.clone();

        store.upsert_row(row.clone()).await.unwrap();
        assert_eq!(store.get_row(&row_id).await.unwrap(), Some(row));

        assert!(store.delete_row(&row_id).await.unwrap());
        assert!(!store.delete_row(&row_id).await.unwrap());
        assert_eq!(store.get_row(&row_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rows_are_scoped_by_stop() {
        let store = MemoryStore::new();
        store.load_rows(vec![row("origin", 1), row("origin", 2), row("destination", 1)]);

        assert_eq!(store.list_rows_for_stop(&"origin".to_string()).await.unwrap().len(), 2);
        assert_eq!(store.list_rows_for_stop(&"destination".to_string()).await.unwrap().len(), 1);
        assert_eq!(
            store.list_stops().await.unwrap(),
            vec!["destination".to_string(), "origin".to_string()]
        );
        assert_eq!(store.len(), 3);
    }
}
