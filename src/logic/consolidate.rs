//! Collection-level regrouping: collapsing rows with equal grouping keys and
//! the company-storage migration built on top of it.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::IdentityError;
use crate::logic::grouping::GroupingKeyComputer;
use crate::model::{Id, InventoryRow, RecordId, UserContext};

/// Rows keyed by room; unassigned rows sort first
pub type RoomGroups = BTreeMap<Option<RecordId>, Vec<InventoryRow>>;

/// Result of collapsing a batch of rows
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    /// Surviving rows in first-seen order, with summed counts and fresh keys
    pub rows: Vec<InventoryRow>,
    /// Rows folded into a survivor; the store must delete them
    pub merged_row_ids: Vec<Id>,
    /// Survivors whose count or persisted key changed; the store must rewrite them
    pub changed_row_ids: BTreeSet<Id>,
}

impl Consolidation {
    pub fn changed_rows(&self) -> impl Iterator<Item = &InventoryRow> {
        self.rows
            .iter()
            .filter(|row| self.changed_row_ids.contains(&row.row_id))
    }
}

/// Collapse rows of the same stop whose freshly computed keys are equal.
///
/// Persisted `groupingKey` values are ignored for comparison and rewritten
/// when stale. The first row seen for a key survives and absorbs the counts
/// of later ones.
pub fn consolidate_rows(
    rows: Vec<InventoryRow>,
    user: &UserContext,
) -> Result<Consolidation, IdentityError> {
    let mut survivors: Vec<InventoryRow> = Vec::with_capacity(rows.len());
    let mut index_by_key: HashMap<(Id, String), usize> = HashMap::new();
    let mut merged_row_ids = Vec::new();
    let mut changed_row_ids = BTreeSet::new();

    for mut row in rows {
        let key = GroupingKeyComputer::compute(&row.item)?;
        match index_by_key.entry((row.stop_id.clone(), key.clone())) {
            Entry::Occupied(entry) => {
                let survivor = &mut survivors[*entry.get()];
                survivor.item.count = survivor.item.count.saturating_add(row.count());
                survivor.touch(user);
                changed_row_ids.insert(survivor.row_id.clone());
                merged_row_ids.push(row.row_id);
            }
            Entry::Vacant(entry) => {
                if row.grouping_key.as_deref() != Some(key.as_str()) {
                    row.grouping_key = Some(key);
                    row.touch(user);
                    changed_row_ids.insert(row.row_id.clone());
                }
                entry.insert(survivors.len());
                survivors.push(row);
            }
        }
    }

    Ok(Consolidation {
        rows: survivors,
        merged_row_ids,
        changed_row_ids,
    })
}

/// Bucket rows by the room they are assigned to, preserving row order
pub fn group_by_room(rows: impl IntoIterator<Item = InventoryRow>) -> RoomGroups {
    let mut groups = RoomGroups::new();
    for row in rows {
        groups.entry(row.item.room_id.clone()).or_default().push(row);
    }
    groups
}

/// Outcome of moving items into company storage
#[derive(Debug, Clone, PartialEq)]
pub struct StorageMigration {
    pub consolidation: Consolidation,
    /// Rows that gained the storage tag
    pub tagged_row_ids: BTreeSet<Id>,
}

impl StorageMigration {
    pub fn rooms(&self) -> RoomGroups {
        group_by_room(self.consolidation.rows.iter().cloned())
    }
}

/// Tag the selected rows with `storage_tag`, recompute every key and collapse
/// rows that became equivalent.
///
/// `selected` of `None` tags every row. Rows that already carry the tag are
/// left as they are.
pub fn apply_storage_migration(
    rows: Vec<InventoryRow>,
    selected: Option<&BTreeSet<Id>>,
    storage_tag: &str,
    user: &UserContext,
) -> Result<StorageMigration, IdentityError> {
    let mut tagged_row_ids = BTreeSet::new();
    let rows = rows
        .into_iter()
        .map(|mut row| {
            let wanted = selected.map_or(true, |ids| ids.contains(&row.row_id));
            if wanted && row.item.add_tag(storage_tag) {
                row.touch(user);
                tagged_row_ids.insert(row.row_id.clone());
            }
            row
        })
        .collect();

    // Tagging changes the key, so every tagged survivor is reported as changed
    let consolidation = consolidate_rows(rows, user)?;

    Ok(StorageMigration {
        consolidation,
        tagged_row_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::grouping::compute_grouping_key;
    use crate::model::InventoryItemInstance;

    fn row(stop: &str, furniture_item_id: i64, room: Option<i64>, tags: &[&str]) -> InventoryRow {
        let mut item = InventoryItemInstance::for_furniture(furniture_item_id);
        item.room_id = room.map(RecordId::Int);
        item.tags = tags.iter().map(|t| t.to_string()).collect();
        let key = compute_grouping_key(&item).unwrap();
        InventoryRow::new(stop.to_string(), item, key, &UserContext::system())
    }

    #[test]
    fn test_consolidate_sums_equivalent_rows() {
        let a = row("s1", 7, Some(2), &["fragile", "bulky"]);
        let b = row("s1", 7, Some(2), &["bulky", "fragile"]);
        let c = row("s1", 7, Some(3), &["bulky", "fragile"]);
        let a_id = a.row_id.clone();
        let b_id = b.row_id.clone();

        let result = consolidate_rows(vec![a, b, c], &UserContext::system()).unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].row_id, a_id);
        assert_eq!(result.rows[0].count(), 2);
        assert_eq!(result.rows[1].count(), 1);
        assert_eq!(result.merged_row_ids, vec![b_id]);
        assert!(result.changed_row_ids.contains(&a_id));
        assert_eq!(result.changed_rows().count(), 1);
    }

    #[test]
    fn test_consolidate_never_merges_across_stops() {
        let origin = row("origin", 7, Some(2), &[]);
        let destination = row("destination", 7, Some(2), &[]);

        let result = consolidate_rows(vec![origin, destination], &UserContext::system()).unwrap();

        assert_eq!(result.rows.len(), 2);
        assert!(result.merged_row_ids.is_empty());
    }

    #[test]
    fn test_consolidate_refreshes_stale_keys() {
        let mut stale = row("s1", 7, Some(2), &["fragile"]);
        stale.grouping_key = Some("7|2|||||||0_0".to_string());
        let stale_id = stale.row_id.clone();

        let result = consolidate_rows(vec![stale], &UserContext::system()).unwrap();

        assert_eq!(
            result.rows[0].grouping_key.as_deref(),
            Some("7|2|fragile||||||0_0")
        );
        assert!(result.changed_row_ids.contains(&stale_id));
    }

    #[test]
    fn test_consolidate_rejects_rows_without_identity() {
        let mut broken = row("s1", 7, None, &[]);
        broken.item.furniture_item_id = None;

        let result = consolidate_rows(vec![broken], &UserContext::system());
        assert_eq!(result, Err(IdentityError));
    }

    #[test]
    fn test_storage_migration_tags_merges_and_groups_by_room() {
        // One row already in storage, one identical row not yet tagged
        let stored = row("s1", 7, Some(2), &["storage"]);
        let pending = row("s1", 7, Some(2), &[]);
        let other_room = row("s1", 9, Some(4), &[]);
        let unassigned = row("s1", 11, None, &[]);
        let stored_id = stored.row_id.clone();
        let pending_id = pending.row_id.clone();

        let migration = apply_storage_migration(
            vec![stored, pending, other_room, unassigned],
            None,
            "storage",
            &UserContext::system(),
        )
        .unwrap();

        assert_eq!(migration.consolidation.merged_row_ids, vec![pending_id.clone()]);
        assert!(migration.tagged_row_ids.contains(&pending_id));
        assert!(!migration.tagged_row_ids.contains(&stored_id));

        let rooms = migration.rooms();
        let keys: Vec<_> = rooms.keys().cloned().collect();
        assert_eq!(keys, vec![None, Some(RecordId::Int(2)), Some(RecordId::Int(4))]);
        assert_eq!(rooms[&Some(RecordId::Int(2))][0].count(), 2);
        assert!(rooms
            .values()
            .flatten()
            .all(|row| row.item.has_tag("storage")));
    }

    #[test]
    fn test_storage_migration_only_touches_selected_rows() {
        let chosen = row("s1", 7, Some(2), &[]);
        let left_alone = row("s1", 8, Some(2), &[]);
        let chosen_id = chosen.row_id.clone();
        let selected: BTreeSet<Id> = [chosen_id.clone()].into_iter().collect();

        let migration = apply_storage_migration(
            vec![chosen, left_alone],
            Some(&selected),
            "storage",
            &UserContext::system(),
        )
        .unwrap();

        let rows = &migration.consolidation.rows;
        assert!(rows[0].item.has_tag("storage"));
        assert!(!rows[1].item.has_tag("storage"));
        assert_eq!(migration.tagged_row_ids, selected);
        assert!(migration.consolidation.changed_row_ids.contains(&chosen_id));
    }
}
