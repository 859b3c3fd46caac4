use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{InventoryError, InventoryResult};
use crate::logic::consolidate::{
    apply_storage_migration, consolidate_rows, group_by_room, RoomGroups, StorageMigration,
};
use crate::logic::grouping::GroupingKeyComputer;
use crate::model::{Id, InstanceUpdate, InventoryItemInstance, InventoryRow, RecordId, UserContext};
use crate::store::traits::InventoryStore;

/// What a single mutation did to one stored row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Created { row: InventoryRow },
    Incremented { row: InventoryRow, added: u32 },
    Updated { row: InventoryRow },
    Merged { source_row_id: Id, into: InventoryRow },
    Decremented { row: InventoryRow, removed: u32 },
    Deleted { row_id: Id },
}

impl MutationOutcome {
    /// The row that remains after the mutation, if any
    pub fn row(&self) -> Option<&InventoryRow> {
        match self {
            MutationOutcome::Created { row }
            | MutationOutcome::Incremented { row, .. }
            | MutationOutcome::Updated { row }
            | MutationOutcome::Decremented { row, .. } => Some(row),
            MutationOutcome::Merged { into, .. } => Some(into),
            MutationOutcome::Deleted { .. } => None,
        }
    }
}

/// Result of editing a row.
///
/// Editing only some units of a row splits it: `source` is the decremented
/// original and `target` is where the edited units landed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub source: MutationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<MutationOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationReport {
    pub stop_id: Id,
    pub rows_before: usize,
    pub rows_after: usize,
    pub merged_row_ids: Vec<Id>,
    pub rewritten_row_ids: Vec<Id>,
}

/// Find a row in `rows` that the key `key` should fold into.
///
/// Candidate keys are recomputed rather than read from the persisted
/// column. Candidates without a base id can never match and are skipped.
fn find_sibling<'a>(
    rows: &'a [InventoryRow],
    key: &str,
    exclude: Option<&Id>,
) -> Option<&'a InventoryRow> {
    rows.iter()
        .filter(|row| Some(&row.row_id) != exclude)
        .find(|row| match GroupingKeyComputer::compute(&row.item) {
            Ok(candidate) => candidate == key,
            Err(e) => {
                log::warn!("Skipping row {} as merge candidate: {}", row.row_id, e);
                false
            }
        })
}

fn check_quantity(requested: Option<u32>, row: &InventoryRow) -> InventoryResult<u32> {
    let available = row.count();
    let requested = requested.unwrap_or(available);
    if requested == 0 || requested > available {
        return Err(InventoryError::InvalidQuantity {
            requested,
            available,
        });
    }
    Ok(requested)
}

/// Inventory mutations that keep rows collapsed by grouping key.
///
/// Every operation computes the new key before writing anything, so an
/// identity failure leaves the store untouched.
pub struct InventoryOperations;

impl InventoryOperations {
    async fn load_row<S: InventoryStore>(store: &S, row_id: &Id) -> InventoryResult<InventoryRow> {
        store
            .get_row(row_id)
            .await?
            .ok_or_else(|| InventoryError::RowNotFound(row_id.clone()))
    }

    /// Add `item.count` units of an item to a stop, folding into an equivalent row when one exists
    pub async fn add_item<S: InventoryStore>(
        store: &S,
        stop_id: &Id,
        item: InventoryItemInstance,
        user: &UserContext,
    ) -> InventoryResult<MutationOutcome> {
        if item.count == 0 {
            return Err(InventoryError::ZeroCount);
        }
        let key = GroupingKeyComputer::compute(&item)?;
        let siblings = store.list_rows_for_stop(stop_id).await?;

        if let Some(sibling) = find_sibling(&siblings, &key, None) {
            let mut row = sibling.clone();
            row.item.count = row.item.count.saturating_add(item.count);
            row.grouping_key = Some(key);
            row.touch(user);
            store.upsert_row(row.clone()).await?;
            log::info!(
                "Added {} unit(s) to existing row {} in stop {}",
                item.count,
                row.row_id,
                stop_id
            );
            return Ok(MutationOutcome::Incremented {
                row,
                added: item.count,
            });
        }

        let row = InventoryRow::new(stop_id.clone(), item, key, user);
        store.upsert_row(row.clone()).await?;
        log::info!("Created row {} in stop {}", row.row_id, stop_id);
        Ok(MutationOutcome::Created { row })
    }

    /// Apply `update` to `quantity` units of a row (all units when `None`)
    pub async fn update_item<S: InventoryStore>(
        store: &S,
        row_id: &Id,
        update: &InstanceUpdate,
        quantity: Option<u32>,
        user: &UserContext,
    ) -> InventoryResult<UpdateOutcome> {
        let mut row = Self::load_row(store, row_id).await?;
        let quantity = check_quantity(quantity, &row)?;

        let mut edited = row.item.clone();
        edited.apply(update);
        let new_key = GroupingKeyComputer::compute(&edited)?;
        let old_key = GroupingKeyComputer::compute(&row.item)?;

        // Units are interchangeable unless the edit changes the key, so a
        // partial edit that keeps the key applies to the whole row
        if quantity == row.count() || new_key == old_key {
            let siblings = store.list_rows_for_stop(&row.stop_id).await?;
            if let Some(sibling) = find_sibling(&siblings, &new_key, Some(row_id)) {
                let mut into = sibling.clone();
                into.item.count = into.item.count.saturating_add(row.count());
                into.grouping_key = Some(new_key);
                into.touch(user);
                store.upsert_row(into.clone()).await?;
                store.delete_row(row_id).await?;
                log::info!("Row {} now matches row {}; merged", row_id, into.row_id);
                return Ok(UpdateOutcome {
                    source: MutationOutcome::Merged {
                        source_row_id: row_id.clone(),
                        into,
                    },
                    target: None,
                });
            }

            row.item = edited;
            row.grouping_key = Some(new_key);
            row.touch(user);
            store.upsert_row(row.clone()).await?;
            log::debug!("Updated row {}", row_id);
            return Ok(UpdateOutcome {
                source: MutationOutcome::Updated { row },
                target: None,
            });
        }

        row.item.count -= quantity;
        row.grouping_key = Some(old_key);
        row.touch(user);
        store.upsert_row(row.clone()).await?;
        log::info!("Split {} unit(s) off row {} for edit", quantity, row_id);

        edited.count = quantity;
        let target = Self::add_item(store, &row.stop_id, edited, user).await?;
        Ok(UpdateOutcome {
            source: MutationOutcome::Decremented {
                row,
                removed: quantity,
            },
            target: Some(target),
        })
    }

    /// Replace the tag set of `quantity` units of a row
    pub async fn update_tags<S: InventoryStore>(
        store: &S,
        row_id: &Id,
        tags: Vec<String>,
        quantity: Option<u32>,
        user: &UserContext,
    ) -> InventoryResult<UpdateOutcome> {
        Self::update_item(store, row_id, &InstanceUpdate::tags(tags), quantity, user).await
    }

    /// Reassign `quantity` units of a row to another room (`None` unassigns)
    pub async fn move_to_room<S: InventoryStore>(
        store: &S,
        row_id: &Id,
        room_id: Option<RecordId>,
        quantity: Option<u32>,
        user: &UserContext,
    ) -> InventoryResult<UpdateOutcome> {
        Self::update_item(store, row_id, &InstanceUpdate::room(room_id), quantity, user).await
    }

    /// Remove `quantity` units (all when `None`); the row is deleted when none remain
    pub async fn remove_item<S: InventoryStore>(
        store: &S,
        row_id: &Id,
        quantity: Option<u32>,
        user: &UserContext,
    ) -> InventoryResult<MutationOutcome> {
        let mut row = Self::load_row(store, row_id).await?;
        let quantity = check_quantity(quantity, &row)?;

        if quantity == row.count() {
            store.delete_row(row_id).await?;
            log::info!("Deleted row {}", row_id);
            return Ok(MutationOutcome::Deleted {
                row_id: row_id.clone(),
            });
        }

        row.item.count -= quantity;
        row.touch(user);
        store.upsert_row(row.clone()).await?;
        log::info!("Removed {} unit(s) from row {}", quantity, row_id);
        Ok(MutationOutcome::Decremented {
            row,
            removed: quantity,
        })
    }

    /// User-initiated merge of `source` into `target`
    pub async fn merge_items<S: InventoryStore>(
        store: &S,
        source_id: &Id,
        target_id: &Id,
        user: &UserContext,
    ) -> InventoryResult<MutationOutcome> {
        let not_mergeable = |reason: &str| InventoryError::NotMergeable {
            source_id: source_id.clone(),
            target_id: target_id.clone(),
            reason: reason.to_string(),
        };

        if source_id == target_id {
            return Err(not_mergeable("a row cannot be merged with itself"));
        }
        let source = Self::load_row(store, source_id).await?;
        let mut target = Self::load_row(store, target_id).await?;

        if source.stop_id != target.stop_id {
            return Err(not_mergeable("rows belong to different stops"));
        }
        let key = GroupingKeyComputer::compute(&target.item)?;
        if GroupingKeyComputer::compute(&source.item)? != key {
            return Err(not_mergeable("grouping keys differ"));
        }

        target.item.count = target.item.count.saturating_add(source.count());
        target.grouping_key = Some(key);
        target.touch(user);
        store.upsert_row(target.clone()).await?;
        store.delete_row(source_id).await?;
        log::info!("Merged row {} into {}", source_id, target_id);

        Ok(MutationOutcome::Merged {
            source_row_id: source_id.clone(),
            into: target,
        })
    }

    /// Collapse every group of equivalent rows in a stop and refresh stale keys
    pub async fn consolidate_stop<S: InventoryStore>(
        store: &S,
        stop_id: &Id,
        user: &UserContext,
    ) -> InventoryResult<ConsolidationReport> {
        let rows = store.list_rows_for_stop(stop_id).await?;
        let rows_before = rows.len();
        let consolidation = consolidate_rows(rows, user)?;

        for row in consolidation.changed_rows() {
            store.upsert_row(row.clone()).await?;
        }
        for row_id in &consolidation.merged_row_ids {
            store.delete_row(row_id).await?;
        }

        let report = ConsolidationReport {
            stop_id: stop_id.clone(),
            rows_before,
            rows_after: consolidation.rows.len(),
            merged_row_ids: consolidation.merged_row_ids.clone(),
            rewritten_row_ids: consolidation.changed_row_ids.iter().cloned().collect(),
        };
        log::info!(
            "Consolidated stop {}: {} -> {} rows, {} rewritten",
            stop_id,
            report.rows_before,
            report.rows_after,
            report.rewritten_row_ids.len()
        );
        Ok(report)
    }

    /// Move rows of a stop into company storage by tagging them with `storage_tag`.
    ///
    /// `row_ids` of `None` moves the whole stop.
    pub async fn migrate_to_storage<S: InventoryStore>(
        store: &S,
        stop_id: &Id,
        row_ids: Option<&[Id]>,
        storage_tag: &str,
        user: &UserContext,
    ) -> InventoryResult<StorageMigration> {
        let rows = store.list_rows_for_stop(stop_id).await?;

        let selected: Option<BTreeSet<Id>> = row_ids.map(|ids| ids.iter().cloned().collect());
        if let Some(selected) = &selected {
            if let Some(missing) = selected
                .iter()
                .find(|id| !rows.iter().any(|row| &row.row_id == *id))
            {
                return Err(InventoryError::RowNotFound(missing.clone()));
            }
        }

        let migration = apply_storage_migration(rows, selected.as_ref(), storage_tag, user)?;
        for row in migration.consolidation.changed_rows() {
            store.upsert_row(row.clone()).await?;
        }
        for row_id in &migration.consolidation.merged_row_ids {
            store.delete_row(row_id).await?;
        }

        log::info!(
            "Moved {} row(s) of stop {} into storage ('{}'), {} merged",
            migration.tagged_row_ids.len(),
            stop_id,
            storage_tag,
            migration.consolidation.merged_row_ids.len()
        );
        Ok(migration)
    }

    pub async fn list_items<S: InventoryStore>(
        store: &S,
        stop_id: &Id,
    ) -> InventoryResult<Vec<InventoryRow>> {
        Ok(store.list_rows_for_stop(stop_id).await?)
    }

    pub async fn items_by_room<S: InventoryStore>(
        store: &S,
        stop_id: &Id,
    ) -> InventoryResult<RoomGroups> {
        Ok(group_by_room(store.list_rows_for_stop(stop_id).await?))
    }
}
