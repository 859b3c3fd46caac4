use serde::Serialize;

use crate::logic::grouping::GroupingKeyComputer;
use crate::model::{Id, InventoryRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum KeyProblem {
    /// Row was stored without a grouping key
    Missing { row_id: Id, expected: String },
    /// Persisted key differs from the one computed now
    Stale {
        row_id: Id,
        stored: String,
        expected: String,
    },
    /// Row has neither `furnitureItemId` nor `id`
    NoIdentity { row_id: Id },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAudit {
    pub rows_checked: usize,
    pub problems: Vec<KeyProblem>,
}

impl KeyAudit {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Compare each row's persisted grouping key with a freshly computed one
pub fn audit_grouping_keys<'a>(rows: impl IntoIterator<Item = &'a InventoryRow>) -> KeyAudit {
    let mut audit = KeyAudit::default();
    for row in rows {
        audit.rows_checked += 1;
        let expected = match GroupingKeyComputer::compute(&row.item) {
            Ok(key) => key,
            Err(_) => {
                audit.problems.push(KeyProblem::NoIdentity {
                    row_id: row.row_id.clone(),
                });
                continue;
            }
        };
        match &row.grouping_key {
            None => audit.problems.push(KeyProblem::Missing {
                row_id: row.row_id.clone(),
                expected,
            }),
            Some(stored) if *stored != expected => audit.problems.push(KeyProblem::Stale {
                row_id: row.row_id.clone(),
                stored: stored.clone(),
                expected,
            }),
            Some(_) => {}
        }
    }
    audit
}
