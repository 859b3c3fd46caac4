use thiserror::Error;

use crate::model::Id;

/// Raised when an inventory item instance carries neither `furnitureItemId` nor `id`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("inventory item has no furnitureItemId or id")]
pub struct IdentityError;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Inventory row not found: {0}")]
    RowNotFound(Id),

    #[error("Item count must be at least 1")]
    ZeroCount,

    #[error("Invalid quantity {requested}: row holds {available}")]
    InvalidQuantity { requested: u32, available: u32 },

    #[error("Rows {source_id} and {target_id} cannot be merged: {reason}")]
    NotMergeable {
        source_id: Id,
        target_id: Id,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type InventoryResult<T> = std::result::Result<T, InventoryError>;
