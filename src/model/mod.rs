pub mod common;
pub mod inventory;
pub mod user_context;

pub use common::*;
pub use inventory::*;
pub use user_context::*;
