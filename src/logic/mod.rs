pub mod audit;
pub mod consolidate;
pub mod grouping;
pub mod inventory_ops;

pub use audit::*;
pub use consolidate::*;
pub use grouping::*;
pub use inventory_ops::*;
