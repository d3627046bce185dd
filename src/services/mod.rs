pub mod alerts;
pub mod batches;
pub mod catalog;
pub mod movements;
pub mod reorder_policies;
pub mod stock;
