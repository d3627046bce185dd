pub mod batch;
pub mod inventory_alert;
pub mod product;
pub mod reorder_policy;
pub mod stock;
pub mod stock_movement;
pub mod stock_movement_batch;
pub mod warehouse;
