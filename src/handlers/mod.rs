pub mod alerts;
pub mod batches;
pub mod movements;
pub mod reorder_policies;
pub mod stock;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub batches: Arc<services::batches::BatchService>,
    pub stock: Arc<services::stock::StockService>,
    pub movements: Arc<services::movements::MovementService>,
    pub reorder_policies: Arc<services::reorder_policies::ReorderPolicyService>,
    pub alerts: Arc<services::alerts::AlertService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            batches: Arc::new(services::batches::BatchService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            stock: Arc::new(services::stock::StockService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            movements: Arc::new(services::movements::MovementService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            reorder_policies: Arc::new(services::reorder_policies::ReorderPolicyService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            alerts: Arc::new(services::alerts::AlertService::new(db_pool, event_sender)),
        }
    }
}
