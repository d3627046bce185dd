//! Stockledger API Library
//!
//! Batch-based stock accounting: an inventory ledger with policy-driven
//! movements, derived stock aggregates, reorder policies and alerting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{consts as perm, AuthRouterExt};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub(crate) fn default_page() -> u64 {
    1
}
pub(crate) fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API route composition with permission gating
pub fn api_v1_routes() -> Router<AppState> {
    let inventory_read = Router::new()
        .route("/batches", get(handlers::batches::list_batches))
        .route("/batches/{id}", get(handlers::batches::get_batch))
        .route("/stock", get(handlers::stock::list_stock))
        .route("/stock/level", get(handlers::stock::get_stock_level))
        .route("/movements", get(handlers::movements::list_movements))
        .route("/movements/{id}", get(handlers::movements::get_movement))
        .route("/alerts", get(handlers::alerts::list_alerts))
        .route("/alerts/{id}", get(handlers::alerts::get_alert))
        .route(
            "/reorder-policies",
            get(handlers::reorder_policies::list_policies),
        )
        .route(
            "/reorder-policies/{id}",
            get(handlers::reorder_policies::get_policy),
        )
        .with_permission(perm::INVENTORY_READ);

    let inventory_full = Router::new()
        .route(
            "/batches",
            axum::routing::post(handlers::batches::create_batch),
        )
        .route(
            "/batches/{id}",
            axum::routing::delete(handlers::batches::delete_batch),
        )
        .route(
            "/movements",
            axum::routing::post(handlers::movements::create_movement),
        )
        .route(
            "/movements/with-policy",
            axum::routing::post(handlers::movements::create_movement_with_policy),
        )
        .route(
            "/movements/{id}",
            axum::routing::delete(handlers::movements::delete_movement),
        )
        .route(
            "/alerts/{id}/acknowledge",
            axum::routing::post(handlers::alerts::acknowledge_alert),
        )
        .route(
            "/alerts/{id}/resolve",
            axum::routing::post(handlers::alerts::resolve_alert),
        )
        .route(
            "/reorder-policies",
            axum::routing::put(handlers::reorder_policies::upsert_policy),
        )
        .route(
            "/reorder-policies/{id}/deactivate",
            axum::routing::post(handlers::reorder_policies::deactivate_policy),
        )
        .with_permission(perm::INVENTORY_FULL);

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Inventory API (auth + permissions)
        .merge(inventory_read)
        .merge(inventory_full)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "stockledger-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match db::health_check(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn paginated_response_computes_total_pages() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);

        let exact = PaginatedResponse::new(vec![1], 40, 2, 20);
        assert_eq!(exact.total_pages, 2);
    }

    #[test]
    fn zero_limit_is_clamped() {
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 10, 1, 0);
        assert_eq!(page.limit, 1);
        assert_eq!(page.total_pages, 10);
    }
}
