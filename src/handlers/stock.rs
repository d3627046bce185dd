use axum::extract::{Json, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::stock::{self, StockStatus},
    errors::ServiceError,
    services::stock::StockFilters,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct StockDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity_on_hand: Decimal,
    pub status: String,
    pub last_updated: DateTime<Utc>,
}

impl From<stock::Model> for StockDto {
    fn from(model: stock::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            quantity_on_hand: model.quantity_on_hand,
            status: model.status,
            last_updated: model.last_updated,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct StockListQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub status: Option<StockStatus>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct StockLevelQuery {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
}

/// Current stock level for one (product, warehouse) pair. A missing
/// aggregate row reads as zero on hand.
#[utoipa::path(
    get,
    path = "/api/v1/stock/level",
    params(StockLevelQuery),
    responses(
        (status = 200, description = "Stock level returned", body = StockDto),
        (status = 404, description = "No stock on hand", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_stock_level(
    State(state): State<AppState>,
    Query(query): Query<StockLevelQuery>,
) -> ApiResult<StockDto> {
    let stock = state
        .services
        .stock
        .get_stock(query.product_id, query.warehouse_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No stock on hand for product {} in warehouse {}",
                query.product_id, query.warehouse_id
            ))
        })?;

    Ok(Json(ApiResponse::success(StockDto::from(stock))))
}

/// List stock aggregates with optional filtering
#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockListQuery),
    responses(
        (status = 200, description = "Stock list returned"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> ApiResult<PaginatedResponse<StockDto>> {
    let filters = StockFilters {
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
        status: query.status,
    };
    let (items, total) = state
        .services
        .stock
        .list_stock(filters, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items.into_iter().map(StockDto::from).collect(),
        total,
        query.page,
        query.limit,
    ))))
}
