use axum::extract::{Json, Path, Query, State};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::batch,
    services::batches::{BatchFilters, NewBatch},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub batch_number: String,
    pub quantity: Decimal,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<batch::Model> for BatchDto {
    fn from(model: batch::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            batch_number: model.batch_number,
            quantity: model.quantity,
            manufacture_date: model.manufacture_date,
            expiry_date: model.expiry_date,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBatchRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    /// Generated when omitted
    pub batch_number: Option<String>,
    pub quantity: Decimal,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct BatchListQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

/// List batches with optional product/warehouse filtering
#[utoipa::path(
    get,
    path = "/api/v1/batches",
    params(BatchListQuery),
    responses(
        (status = 200, description = "Batch list returned"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<BatchListQuery>,
) -> ApiResult<PaginatedResponse<BatchDto>> {
    let filters = BatchFilters {
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
    };
    let (items, total) = state
        .services
        .batches
        .list_batches(filters, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items.into_iter().map(BatchDto::from).collect(),
        total,
        query.page,
        query.limit,
    ))))
}

/// Fetch one batch
#[utoipa::path(
    get,
    path = "/api/v1/batches/{id}",
    params(("id" = Uuid, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch returned", body = BatchDto),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn get_batch(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<BatchDto> {
    let batch = state.services.batches.get_batch(id).await?;
    Ok(Json(ApiResponse::success(BatchDto::from(batch))))
}

/// Register a received batch
#[utoipa::path(
    post,
    path = "/api/v1/batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 200, description = "Batch created", body = BatchDto),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate batch number", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBatchRequest>,
) -> ApiResult<BatchDto> {
    let created = state
        .services
        .batches
        .receive_batch(NewBatch {
            product_id: payload.product_id,
            warehouse_id: payload.warehouse_id,
            batch_number: payload.batch_number,
            quantity: payload.quantity,
            manufacture_date: payload.manufacture_date,
            expiry_date: payload.expiry_date,
        })
        .await?;

    Ok(Json(ApiResponse::success(BatchDto::from(created))))
}

/// Delete a batch; the pair's aggregate is recomputed
#[utoipa::path(
    delete,
    path = "/api/v1/batches/{id}",
    params(("id" = Uuid, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch deleted"),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn delete_batch(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.batches.delete_batch(id).await?;
    Ok(Json(ApiResponse::success(())))
}
