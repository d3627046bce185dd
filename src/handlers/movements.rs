use axum::extract::{Json, Path, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::stock_movement::{self, MovementKind},
    services::movements::{
        AllocationInput, MovementFilters, MovementRecord, NewMovement, PolicyMovementRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AllocationDto {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementDto {
    pub id: Uuid,
    pub movement_type: String,
    pub total_quantity: Decimal,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub allocations: Vec<AllocationDto>,
}

impl From<MovementRecord> for MovementDto {
    fn from(record: MovementRecord) -> Self {
        Self {
            id: record.movement.id,
            movement_type: record.movement.movement_type,
            total_quantity: record.movement.total_quantity,
            reference_number: record.movement.reference_number,
            notes: record.movement.notes,
            created_at: record.movement.created_at,
            allocations: record
                .allocations
                .into_iter()
                .map(|a| AllocationDto {
                    id: a.id,
                    batch_id: a.batch_id,
                    quantity: a.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementSummaryDto {
    pub id: Uuid,
    pub movement_type: String,
    pub total_quantity: Decimal,
    pub reference_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<stock_movement::Model> for MovementSummaryDto {
    fn from(model: stock_movement::Model) -> Self {
        Self {
            id: model.id,
            movement_type: model.movement_type,
            total_quantity: model.total_quantity,
            reference_number: model.reference_number,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AllocationRequest {
    pub batch_id: Uuid,
    /// Signed for ADJUSTMENT movements, positive otherwise
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMovementRequest {
    pub movement_type: MovementKind,
    pub allocations: Vec<AllocationRequest>,
    /// Must equal the allocation sum when supplied
    pub total_quantity: Option<Decimal>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePolicyMovementRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub movement_type: MovementKind,
    pub quantity: Decimal,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MovementListQuery {
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<MovementKind>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

/// List movements, newest first
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(MovementListQuery),
    responses(
        (status = 200, description = "Movement list returned"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementListQuery>,
) -> ApiResult<PaginatedResponse<MovementSummaryDto>> {
    let filters = MovementFilters {
        warehouse_id: query.warehouse_id,
        movement_type: query.movement_type,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let (items, total) = state
        .services
        .movements
        .list_movements(filters, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items.into_iter().map(MovementSummaryDto::from).collect(),
        total,
        query.page,
        query.limit,
    ))))
}

/// Fetch one movement with its allocations
#[utoipa::path(
    get,
    path = "/api/v1/movements/{id}",
    params(("id" = Uuid, Path, description = "Movement id")),
    responses(
        (status = 200, description = "Movement returned", body = MovementDto),
        (status = 404, description = "Movement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MovementDto> {
    let record = state.services.movements.get_movement(id).await?;
    Ok(Json(ApiResponse::success(MovementDto::from(record))))
}

/// Record a movement with caller-supplied batch allocations
#[utoipa::path(
    post,
    path = "/api/v1/movements",
    request_body = CreateMovementRequest,
    responses(
        (status = 200, description = "Movement recorded", body = MovementDto),
        (status = 400, description = "Invalid allocations", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient batch quantity", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn create_movement(
    State(state): State<AppState>,
    Json(payload): Json<CreateMovementRequest>,
) -> ApiResult<MovementDto> {
    let record = state
        .services
        .movements
        .record_movement(NewMovement {
            movement_type: payload.movement_type,
            allocations: payload
                .allocations
                .into_iter()
                .map(|a| AllocationInput {
                    batch_id: a.batch_id,
                    quantity: a.quantity,
                })
                .collect(),
            total_quantity: payload.total_quantity,
            reference_number: payload.reference_number,
            notes: payload.notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(MovementDto::from(record))))
}

/// Record a movement distributed across batches per the retrieval policy
/// (FIFO when no active policy exists)
#[utoipa::path(
    post,
    path = "/api/v1/movements/with-policy",
    request_body = CreatePolicyMovementRequest,
    responses(
        (status = 200, description = "Movement recorded", body = MovementDto),
        (status = 404, description = "Product or warehouse not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn create_movement_with_policy(
    State(state): State<AppState>,
    Json(payload): Json<CreatePolicyMovementRequest>,
) -> ApiResult<MovementDto> {
    let record = state
        .services
        .movements
        .record_movement_with_policy(PolicyMovementRequest {
            product_id: payload.product_id,
            warehouse_id: payload.warehouse_id,
            movement_type: payload.movement_type,
            quantity: payload.quantity,
            reference_number: payload.reference_number,
            notes: payload.notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(MovementDto::from(record))))
}

/// Delete a movement, reversing its effect on every batch
#[utoipa::path(
    delete,
    path = "/api/v1/movements/{id}",
    params(("id" = Uuid, Path, description = "Movement id")),
    responses(
        (status = 200, description = "Movement deleted and reversed"),
        (status = 404, description = "Movement not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Reversal would drive a batch negative", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn delete_movement(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.movements.delete_movement(id).await?;
    Ok(Json(ApiResponse::success(())))
}
