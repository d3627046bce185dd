use axum::extract::{Json, Path, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    entities::{batch::RetrievalMethod, reorder_policy},
    services::reorder_policies::{PolicyFilters, UpsertReorderPolicy},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ReorderPolicyDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub min_stock_level: Decimal,
    pub reorder_quantity: Decimal,
    pub lead_time_days: i32,
    pub safety_stock: Decimal,
    pub retrieval_method: String,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<reorder_policy::Model> for ReorderPolicyDto {
    fn from(model: reorder_policy::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            min_stock_level: model.min_stock_level,
            reorder_quantity: model.reorder_quantity,
            lead_time_days: model.lead_time_days,
            safety_stock: model.safety_stock,
            retrieval_method: model.retrieval_method,
            is_active: model.is_active,
            created_by: model.created_by,
            updated_by: model.updated_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertReorderPolicyRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub min_stock_level: Decimal,
    pub reorder_quantity: Decimal,
    #[serde(default)]
    pub lead_time_days: i32,
    #[serde(default)]
    pub safety_stock: Decimal,
    pub retrieval_method: RetrievalMethod,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PolicyListQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub is_active: Option<bool>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

/// List reorder policies
#[utoipa::path(
    get,
    path = "/api/v1/reorder-policies",
    params(PolicyListQuery),
    responses(
        (status = 200, description = "Policy list returned"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "reorder-policies"
)]
pub async fn list_policies(
    State(state): State<AppState>,
    Query(query): Query<PolicyListQuery>,
) -> ApiResult<PaginatedResponse<ReorderPolicyDto>> {
    let filters = PolicyFilters {
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
        is_active: query.is_active,
    };
    let (items, total) = state
        .services
        .reorder_policies
        .list_policies(filters, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items.into_iter().map(ReorderPolicyDto::from).collect(),
        total,
        query.page,
        query.limit,
    ))))
}

/// Fetch one reorder policy
#[utoipa::path(
    get,
    path = "/api/v1/reorder-policies/{id}",
    params(("id" = Uuid, Path, description = "Policy id")),
    responses(
        (status = 200, description = "Policy returned", body = ReorderPolicyDto),
        (status = 404, description = "Policy not found", body = crate::errors::ErrorResponse)
    ),
    tag = "reorder-policies"
)]
pub async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ReorderPolicyDto> {
    let policy = state.services.reorder_policies.get_policy(id).await?;
    Ok(Json(ApiResponse::success(ReorderPolicyDto::from(policy))))
}

/// Create or replace the policy for a (product, warehouse) pair
#[utoipa::path(
    put,
    path = "/api/v1/reorder-policies",
    request_body = UpsertReorderPolicyRequest,
    responses(
        (status = 200, description = "Policy upserted", body = ReorderPolicyDto),
        (status = 400, description = "Invalid thresholds", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "reorder-policies"
)]
pub async fn upsert_policy(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpsertReorderPolicyRequest>,
) -> ApiResult<ReorderPolicyDto> {
    let policy = state
        .services
        .reorder_policies
        .upsert_policy(
            UpsertReorderPolicy {
                product_id: payload.product_id,
                warehouse_id: payload.warehouse_id,
                min_stock_level: payload.min_stock_level,
                reorder_quantity: payload.reorder_quantity,
                lead_time_days: payload.lead_time_days,
                safety_stock: payload.safety_stock,
                retrieval_method: payload.retrieval_method,
                is_active: payload.is_active,
            },
            &user.id,
        )
        .await?;

    Ok(Json(ApiResponse::success(ReorderPolicyDto::from(policy))))
}

/// Deactivate a policy without deleting its history
#[utoipa::path(
    post,
    path = "/api/v1/reorder-policies/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Policy id")),
    responses(
        (status = 200, description = "Policy deactivated", body = ReorderPolicyDto),
        (status = 404, description = "Policy not found", body = crate::errors::ErrorResponse)
    ),
    tag = "reorder-policies"
)]
pub async fn deactivate_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> ApiResult<ReorderPolicyDto> {
    let policy = state
        .services
        .reorder_policies
        .deactivate_policy(id, &user.id)
        .await?;
    Ok(Json(ApiResponse::success(ReorderPolicyDto::from(policy))))
}
