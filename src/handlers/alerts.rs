use axum::extract::{Json, Path, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    entities::inventory_alert::{self, AlertKind, AlertStatus},
    services::alerts::AlertFilters,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub reorder_policy_id: Option<Uuid>,
    pub alert_type: String,
    pub status: String,
    pub current_quantity: Decimal,
    pub triggered_by: String,
    pub message: String,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<inventory_alert::Model> for AlertDto {
    fn from(model: inventory_alert::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            reorder_policy_id: model.reorder_policy_id,
            alert_type: model.alert_type,
            status: model.status,
            current_quantity: model.current_quantity,
            triggered_by: model.triggered_by,
            message: model.message,
            acknowledged_by: model.acknowledged_by,
            acknowledged_at: model.acknowledged_at,
            resolved_by: model.resolved_by,
            resolved_at: model.resolved_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct AlertListQuery {
    pub alert_type: Option<AlertKind>,
    pub status: Option<AlertStatus>,
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

/// List alerts with optional kind/status/pair filtering, newest first
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    params(AlertListQuery),
    responses(
        (status = 200, description = "Alert list returned"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> ApiResult<PaginatedResponse<AlertDto>> {
    let filters = AlertFilters {
        alert_type: query.alert_type,
        status: query.status,
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
    };
    let (items, total) = state
        .services
        .alerts
        .list_alerts(filters, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items.into_iter().map(AlertDto::from).collect(),
        total,
        query.page,
        query.limit,
    ))))
}

/// Fetch one alert
#[utoipa::path(
    get,
    path = "/api/v1/alerts/{id}",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert returned", body = AlertDto),
        (status = 404, description = "Alert not found", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn get_alert(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<AlertDto> {
    let alert = state.services.alerts.get_alert(id).await?;
    Ok(Json(ApiResponse::success(AlertDto::from(alert))))
}

/// Acknowledge an OPEN alert
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/acknowledge",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert acknowledged", body = AlertDto),
        (status = 400, description = "Alert is not OPEN", body = crate::errors::ErrorResponse),
        (status = 404, description = "Alert not found", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> ApiResult<AlertDto> {
    let alert = state.services.alerts.acknowledge(id, &user.id).await?;
    Ok(Json(ApiResponse::success(AlertDto::from(alert))))
}

/// Resolve an OPEN or ACKNOWLEDGED alert
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/resolve",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert resolved", body = AlertDto),
        (status = 400, description = "Alert cannot be resolved", body = crate::errors::ErrorResponse),
        (status = 404, description = "Alert not found", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> ApiResult<AlertDto> {
    let alert = state.services.alerts.resolve(id, &user.id).await?;
    Ok(Json(ApiResponse::success(AlertDto::from(alert))))
}
