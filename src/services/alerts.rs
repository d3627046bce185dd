//! Alert engine: opens, auto-resolves and transitions inventory alerts.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        batch::{self, Entity as BatchEntity},
        inventory_alert::{
            self, AlertKind, AlertStatus, Entity as InventoryAlertEntity, TriggerSource,
        },
        stock::{self, Entity as StockEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog, reorder_policies},
};

/// Batches expiring within this many days (inclusive) raise EXPIRY alerts.
pub const EXPIRY_WINDOW_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AlertService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilters {
    pub alert_type: Option<AlertKind>,
    pub status: Option<AlertStatus>,
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
}

impl AlertService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_alert(&self, id: Uuid) -> Result<inventory_alert::Model, ServiceError> {
        InventoryAlertEntity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Alert {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_alerts(
        &self,
        filters: AlertFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_alert::Model>, u64), ServiceError> {
        let mut query = InventoryAlertEntity::find();
        if let Some(kind) = filters.alert_type {
            query = query.filter(inventory_alert::Column::AlertType.eq(kind.to_string()));
        }
        if let Some(status) = filters.status {
            query = query.filter(inventory_alert::Column::Status.eq(status.to_string()));
        }
        if let Some(product_id) = filters.product_id {
            query = query.filter(inventory_alert::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(inventory_alert::Column::WarehouseId.eq(warehouse_id));
        }

        let paginator = query
            .order_by_desc(inventory_alert::Column::CreatedAt)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// OPEN -> ACKNOWLEDGED, stamping actor and time.
    #[instrument(skip(self))]
    pub async fn acknowledge(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<inventory_alert::Model, ServiceError> {
        let alert = self.get_alert(id).await?;
        if alert.status != AlertStatus::Open.to_string() {
            return Err(ServiceError::InvalidAlertTransition(format!(
                "Alert {} is {}; only OPEN alerts can be acknowledged",
                id, alert.status
            )));
        }

        let mut active: inventory_alert::ActiveModel = alert.into();
        active.status = Set(AlertStatus::Acknowledged.to_string());
        active.acknowledged_by = Set(Some(actor.to_string()));
        active.acknowledged_at = Set(Some(Utc::now()));
        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let _ = self
            .event_sender
            .send(Event::AlertAcknowledged { alert_id: id })
            .await;

        Ok(updated)
    }

    /// OPEN|ACKNOWLEDGED -> RESOLVED, stamping actor and time.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<inventory_alert::Model, ServiceError> {
        let alert = self.get_alert(id).await?;
        let resolvable = alert.status == AlertStatus::Open.to_string()
            || alert.status == AlertStatus::Acknowledged.to_string();
        if !resolvable {
            return Err(ServiceError::InvalidAlertTransition(format!(
                "Alert {} is {}; only OPEN or ACKNOWLEDGED alerts can be resolved",
                id, alert.status
            )));
        }

        let mut active: inventory_alert::ActiveModel = alert.into();
        active.status = Set(AlertStatus::Resolved.to_string());
        active.resolved_by = Set(Some(actor.to_string()));
        active.resolved_at = Set(Some(Utc::now()));
        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let _ = self
            .event_sender
            .send(Event::AlertResolved {
                alert_id: id,
                auto: false,
            })
            .await;

        Ok(updated)
    }

    /// Scheduled sweep: opens an EXPIRY alert for every (product, warehouse)
    /// holding a positive-quantity batch that expires within the window and
    /// has no OPEN EXPIRY alert yet. Returns the number of alerts opened.
    #[instrument(skip(self))]
    pub async fn check_expiring_batches(&self) -> Result<u64, ServiceError> {
        let db = self.db_pool.as_ref();
        let today = Utc::now().date_naive();
        let threshold = today + Duration::days(EXPIRY_WINDOW_DAYS);

        let expiring = BatchEntity::find()
            .filter(batch::Column::ExpiryDate.is_not_null())
            .filter(batch::Column::ExpiryDate.lte(threshold))
            .filter(batch::Column::ExpiryDate.gte(today))
            .filter(batch::Column::Quantity.gt(Decimal::ZERO))
            .order_by_asc(batch::Column::ExpiryDate)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut opened = 0;
        for expiring_batch in expiring {
            let existing = open_alert(
                db,
                expiring_batch.product_id,
                expiring_batch.warehouse_id,
                AlertKind::Expiry,
            )
            .await?;
            if existing.is_some() {
                continue;
            }

            let Some(expiry_date) = expiring_batch.expiry_date else {
                continue;
            };
            let product = catalog::product_by_id(db, expiring_batch.product_id).await?;
            let message = format!(
                "Batch {} of {} expires on {}",
                expiring_batch.batch_number, product.name, expiry_date
            );

            let alert = insert_alert(
                db,
                expiring_batch.product_id,
                expiring_batch.warehouse_id,
                None,
                AlertKind::Expiry,
                expiring_batch.quantity,
                TriggerSource::ScheduledCheck,
                message,
            )
            .await?;
            opened += 1;

            let _ = self
                .event_sender
                .send(Event::AlertOpened {
                    alert_id: alert.id,
                    alert_type: alert.alert_type.clone(),
                    product_id: alert.product_id,
                    warehouse_id: alert.warehouse_id,
                })
                .await;
        }

        Ok(opened)
    }
}

/// Evaluates alert state for a pair after a recompute. Classification:
/// quantity <= 0 opens OUT_OF_STOCK; otherwise quantity at or below the
/// active policy's minimum opens LOW_STOCK; otherwise every OPEN or
/// ACKNOWLEDGED level alert for the pair auto-resolves. EXPIRY alerts are
/// untouched by quantity recovery. Opening is suppressed when an OPEN alert
/// of the same kind already exists.
pub(crate) async fn evaluate<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    source: TriggerSource,
) -> Result<Option<inventory_alert::Model>, ServiceError> {
    let current_quantity = StockEntity::find()
        .filter(stock::Column::ProductId.eq(product_id))
        .filter(stock::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|row| row.quantity_on_hand)
        .unwrap_or(Decimal::ZERO);

    let policy = reorder_policies::active_policy_for(conn, product_id, warehouse_id).await?;

    let candidate = if current_quantity <= Decimal::ZERO {
        Some(AlertKind::OutOfStock)
    } else {
        match &policy {
            Some(p) if current_quantity <= p.min_stock_level => Some(AlertKind::LowStock),
            _ => None,
        }
    };

    match candidate {
        Some(kind) => {
            if open_alert(conn, product_id, warehouse_id, kind)
                .await?
                .is_some()
            {
                return Ok(None);
            }

            let product = catalog::product_by_id(conn, product_id).await?;
            let warehouse = catalog::warehouse_by_id(conn, warehouse_id).await?;
            let unit = product.unit_suffix();
            let message = if kind == AlertKind::OutOfStock {
                format!("{} is out of stock in {}", product.name, warehouse.name)
            } else {
                let min_level = policy
                    .as_ref()
                    .map(|p| p.min_stock_level)
                    .unwrap_or(Decimal::ZERO);
                format!(
                    "{} in {} has reached minimum stock level ({}{} <= {}{})",
                    product.name, warehouse.name, current_quantity, unit, min_level, unit
                )
            };

            let alert = insert_alert(
                conn,
                product_id,
                warehouse_id,
                policy.map(|p| p.id),
                kind,
                current_quantity,
                source,
                message,
            )
            .await?;
            Ok(Some(alert))
        }
        None => {
            // Stock recovered: close out level alerts for the pair.
            InventoryAlertEntity::update_many()
                .col_expr(
                    inventory_alert::Column::Status,
                    Expr::value(AlertStatus::Resolved.to_string()),
                )
                .col_expr(inventory_alert::Column::ResolvedAt, Expr::value(Utc::now()))
                .filter(inventory_alert::Column::ProductId.eq(product_id))
                .filter(inventory_alert::Column::WarehouseId.eq(warehouse_id))
                .filter(
                    inventory_alert::Column::Status.is_in([
                        AlertStatus::Open.to_string(),
                        AlertStatus::Acknowledged.to_string(),
                    ]),
                )
                .filter(
                    inventory_alert::Column::AlertType.is_in([
                        AlertKind::LowStock.to_string(),
                        AlertKind::OutOfStock.to_string(),
                    ]),
                )
                .exec(conn)
                .await
                .map_err(ServiceError::db_error)?;
            Ok(None)
        }
    }
}

/// The OPEN alert of a given kind for a pair, if one exists.
pub(crate) async fn open_alert<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    kind: AlertKind,
) -> Result<Option<inventory_alert::Model>, ServiceError> {
    InventoryAlertEntity::find()
        .filter(inventory_alert::Column::ProductId.eq(product_id))
        .filter(inventory_alert::Column::WarehouseId.eq(warehouse_id))
        .filter(inventory_alert::Column::AlertType.eq(kind.to_string()))
        .filter(inventory_alert::Column::Status.eq(AlertStatus::Open.to_string()))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

#[allow(clippy::too_many_arguments)]
async fn insert_alert<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    reorder_policy_id: Option<Uuid>,
    kind: AlertKind,
    current_quantity: Decimal,
    source: TriggerSource,
    message: String,
) -> Result<inventory_alert::Model, ServiceError> {
    inventory_alert::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        reorder_policy_id: Set(reorder_policy_id),
        alert_type: Set(kind.to_string()),
        status: Set(AlertStatus::Open.to_string()),
        current_quantity: Set(current_quantity),
        triggered_by: Set(source.to_string()),
        message: Set(message),
        acknowledged_by: Set(None),
        acknowledged_at: Set(None),
        resolved_by: Set(None),
        resolved_at: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)
}
