//! Stock aggregator: keeps the denormalized per-(product, warehouse) total in
//! step with the batch ledger.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        batch::{self, Entity as BatchEntity},
        stock::{self, Entity as StockEntity, StockStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

#[derive(Debug, Clone, Default)]
pub struct StockFilters {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub status: Option<StockStatus>,
}

#[derive(Debug, FromQueryResult)]
struct BatchTotal {
    total: Option<Decimal>,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Recomputes the aggregate for a pair outside any movement flow (the
    /// movement/batch paths recompute within their own transactions).
    #[instrument(skip(self))]
    pub async fn recalculate(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Option<stock::Model>, ServiceError> {
        let updated = recalculate(self.db_pool.as_ref(), product_id, warehouse_id).await?;

        if let Some(row) = &updated {
            let _ = self
                .event_sender
                .send(Event::StockRecalculated {
                    product_id,
                    warehouse_id,
                    quantity_on_hand: row.quantity_on_hand,
                    status: row.status.clone(),
                })
                .await;
        }

        Ok(updated)
    }

    /// Current aggregate for a pair; `None` means zero stock.
    #[instrument(skip(self))]
    pub async fn get_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Option<stock::Model>, ServiceError> {
        StockEntity::find()
            .filter(stock::Column::ProductId.eq(product_id))
            .filter(stock::Column::WarehouseId.eq(warehouse_id))
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn list_stock(
        &self,
        filters: StockFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock::Model>, u64), ServiceError> {
        let mut query = StockEntity::find();
        if let Some(product_id) = filters.product_id {
            query = query.filter(stock::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(stock::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(status) = filters.status {
            query = query.filter(stock::Column::Status.eq(status.to_string()));
        }

        let paginator = query
            .order_by_desc(stock::Column::LastUpdated)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }
}

/// Recomputes quantity on hand as the live sum of batch quantities for the
/// pair. A positive total upserts the row; anything else deletes it (absence
/// is zero). Idempotent: repeated calls without intervening mutations leave
/// identical state.
pub(crate) async fn recalculate<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<stock::Model>, ServiceError> {
    let total = BatchEntity::find()
        .select_only()
        .column_as(Expr::col(batch::Column::Quantity).sum(), "total")
        .filter(batch::Column::ProductId.eq(product_id))
        .filter(batch::Column::WarehouseId.eq(warehouse_id))
        .into_model::<BatchTotal>()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .and_then(|row| row.total)
        .unwrap_or(Decimal::ZERO);

    let existing = StockEntity::find()
        .filter(stock::Column::ProductId.eq(product_id))
        .filter(stock::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if total > Decimal::ZERO {
        let status = StockStatus::for_quantity(total);
        let now = Utc::now();
        let updated = match existing {
            Some(row) => {
                let mut active: stock::ActiveModel = row.into();
                active.quantity_on_hand = Set(total);
                active.status = Set(status.to_string());
                active.last_updated = Set(now);
                active.update(conn).await.map_err(ServiceError::db_error)?
            }
            None => stock::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                warehouse_id: Set(warehouse_id),
                quantity_on_hand: Set(total),
                status: Set(status.to_string()),
                last_updated: Set(now),
                created_at: Set(now),
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?,
        };
        Ok(Some(updated))
    } else {
        if let Some(row) = existing {
            row.delete(conn).await.map_err(ServiceError::db_error)?;
        }
        Ok(None)
    }
}
