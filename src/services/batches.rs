//! Batch ledger: the source of truth for on-hand quantity.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::batch::{self, generate_batch_number, Entity as BatchEntity, RetrievalMethod},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog, stock},
};

#[derive(Clone)]
pub struct BatchService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

/// An externally received lot entering the ledger.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    /// Generated when absent.
    pub batch_number: Option<String>,
    pub quantity: Decimal,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchFilters {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
}

impl BatchService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a received lot and brings the aggregate up to date in the
    /// same transaction.
    #[instrument(skip(self))]
    pub async fn receive_batch(&self, input: NewBatch) -> Result<batch::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Batch quantity must be positive".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        let created = db
            .transaction::<_, batch::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    catalog::product_by_id(txn, input.product_id).await?;
                    catalog::warehouse_by_id(txn, input.warehouse_id).await?;

                    let batch_number = input
                        .batch_number
                        .unwrap_or_else(generate_batch_number);

                    let duplicate = BatchEntity::find()
                        .filter(batch::Column::ProductId.eq(input.product_id))
                        .filter(batch::Column::WarehouseId.eq(input.warehouse_id))
                        .filter(batch::Column::BatchNumber.eq(batch_number.clone()))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if duplicate.is_some() {
                        return Err(ServiceError::Conflict(format!(
                            "Batch number {} already exists for this product and warehouse",
                            batch_number
                        )));
                    }

                    let created = batch::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        product_id: Set(input.product_id),
                        warehouse_id: Set(input.warehouse_id),
                        batch_number: Set(batch_number),
                        quantity: Set(input.quantity),
                        manufacture_date: Set(input.manufacture_date),
                        expiry_date: Set(input.expiry_date),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    stock::recalculate(txn, created.product_id, created.warehouse_id).await?;

                    Ok(created)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        let _ = self
            .event_sender
            .send(Event::BatchReceived {
                batch_id: created.id,
                product_id: created.product_id,
                warehouse_id: created.warehouse_id,
                quantity: created.quantity,
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_batch(&self, id: Uuid) -> Result<batch::Model, ServiceError> {
        BatchEntity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_batches(
        &self,
        filters: BatchFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<batch::Model>, u64), ServiceError> {
        let mut query = BatchEntity::find();
        if let Some(product_id) = filters.product_id {
            query = query.filter(batch::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(batch::Column::WarehouseId.eq(warehouse_id));
        }

        let paginator = query
            .order_by_desc(batch::Column::CreatedAt)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// Hard-deletes a batch and recomputes the aggregate. Historical movement
    /// allocations keep the batch id.
    #[instrument(skip(self))]
    pub async fn delete_batch(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let deleted = db
            .transaction::<_, batch::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = BatchEntity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Batch {} not found", id))
                        })?;

                    BatchEntity::delete_by_id(id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    stock::recalculate(txn, existing.product_id, existing.warehouse_id).await?;

                    Ok(existing)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        let _ = self
            .event_sender
            .send(Event::BatchDeleted {
                batch_id: deleted.id,
                product_id: deleted.product_id,
                warehouse_id: deleted.warehouse_id,
            })
            .await;

        Ok(())
    }
}

/// Batches with positive quantity for a pair, ordered per the retrieval
/// method. FEFO excludes batches without an expiry date.
pub(crate) async fn available_batches<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    method: RetrievalMethod,
) -> Result<Vec<batch::Model>, ServiceError> {
    let query = BatchEntity::find()
        .filter(batch::Column::ProductId.eq(product_id))
        .filter(batch::Column::WarehouseId.eq(warehouse_id))
        .filter(batch::Column::Quantity.gt(Decimal::ZERO));

    let query = match method {
        RetrievalMethod::Fifo => query.order_by_asc(batch::Column::CreatedAt),
        RetrievalMethod::Lifo => query.order_by_desc(batch::Column::CreatedAt),
        RetrievalMethod::Fefo => query
            .filter(batch::Column::ExpiryDate.is_not_null())
            .order_by_asc(batch::Column::ExpiryDate),
    };

    query.all(conn).await.map_err(ServiceError::db_error)
}

/// Applies a signed delta to a batch quantity as a single storage-level
/// update (`quantity = quantity + delta`). Decrements carry a
/// `quantity >= -delta` guard so a concurrent consumer can never drive the
/// value negative; the losing update affects zero rows and surfaces as
/// `InsufficientQuantity`.
pub(crate) async fn apply_quantity_delta<C: ConnectionTrait>(
    conn: &C,
    batch_id: Uuid,
    delta: Decimal,
) -> Result<(), ServiceError> {
    if delta.is_zero() {
        return Ok(());
    }

    let mut update = BatchEntity::update_many()
        .col_expr(
            batch::Column::Quantity,
            Expr::col(batch::Column::Quantity).add(delta),
        )
        .filter(batch::Column::Id.eq(batch_id));
    if delta < Decimal::ZERO {
        update = update.filter(batch::Column::Quantity.gte(-delta));
    }

    let result = update.exec(conn).await.map_err(ServiceError::db_error)?;
    if result.rows_affected > 0 {
        return Ok(());
    }

    // Zero rows: either the batch vanished or the non-negative guard refused.
    match BatchEntity::find_by_id(batch_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
    {
        None => Err(ServiceError::NotFound(format!(
            "Batch {} not found",
            batch_id
        ))),
        Some(existing) => Err(ServiceError::InsufficientQuantity(format!(
            "Batch {} holds {}, cannot remove {}",
            existing.batch_number, existing.quantity, -delta
        ))),
    }
}
