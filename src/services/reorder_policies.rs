//! Reorder policy store: keyed configuration with a single invariant — at
//! most one active policy per (product, warehouse) pair.

use std::sync::Arc;

use chrono::Utc;
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
    entities::{
        batch::RetrievalMethod,
        reorder_policy::{self, Entity as ReorderPolicyEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog,
};

#[derive(Clone)]
pub struct ReorderPolicyService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

#[derive(Debug, Clone)]
pub struct UpsertReorderPolicy {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub min_stock_level: Decimal,
    pub reorder_quantity: Decimal,
    pub lead_time_days: i32,
    pub safety_stock: Decimal,
    pub retrieval_method: RetrievalMethod,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyFilters {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl ReorderPolicyService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates or updates the policy for a pair. Activating a policy
    /// deactivates any other active row for the same pair in the same
    /// transaction, so the uniqueness invariant holds at commit.
    #[instrument(skip(self))]
    pub async fn upsert_policy(
        &self,
        input: UpsertReorderPolicy,
        actor: &str,
    ) -> Result<reorder_policy::Model, ServiceError> {
        if input.min_stock_level < Decimal::ZERO
            || input.reorder_quantity < Decimal::ZERO
            || input.safety_stock < Decimal::ZERO
            || input.lead_time_days < 0
        {
            return Err(ServiceError::ValidationError(
                "Policy thresholds must be non-negative".into(),
            ));
        }

        let actor = actor.to_string();
        let db = self.db_pool.as_ref();
        let policy = db
            .transaction::<_, reorder_policy::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    catalog::product_by_id(txn, input.product_id).await?;
                    catalog::warehouse_by_id(txn, input.warehouse_id).await?;

                    let existing = ReorderPolicyEntity::find()
                        .filter(reorder_policy::Column::ProductId.eq(input.product_id))
                        .filter(reorder_policy::Column::WarehouseId.eq(input.warehouse_id))
                        .order_by_desc(reorder_policy::Column::UpdatedAt)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let now = Utc::now();
                    let saved = match existing {
                        Some(row) => {
                            let mut active: reorder_policy::ActiveModel = row.into();
                            active.min_stock_level = Set(input.min_stock_level);
                            active.reorder_quantity = Set(input.reorder_quantity);
                            active.lead_time_days = Set(input.lead_time_days);
                            active.safety_stock = Set(input.safety_stock);
                            active.retrieval_method = Set(input.retrieval_method.to_string());
                            active.is_active = Set(input.is_active);
                            active.updated_by = Set(Some(actor.clone()));
                            active.updated_at = Set(now);
                            active.update(txn).await.map_err(ServiceError::db_error)?
                        }
                        None => reorder_policy::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            product_id: Set(input.product_id),
                            warehouse_id: Set(input.warehouse_id),
                            min_stock_level: Set(input.min_stock_level),
                            reorder_quantity: Set(input.reorder_quantity),
                            lead_time_days: Set(input.lead_time_days),
                            safety_stock: Set(input.safety_stock),
                            retrieval_method: Set(input.retrieval_method.to_string()),
                            is_active: Set(input.is_active),
                            created_by: Set(Some(actor.clone())),
                            updated_by: Set(Some(actor.clone())),
                            created_at: Set(now),
                            updated_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?,
                    };

                    if saved.is_active {
                        ReorderPolicyEntity::update_many()
                            .col_expr(reorder_policy::Column::IsActive, Expr::value(false))
                            .col_expr(reorder_policy::Column::UpdatedAt, Expr::value(now))
                            .filter(reorder_policy::Column::ProductId.eq(input.product_id))
                            .filter(reorder_policy::Column::WarehouseId.eq(input.warehouse_id))
                            .filter(reorder_policy::Column::IsActive.eq(true))
                            .filter(reorder_policy::Column::Id.ne(saved.id))
                            .exec(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                    }

                    Ok(saved)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        let _ = self
            .event_sender
            .send(Event::ReorderPolicyUpserted {
                policy_id: policy.id,
                product_id: policy.product_id,
                warehouse_id: policy.warehouse_id,
            })
            .await;

        Ok(policy)
    }

    #[instrument(skip(self))]
    pub async fn get_policy(&self, id: Uuid) -> Result<reorder_policy::Model, ServiceError> {
        ReorderPolicyEntity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Reorder policy {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn active_policy_for(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Option<reorder_policy::Model>, ServiceError> {
        active_policy_for(self.db_pool.as_ref(), product_id, warehouse_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_policies(
        &self,
        filters: PolicyFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<reorder_policy::Model>, u64), ServiceError> {
        let mut query = ReorderPolicyEntity::find();
        if let Some(product_id) = filters.product_id {
            query = query.filter(reorder_policy::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(reorder_policy::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(is_active) = filters.is_active {
            query = query.filter(reorder_policy::Column::IsActive.eq(is_active));
        }

        let paginator = query
            .order_by_desc(reorder_policy::Column::CreatedAt)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn deactivate_policy(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<reorder_policy::Model, ServiceError> {
        let existing = self.get_policy(id).await?;
        let mut active: reorder_policy::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_by = Set(Some(actor.to_string()));
        active.updated_at = Set(Utc::now());
        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}

/// The active policy for a pair, if any. Absence is not an error: callers
/// fall back to the FIFO default.
pub(crate) async fn active_policy_for<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<reorder_policy::Model>, ServiceError> {
    ReorderPolicyEntity::find()
        .filter(reorder_policy::Column::ProductId.eq(product_id))
        .filter(reorder_policy::Column::WarehouseId.eq(warehouse_id))
        .filter(reorder_policy::Column::IsActive.eq(true))
        .order_by_desc(reorder_policy::Column::UpdatedAt)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}
