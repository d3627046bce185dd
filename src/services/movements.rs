//! Movement recorder: validates and commits inventory transactions against
//! one or more batches, keeping aggregates and alerts in step within the same
//! transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        batch::{self, Entity as BatchEntity},
        inventory_alert::TriggerSource,
        stock_movement::{self, Entity as StockMovementEntity, MovementKind},
        stock_movement_batch::{self, Entity as StockMovementBatchEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{alerts, batches, catalog, reorder_policies, stock},
};

#[derive(Clone)]
pub struct MovementService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

/// One batch's share of a movement.
#[derive(Debug, Clone)]
pub struct AllocationInput {
    pub batch_id: Uuid,
    pub quantity: Decimal,
}

/// A manual movement with caller-supplied allocations.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub movement_type: MovementKind,
    pub allocations: Vec<AllocationInput>,
    /// Declared total; must equal the allocation sum when present.
    pub total_quantity: Option<Decimal>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// A movement whose allocations are derived from the pair's retrieval policy.
#[derive(Debug, Clone)]
pub struct PolicyMovementRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub movement_type: MovementKind,
    pub quantity: Decimal,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// A committed movement together with its allocation rows.
#[derive(Debug, Clone)]
pub struct MovementRecord {
    pub movement: stock_movement::Model,
    pub allocations: Vec<stock_movement_batch::Model>,
}

#[derive(Debug, Clone, Default)]
pub struct MovementFilters {
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<MovementKind>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl MovementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a movement from caller-supplied allocations. Everything is
    /// validated up front; the batch deltas, the aggregate recompute and the
    /// alert evaluation commit atomically with the movement.
    #[instrument(skip(self))]
    pub async fn record_movement(
        &self,
        input: NewMovement,
    ) -> Result<MovementRecord, ServiceError> {
        let total = validate_allocations(
            input.movement_type,
            &input.allocations,
            input.total_quantity,
        )?;

        let db = self.db_pool.as_ref();
        let record = db
            .transaction::<_, MovementRecord, ServiceError>(move |txn| {
                Box::pin(async move {
                    commit_movement(
                        txn,
                        input.movement_type,
                        total,
                        input.allocations,
                        input.reference_number,
                        input.notes,
                    )
                    .await
                })
            })
            .await
            .map_err(ServiceError::from)?;

        self.emit_recorded(&record).await;
        Ok(record)
    }

    /// Records a movement by allocating across available batches in the order
    /// given by the pair's active policy. Without a policy the retrieval
    /// method defaults to FIFO. The request fails with `InsufficientStock`
    /// when the eligible batches cannot cover the total; nothing is committed
    /// in that case.
    #[instrument(skip(self))]
    pub async fn record_movement_with_policy(
        &self,
        request: PolicyMovementRequest,
    ) -> Result<MovementRecord, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Movement quantity must be positive".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        let record = db
            .transaction::<_, MovementRecord, ServiceError>(move |txn| {
                Box::pin(async move {
                    catalog::product_by_id(txn, request.product_id).await?;
                    catalog::warehouse_by_id(txn, request.warehouse_id).await?;

                    let policy = reorder_policies::active_policy_for(
                        txn,
                        request.product_id,
                        request.warehouse_id,
                    )
                    .await?;
                    let method = policy
                        .as_ref()
                        .map(|p| p.retrieval_method())
                        .unwrap_or_default();

                    let available = batches::available_batches(
                        txn,
                        request.product_id,
                        request.warehouse_id,
                        method,
                    )
                    .await?;

                    let total_available: Decimal =
                        available.iter().map(|b| b.quantity).sum();
                    if total_available < request.quantity {
                        return Err(ServiceError::InsufficientStock(format!(
                            "Available: {}, Required: {}",
                            total_available, request.quantity
                        )));
                    }

                    let plan = plan_allocations(&available, request.quantity);

                    commit_movement(
                        txn,
                        request.movement_type,
                        request.quantity,
                        plan,
                        request.reference_number,
                        request.notes,
                    )
                    .await
                })
            })
            .await
            .map_err(ServiceError::from)?;

        self.emit_recorded(&record).await;
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn get_movement(&self, id: Uuid) -> Result<MovementRecord, ServiceError> {
        let db = self.db_pool.as_ref();
        let movement = StockMovementEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement {} not found", id)))?;

        let allocations = StockMovementBatchEntity::find()
            .filter(stock_movement_batch::Column::StockMovementId.eq(id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(MovementRecord {
            movement,
            allocations,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        filters: MovementFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let mut query = StockMovementEntity::find();

        if let Some(warehouse_id) = filters.warehouse_id {
            query = query
                .join(
                    JoinType::InnerJoin,
                    stock_movement::Relation::Allocations.def(),
                )
                .join(JoinType::InnerJoin, stock_movement_batch::Relation::Batch.def())
                .filter(batch::Column::WarehouseId.eq(warehouse_id))
                .distinct();
        }
        if let Some(kind) = filters.movement_type {
            query = query.filter(stock_movement::Column::MovementType.eq(kind.to_string()));
        }
        if let Some(start) = filters.start_date {
            query = query.filter(stock_movement::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filters.end_date {
            query = query.filter(stock_movement::Column::CreatedAt.lte(end));
        }

        let paginator = query
            .order_by_desc(stock_movement::Column::CreatedAt)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// Deletes a movement by reversing each allocation's effect on its batch,
    /// then removing the movement and its allocations. A reversal that would
    /// drive a batch negative (the batch was consumed after this movement was
    /// recorded) aborts the whole transaction with `IrreversibleDeletion`.
    /// Allocations whose batch has since been hard-deleted are skipped.
    #[instrument(skip(self))]
    pub async fn delete_movement(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                let movement = StockMovementEntity::find_by_id(id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Movement {} not found", id))
                    })?;
                let kind = movement.kind().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Movement {} has unknown type {}",
                        id, movement.movement_type
                    ))
                })?;

                let allocations = StockMovementBatchEntity::find()
                    .filter(stock_movement_batch::Column::StockMovementId.eq(id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                let mut affected: Vec<(Uuid, Uuid)> = Vec::new();
                for allocation in &allocations {
                    let Some(target) = BatchEntity::find_by_id(allocation.batch_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                    else {
                        continue;
                    };

                    let delta = -(allocation.quantity * kind.batch_sign());
                    batches::apply_quantity_delta(txn, target.id, delta)
                        .await
                        .map_err(|err| match err {
                            ServiceError::InsufficientQuantity(_) => {
                                ServiceError::IrreversibleDeletion(format!(
                                    "Reversing movement {} would drive batch {} below zero \
                                     ({} on hand, {} to remove)",
                                    id, target.batch_number, target.quantity, -delta
                                ))
                            }
                            other => other,
                        })?;

                    let pair = (target.product_id, target.warehouse_id);
                    if !affected.contains(&pair) {
                        affected.push(pair);
                    }
                }

                StockMovementBatchEntity::delete_many()
                    .filter(stock_movement_batch::Column::StockMovementId.eq(id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                StockMovementEntity::delete_by_id(id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                for (product_id, warehouse_id) in affected {
                    stock::recalculate(txn, product_id, warehouse_id).await?;
                    alerts::evaluate(txn, product_id, warehouse_id, TriggerSource::StockMovement)
                        .await?;
                }

                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from)?;

        let _ = self
            .event_sender
            .send(Event::MovementReversed { movement_id: id })
            .await;

        Ok(())
    }

    async fn emit_recorded(&self, record: &MovementRecord) {
        let _ = self
            .event_sender
            .send(Event::MovementRecorded {
                movement_id: record.movement.id,
                movement_type: record.movement.movement_type.clone(),
                total_quantity: record.movement.total_quantity,
                batch_ids: record.allocations.iter().map(|a| a.batch_id).collect(),
            })
            .await;
    }
}

/// Validates manual allocations and returns the movement total.
///
/// IN/OUT/RETURN allocations must be positive; ADJUSTMENT allocations are
/// signed but must be non-zero. A declared total that differs from the
/// allocation sum is an `AllocationMismatch`.
fn validate_allocations(
    kind: MovementKind,
    allocations: &[AllocationInput],
    declared_total: Option<Decimal>,
) -> Result<Decimal, ServiceError> {
    if allocations.is_empty() {
        return Err(ServiceError::ValidationError(
            "A movement requires at least one allocation".into(),
        ));
    }

    for allocation in allocations {
        if allocation.quantity.is_zero() {
            return Err(ServiceError::ValidationError(format!(
                "Allocation for batch {} has zero quantity",
                allocation.batch_id
            )));
        }
        if allocation.quantity < Decimal::ZERO && !kind.allows_signed_quantity() {
            return Err(ServiceError::ValidationError(format!(
                "Negative allocation quantities are only valid for ADJUSTMENT movements \
                 (batch {})",
                allocation.batch_id
            )));
        }
    }

    let sum: Decimal = allocations.iter().map(|a| a.quantity).sum();
    if let Some(declared) = declared_total {
        if declared != sum {
            return Err(ServiceError::AllocationMismatch(format!(
                "Declared total {} does not match allocation sum {}",
                declared, sum
            )));
        }
    }

    Ok(sum)
}

/// Greedily takes `min(batch remaining, still needed)` from each batch in
/// order until the requested total is covered. Callers verify availability
/// beforehand; with insufficient batches the plan simply covers less than
/// requested.
fn plan_allocations(available: &[batch::Model], requested: Decimal) -> Vec<AllocationInput> {
    let mut remaining = requested;
    let mut plan = Vec::new();

    for candidate in available {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = candidate.quantity.min(remaining);
        if take <= Decimal::ZERO {
            continue;
        }
        plan.push(AllocationInput {
            batch_id: candidate.id,
            quantity: take,
        });
        remaining -= take;
    }

    plan
}

/// Persists the movement and its allocations, applies the batch deltas, and
/// runs the recompute/alert pipeline for every affected pair. Runs inside the
/// caller's transaction.
async fn commit_movement<C: ConnectionTrait>(
    txn: &C,
    kind: MovementKind,
    total: Decimal,
    allocations: Vec<AllocationInput>,
    reference_number: Option<String>,
    notes: Option<String>,
) -> Result<MovementRecord, ServiceError> {
    let now = Utc::now();
    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        movement_type: Set(kind.to_string()),
        total_quantity: Set(total),
        reference_number: Set(reference_number),
        notes: Set(notes),
        created_at: Set(now),
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;

    let mut rows = Vec::with_capacity(allocations.len());
    let mut affected: Vec<(Uuid, Uuid)> = Vec::new();

    for allocation in allocations {
        let target = BatchEntity::find_by_id(allocation.batch_id)
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Batch {} not found", allocation.batch_id))
            })?;

        let delta = allocation.quantity * kind.batch_sign();
        batches::apply_quantity_delta(txn, target.id, delta).await?;

        let row = stock_movement_batch::ActiveModel {
            id: Set(Uuid::new_v4()),
            stock_movement_id: Set(movement.id),
            batch_id: Set(target.id),
            quantity: Set(allocation.quantity),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;
        rows.push(row);

        let pair = (target.product_id, target.warehouse_id);
        if !affected.contains(&pair) {
            affected.push(pair);
        }
    }

    for (product_id, warehouse_id) in affected {
        stock::recalculate(txn, product_id, warehouse_id).await?;
        alerts::evaluate(txn, product_id, warehouse_id, TriggerSource::StockMovement).await?;
    }

    Ok(MovementRecord {
        movement,
        allocations: rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn batch_row(id: Uuid, quantity: Decimal) -> batch::Model {
        batch::Model {
            id,
            product_id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            batch_number: "B".into(),
            quantity,
            manufacture_date: None,
            expiry_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn plan_spills_across_batches_in_order() {
        let a = batch_row(Uuid::new_v4(), dec!(30));
        let b = batch_row(Uuid::new_v4(), dec!(20));
        let plan = plan_allocations(&[a.clone(), b.clone()], dec!(40));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].batch_id, a.id);
        assert_eq!(plan[0].quantity, dec!(30));
        assert_eq!(plan[1].batch_id, b.id);
        assert_eq!(plan[1].quantity, dec!(10));
    }

    #[test]
    fn plan_stops_once_the_total_is_covered() {
        let a = batch_row(Uuid::new_v4(), dec!(30));
        let b = batch_row(Uuid::new_v4(), dec!(20));
        let plan = plan_allocations(&[a.clone(), b], dec!(25));

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, a.id);
        assert_eq!(plan[0].quantity, dec!(25));
    }

    #[test]
    fn plan_drains_everything_on_an_exact_fit() {
        let a = batch_row(Uuid::new_v4(), dec!(30));
        let b = batch_row(Uuid::new_v4(), dec!(20));
        let plan = plan_allocations(&[a, b], dec!(50));

        let planned: Decimal = plan.iter().map(|p| p.quantity).sum();
        assert_eq!(planned, dec!(50));
    }

    #[test]
    fn declared_total_must_match_allocation_sum() {
        let allocations = vec![
            AllocationInput {
                batch_id: Uuid::new_v4(),
                quantity: dec!(30),
            },
            AllocationInput {
                batch_id: Uuid::new_v4(),
                quantity: dec!(10),
            },
        ];

        let err = validate_allocations(MovementKind::Out, &allocations, Some(dec!(50)))
            .unwrap_err();
        assert_matches!(err, ServiceError::AllocationMismatch(_));

        let total =
            validate_allocations(MovementKind::Out, &allocations, Some(dec!(40))).unwrap();
        assert_eq!(total, dec!(40));
    }

    #[test]
    fn negative_allocations_require_adjustment() {
        let allocations = vec![AllocationInput {
            batch_id: Uuid::new_v4(),
            quantity: dec!(-5),
        }];

        assert_matches!(
            validate_allocations(MovementKind::Out, &allocations, None),
            Err(ServiceError::ValidationError(_))
        );
        let total =
            validate_allocations(MovementKind::Adjustment, &allocations, None).unwrap();
        assert_eq!(total, dec!(-5));
    }

    #[test]
    fn empty_allocations_are_rejected() {
        assert_matches!(
            validate_allocations(MovementKind::In, &[], None),
            Err(ServiceError::ValidationError(_))
        );
    }
}
