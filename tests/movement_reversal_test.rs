mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use stockledger_api::entities::stock_movement::MovementKind;
use stockledger_api::errors::ServiceError;
use stockledger_api::services::movements::{AllocationInput, NewMovement};

fn movement(
    kind: MovementKind,
    allocations: Vec<AllocationInput>,
    total: Option<rust_decimal::Decimal>,
) -> NewMovement {
    NewMovement {
        movement_type: kind,
        allocations,
        total_quantity: total,
        reference_number: None,
        notes: None,
    }
}

fn alloc(batch_id: uuid::Uuid, quantity: rust_decimal::Decimal) -> AllocationInput {
    AllocationInput { batch_id, quantity }
}

#[tokio::test]
async fn deleting_a_movement_restores_batches_and_stock() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "House blend").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let a = common::create_batch(&db, &product, &warehouse, "A", dec!(30), 60, None).await;
    let b = common::create_batch(&db, &product, &warehouse, "B", dec!(20), 30, None).await;

    let record = services
        .movements
        .record_movement(movement(
            MovementKind::Out,
            vec![alloc(a.id, dec!(25)), alloc(b.id, dec!(15))],
            Some(dec!(40)),
        ))
        .await
        .unwrap();

    services
        .movements
        .delete_movement(record.movement.id)
        .await
        .unwrap();

    // Pre-movement state is restored
    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(30));
    assert_eq!(services.batches.get_batch(b.id).await.unwrap().quantity, dec!(20));
    let stock = services
        .stock
        .get_stock(product.id, warehouse.id)
        .await
        .unwrap()
        .expect("stock row should exist");
    assert_eq!(stock.quantity_on_hand, dec!(50));

    let err = services
        .movements
        .get_movement(record.movement.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn reversal_refuses_to_drive_a_batch_negative() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Roast batch").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let a = common::create_batch(&db, &product, &warehouse, "A", dec!(30), 60, None).await;

    // Stock arrives, then is almost fully consumed by later activity
    let inbound = services
        .movements
        .record_movement(movement(MovementKind::In, vec![alloc(a.id, dec!(20))], None))
        .await
        .unwrap();
    services
        .movements
        .record_movement(movement(MovementKind::Out, vec![alloc(a.id, dec!(45))], None))
        .await
        .unwrap();
    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(5));

    // Undoing the inbound would need 20 units but only 5 remain
    let err = services
        .movements
        .delete_movement(inbound.movement.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::IrreversibleDeletion(_));

    // The movement stays in place and the batch is untouched
    assert!(services
        .movements
        .get_movement(inbound.movement.id)
        .await
        .is_ok());
    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(5));
}

#[tokio::test]
async fn allocation_mismatch_is_rejected_before_any_write() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Blend 42").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let a = common::create_batch(&db, &product, &warehouse, "A", dec!(30), 60, None).await;

    let err = services
        .movements
        .record_movement(movement(
            MovementKind::Out,
            vec![alloc(a.id, dec!(10))],
            Some(dec!(50)),
        ))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::AllocationMismatch(_));

    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(30));
}

#[tokio::test]
async fn manual_out_beyond_the_batch_fails_atomically() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Limited release").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let a = common::create_batch(&db, &product, &warehouse, "A", dec!(30), 60, None).await;
    let b = common::create_batch(&db, &product, &warehouse, "B", dec!(20), 30, None).await;

    // The first allocation is feasible, the second is not; nothing commits
    let err = services
        .movements
        .record_movement(movement(
            MovementKind::Out,
            vec![alloc(a.id, dec!(10)), alloc(b.id, dec!(25))],
            None,
        ))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientQuantity(_));

    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(30));
    assert_eq!(services.batches.get_batch(b.id).await.unwrap().quantity, dec!(20));
}

#[tokio::test]
async fn adjustments_carry_their_own_sign() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Cold brew").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let a = common::create_batch(&db, &product, &warehouse, "A", dec!(30), 60, None).await;

    services
        .movements
        .record_movement(movement(
            MovementKind::Adjustment,
            vec![alloc(a.id, dec!(-5))],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(25));

    services
        .movements
        .record_movement(movement(
            MovementKind::Adjustment,
            vec![alloc(a.id, dec!(3))],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(28));

    // An adjustment can never take the batch below zero
    let err = services
        .movements
        .record_movement(movement(
            MovementKind::Adjustment,
            vec![alloc(a.id, dec!(-1000))],
            None,
        ))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientQuantity(_));
    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(28));
}

#[tokio::test]
async fn returns_reduce_batch_stock() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Returnable kit").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let a = common::create_batch(&db, &product, &warehouse, "A", dec!(30), 60, None).await;

    services
        .movements
        .record_movement(movement(
            MovementKind::Return,
            vec![alloc(a.id, dec!(10))],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(services.batches.get_batch(a.id).await.unwrap().quantity, dec!(20));
}
