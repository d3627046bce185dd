mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use stockledger_api::entities::batch::RetrievalMethod;
use stockledger_api::entities::inventory_alert::{AlertKind, AlertStatus};
use stockledger_api::entities::stock_movement::MovementKind;
use stockledger_api::errors::ServiceError;
use stockledger_api::services::alerts::AlertFilters;
use stockledger_api::services::movements::{AllocationInput, NewMovement, PolicyMovementRequest};
use stockledger_api::services::reorder_policies::UpsertReorderPolicy;

fn low_stock_policy(
    product_id: uuid::Uuid,
    warehouse_id: uuid::Uuid,
    min_stock_level: rust_decimal::Decimal,
) -> UpsertReorderPolicy {
    UpsertReorderPolicy {
        product_id,
        warehouse_id,
        min_stock_level,
        reorder_quantity: dec!(50),
        lead_time_days: 3,
        safety_stock: dec!(5),
        retrieval_method: RetrievalMethod::Fifo,
        is_active: true,
    }
}

fn out_with_policy(
    product_id: uuid::Uuid,
    warehouse_id: uuid::Uuid,
    quantity: rust_decimal::Decimal,
) -> PolicyMovementRequest {
    PolicyMovementRequest {
        product_id,
        warehouse_id,
        movement_type: MovementKind::Out,
        quantity,
        reference_number: None,
        notes: None,
    }
}

async fn alerts_for(
    services: &stockledger_api::handlers::AppServices,
    product_id: uuid::Uuid,
    warehouse_id: uuid::Uuid,
    kind: Option<AlertKind>,
    status: Option<AlertStatus>,
) -> Vec<stockledger_api::entities::inventory_alert::Model> {
    services
        .alerts
        .list_alerts(
            AlertFilters {
                alert_type: kind,
                status,
                product_id: Some(product_id),
                warehouse_id: Some(warehouse_id),
            },
            1,
            50,
        )
        .await
        .unwrap()
        .0
}

#[tokio::test]
async fn crossing_the_minimum_opens_a_low_stock_alert() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Drip bags").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    common::create_batch(&db, &product, &warehouse, "A", dec!(30), 60, None).await;
    common::create_batch(&db, &product, &warehouse, "B", dec!(20), 30, None).await;
    services
        .reorder_policies
        .upsert_policy(low_stock_policy(product.id, warehouse.id, dec!(15)), "tester")
        .await
        .unwrap();

    services
        .movements
        .record_movement_with_policy(out_with_policy(product.id, warehouse.id, dec!(40)))
        .await
        .unwrap();

    let open = alerts_for(
        &services,
        product.id,
        warehouse.id,
        Some(AlertKind::LowStock),
        Some(AlertStatus::Open),
    )
    .await;
    assert_eq!(open.len(), 1);
    let alert = &open[0];
    assert_eq!(alert.current_quantity, dec!(10));
    assert_eq!(alert.triggered_by, "STOCK_MOVEMENT");
    assert!(alert.message.contains(&product.name));

    // A second movement below the minimum does not duplicate the open alert
    services
        .movements
        .record_movement_with_policy(out_with_policy(product.id, warehouse.id, dec!(2)))
        .await
        .unwrap();
    let open = alerts_for(
        &services,
        product.id,
        warehouse.id,
        Some(AlertKind::LowStock),
        Some(AlertStatus::Open),
    )
    .await;
    assert_eq!(open.len(), 1);
}

#[tokio::test]
async fn recovery_auto_resolves_level_alerts() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Tea sampler").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let batch = common::create_batch(&db, &product, &warehouse, "A", dec!(50), 60, None).await;
    services
        .reorder_policies
        .upsert_policy(low_stock_policy(product.id, warehouse.id, dec!(15)), "tester")
        .await
        .unwrap();

    services
        .movements
        .record_movement_with_policy(out_with_policy(product.id, warehouse.id, dec!(40)))
        .await
        .unwrap();
    assert_eq!(
        alerts_for(
            &services,
            product.id,
            warehouse.id,
            Some(AlertKind::LowStock),
            Some(AlertStatus::Open)
        )
        .await
        .len(),
        1
    );

    // Replenish above the minimum: the alert resolves automatically
    services
        .movements
        .record_movement(NewMovement {
            movement_type: MovementKind::In,
            allocations: vec![AllocationInput {
                batch_id: batch.id,
                quantity: dec!(20),
            }],
            total_quantity: None,
            reference_number: None,
            notes: None,
        })
        .await
        .unwrap();

    let resolved = alerts_for(
        &services,
        product.id,
        warehouse.id,
        Some(AlertKind::LowStock),
        Some(AlertStatus::Resolved),
    )
    .await;
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].resolved_at.is_some());
    assert!(alerts_for(
        &services,
        product.id,
        warehouse.id,
        Some(AlertKind::LowStock),
        Some(AlertStatus::Open)
    )
    .await
    .is_empty());
}

#[tokio::test]
async fn draining_to_zero_opens_out_of_stock() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Sencha").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    common::create_batch(&db, &product, &warehouse, "A", dec!(20), 60, None).await;
    services
        .reorder_policies
        .upsert_policy(low_stock_policy(product.id, warehouse.id, dec!(15)), "tester")
        .await
        .unwrap();

    // First movement lands at 10 (low stock), second at 0 (out of stock)
    services
        .movements
        .record_movement_with_policy(out_with_policy(product.id, warehouse.id, dec!(10)))
        .await
        .unwrap();
    services
        .movements
        .record_movement_with_policy(out_with_policy(product.id, warehouse.id, dec!(10)))
        .await
        .unwrap();

    let out_of_stock = alerts_for(
        &services,
        product.id,
        warehouse.id,
        Some(AlertKind::OutOfStock),
        Some(AlertStatus::Open),
    )
    .await;
    assert_eq!(out_of_stock.len(), 1);
    assert_eq!(out_of_stock[0].current_quantity, dec!(0));

    // The earlier LOW_STOCK alert stays open until stock actually recovers
    assert_eq!(
        alerts_for(
            &services,
            product.id,
            warehouse.id,
            Some(AlertKind::LowStock),
            Some(AlertStatus::Open)
        )
        .await
        .len(),
        1
    );
}

#[tokio::test]
async fn manual_transitions_follow_the_state_machine() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Hojicha").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    common::create_batch(&db, &product, &warehouse, "A", dec!(20), 60, None).await;
    services
        .reorder_policies
        .upsert_policy(low_stock_policy(product.id, warehouse.id, dec!(15)), "tester")
        .await
        .unwrap();
    services
        .movements
        .record_movement_with_policy(out_with_policy(product.id, warehouse.id, dec!(10)))
        .await
        .unwrap();

    let alert_id = alerts_for(
        &services,
        product.id,
        warehouse.id,
        Some(AlertKind::LowStock),
        Some(AlertStatus::Open),
    )
    .await[0]
        .id;

    let acknowledged = services.alerts.acknowledge(alert_id, "ops-user").await.unwrap();
    assert_eq!(acknowledged.status, "ACKNOWLEDGED");
    assert_eq!(acknowledged.acknowledged_by.as_deref(), Some("ops-user"));
    assert!(acknowledged.acknowledged_at.is_some());

    // Acknowledging twice is invalid
    let err = services
        .alerts
        .acknowledge(alert_id, "ops-user")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidAlertTransition(_));

    let resolved = services.alerts.resolve(alert_id, "ops-lead").await.unwrap();
    assert_eq!(resolved.status, "RESOLVED");
    assert_eq!(resolved.resolved_by.as_deref(), Some("ops-lead"));
    assert!(resolved.resolved_at.is_some());

    // Resolving a resolved alert is invalid and changes nothing
    let err = services.alerts.resolve(alert_id, "ops-lead").await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidAlertTransition(_));
    let unchanged = services.alerts.get_alert(alert_id).await.unwrap();
    assert_eq!(unchanged.status, "RESOLVED");
}

#[tokio::test]
async fn expiry_sweep_opens_one_alert_per_pair() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Fresh cream").await;
    let warehouse = common::create_warehouse(&db, "cold").await;

    common::create_batch(
        &db,
        &product,
        &warehouse,
        "C",
        dec!(5),
        10,
        Some(common::days_from_today(3)),
    )
    .await;

    services.alerts.check_expiring_batches().await.unwrap();

    let expiry_alerts = alerts_for(
        &services,
        product.id,
        warehouse.id,
        Some(AlertKind::Expiry),
        Some(AlertStatus::Open),
    )
    .await;
    assert_eq!(expiry_alerts.len(), 1);
    assert_eq!(expiry_alerts[0].triggered_by, "SCHEDULED_CHECK");
    assert_eq!(expiry_alerts[0].current_quantity, dec!(5));

    // Running the sweep again the same day does not duplicate the alert
    services.alerts.check_expiring_batches().await.unwrap();
    assert_eq!(
        alerts_for(
            &services,
            product.id,
            warehouse.id,
            Some(AlertKind::Expiry),
            Some(AlertStatus::Open)
        )
        .await
        .len(),
        1
    );
}

#[tokio::test]
async fn expiry_sweep_window_is_seven_days_inclusive_and_skips_the_past() {
    let (db, services) = common::setup().await;
    let warehouse = common::create_warehouse(&db, "cold").await;

    let boundary = common::create_product(&db, "Boundary cheese").await;
    common::create_batch(
        &db,
        &boundary,
        &warehouse,
        "B7",
        dec!(5),
        10,
        Some(common::days_from_today(7)),
    )
    .await;

    let far = common::create_product(&db, "Hard cheese").await;
    common::create_batch(
        &db,
        &far,
        &warehouse,
        "F10",
        dec!(5),
        10,
        Some(common::days_from_today(10)),
    )
    .await;

    let past = common::create_product(&db, "Expired cheese").await;
    common::create_batch(
        &db,
        &past,
        &warehouse,
        "P1",
        dec!(5),
        10,
        Some(common::days_from_today(-1)),
    )
    .await;

    let empty = common::create_product(&db, "Empty cheese").await;
    common::create_batch(
        &db,
        &empty,
        &warehouse,
        "E0",
        dec!(0),
        10,
        Some(common::days_from_today(3)),
    )
    .await;

    services.alerts.check_expiring_batches().await.unwrap();

    assert_eq!(
        alerts_for(&services, boundary.id, warehouse.id, Some(AlertKind::Expiry), None)
            .await
            .len(),
        1
    );
    assert!(alerts_for(&services, far.id, warehouse.id, Some(AlertKind::Expiry), None)
        .await
        .is_empty());
    assert!(alerts_for(&services, past.id, warehouse.id, Some(AlertKind::Expiry), None)
        .await
        .is_empty());
    assert!(alerts_for(&services, empty.id, warehouse.id, Some(AlertKind::Expiry), None)
        .await
        .is_empty());
}

#[tokio::test]
async fn quantity_recovery_leaves_expiry_alerts_open() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Soft cheese").await;
    let warehouse = common::create_warehouse(&db, "cold").await;

    let batch = common::create_batch(
        &db,
        &product,
        &warehouse,
        "S1",
        dec!(5),
        10,
        Some(common::days_from_today(2)),
    )
    .await;

    services.alerts.check_expiring_batches().await.unwrap();
    assert_eq!(
        alerts_for(
            &services,
            product.id,
            warehouse.id,
            Some(AlertKind::Expiry),
            Some(AlertStatus::Open)
        )
        .await
        .len(),
        1
    );

    // A healthy stock level does not touch EXPIRY alerts
    services
        .movements
        .record_movement(NewMovement {
            movement_type: MovementKind::In,
            allocations: vec![AllocationInput {
                batch_id: batch.id,
                quantity: dec!(100),
            }],
            total_quantity: None,
            reference_number: None,
            notes: None,
        })
        .await
        .unwrap();

    assert_eq!(
        alerts_for(
            &services,
            product.id,
            warehouse.id,
            Some(AlertKind::Expiry),
            Some(AlertStatus::Open)
        )
        .await
        .len(),
        1
    );
}
