mod common;

use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use stockledger_api::entities::batch::Entity as BatchEntity;
use stockledger_api::services::batches::NewBatch;

#[tokio::test]
async fn recalculate_tracks_the_batch_sum() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Arabica beans").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    common::create_batch(&db, &product, &warehouse, "A", dec!(30), 10, None).await;
    common::create_batch(&db, &product, &warehouse, "B", dec!(20), 5, None).await;

    let stock = services
        .stock
        .recalculate(product.id, warehouse.id)
        .await
        .unwrap()
        .expect("stock row should exist");

    assert_eq!(stock.quantity_on_hand, dec!(50));
    assert_eq!(stock.status, "GOOD");
}

#[tokio::test]
async fn recalculate_is_idempotent() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Robusta beans").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    common::create_batch(&db, &product, &warehouse, "A", dec!(42), 10, None).await;

    let first = services
        .stock
        .recalculate(product.id, warehouse.id)
        .await
        .unwrap()
        .expect("stock row should exist");
    let second = services
        .stock
        .recalculate(product.id, warehouse.id)
        .await
        .unwrap()
        .expect("stock row should exist");

    assert_eq!(first.id, second.id);
    assert_eq!(first.quantity_on_hand, second.quantity_on_hand);
    assert_eq!(first.status, second.status);
}

#[tokio::test]
async fn status_bands_follow_the_aggregate_quantity() {
    let (db, services) = common::setup().await;
    let warehouse = common::create_warehouse(&db, "main").await;

    for (quantity, expected) in [
        (dec!(10), "ALMOST_OUT"),
        (dec!(10.01), "GOOD"),
        (dec!(100), "GOOD"),
        (dec!(100.01), "FULL"),
    ] {
        let product = common::create_product(&db, "band product").await;
        common::create_batch(&db, &product, &warehouse, "A", quantity, 1, None).await;

        let stock = services
            .stock
            .recalculate(product.id, warehouse.id)
            .await
            .unwrap()
            .expect("stock row should exist");
        assert_eq!(stock.status, expected, "quantity {}", quantity);
    }
}

#[tokio::test]
async fn receiving_a_batch_updates_the_aggregate_in_the_same_flow() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Green tea").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let created = services
        .batches
        .receive_batch(NewBatch {
            product_id: product.id,
            warehouse_id: warehouse.id,
            batch_number: None,
            quantity: dec!(120),
            manufacture_date: None,
            expiry_date: None,
        })
        .await
        .unwrap();
    assert!(!created.batch_number.is_empty());

    let stock = services
        .stock
        .get_stock(product.id, warehouse.id)
        .await
        .unwrap()
        .expect("stock row should exist");
    assert_eq!(stock.quantity_on_hand, dec!(120));
    assert_eq!(stock.status, "FULL");
}

#[tokio::test]
async fn deleting_the_last_batch_removes_the_aggregate_row() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Oolong").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let batch = common::create_batch(&db, &product, &warehouse, "A", dec!(7), 1, None).await;
    services
        .stock
        .recalculate(product.id, warehouse.id)
        .await
        .unwrap();

    services.batches.delete_batch(batch.id).await.unwrap();

    assert!(BatchEntity::find_by_id(batch.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .is_none());
    // Absence of a stock row is equivalent to zero stock
    assert!(services
        .stock
        .get_stock(product.id, warehouse.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn rejects_non_positive_batch_quantities() {
    let (db, services) = common::setup().await;
    let product = common::create_product(&db, "Matcha").await;
    let warehouse = common::create_warehouse(&db, "main").await;

    let result = services
        .batches
        .receive_batch(NewBatch {
            product_id: product.id,
            warehouse_id: warehouse.id,
            batch_number: None,
            quantity: dec!(0),
            manufacture_date: None,
            expiry_date: None,
        })
        .await;
    assert!(result.is_err());
}
