#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::{mpsc, OnceCell};
use uuid::Uuid;

use stockledger_api::{
    db::{establish_connection, run_migrations, DbPool},
    entities::{batch, product, warehouse},
    events::EventSender,
    handlers::AppServices,
};

static DB: OnceCell<Arc<DbPool>> = OnceCell::const_new();

/// One shared in-memory database per test binary; each test works against its
/// own product/warehouse fixtures so tests stay independent.
pub async fn setup() -> (Arc<DbPool>, AppServices) {
    let db = DB
        .get_or_init(|| async {
            let db = Arc::new(
                establish_connection("sqlite::memory:?cache=shared")
                    .await
                    .expect("Failed to create DB pool"),
            );
            run_migrations(db.as_ref())
                .await
                .expect("Failed to run migrations");
            db
        })
        .await
        .clone();

    let (tx, mut rx) = mpsc::channel(256);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    let services = AppServices::new(db.clone(), EventSender::new(tx));

    (db, services)
}

pub async fn create_product(db: &DbPool, name: &str) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(format!("SKU-{}", Uuid::new_v4())),
        name: Set(name.to_string()),
        category: Set(None),
        unit_of_measure: Set(Some("pieces".to_string())),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert product")
}

pub async fn create_warehouse(db: &DbPool, name: &str) -> warehouse::Model {
    warehouse::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{}-{}", name, Uuid::new_v4())),
        wh_type: Set(None),
        active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert warehouse")
}

/// Inserts a batch directly, with `age_minutes` controlling FIFO/LIFO order
/// (larger = older).
pub async fn create_batch(
    db: &DbPool,
    product: &product::Model,
    warehouse: &warehouse::Model,
    batch_number: &str,
    quantity: Decimal,
    age_minutes: i64,
    expiry_date: Option<NaiveDate>,
) -> batch::Model {
    batch::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        warehouse_id: Set(warehouse.id),
        batch_number: Set(batch_number.to_string()),
        quantity: Set(quantity),
        manufacture_date: Set(None),
        expiry_date: Set(expiry_date),
        created_at: Set(Utc::now() - Duration::minutes(age_minutes)),
    }
    .insert(db)
    .await
    .expect("Failed to insert batch")
}

pub fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}
