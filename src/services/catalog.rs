//! Read-only access to the product/warehouse reference catalog.
//!
//! Catalog entities are owned elsewhere and are effectively immutable here;
//! these lookups only resolve ids for validation and message formatting.

use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{
    entities::{
        product::{self, Entity as ProductEntity},
        warehouse::{self, Entity as WarehouseEntity},
    },
    errors::ServiceError,
};

pub(crate) async fn product_by_id<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<product::Model, ServiceError> {
    ProductEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
}

pub(crate) async fn warehouse_by_id<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<warehouse::Model, ServiceError> {
    WarehouseEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", id)))
}
