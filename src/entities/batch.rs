use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lot of a product received into a warehouse. `quantity` is the remaining
/// quantity and is only ever changed through movement allocations; it stays
/// non-negative.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub batch_number: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(has_many = "super::stock_movement_batch::Entity")]
    Allocations,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::stock_movement_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Ordering applied when batches are selected automatically for a movement.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    utoipa::ToSchema,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RetrievalMethod {
    /// Oldest batch first (ascending creation time).
    #[default]
    Fifo,
    /// Newest batch first (descending creation time).
    Lifo,
    /// Earliest expiry first; batches without an expiry date are excluded.
    Fefo,
}

/// Batch numbers default to the first segment of a fresh UUID, uppercased.
pub fn generate_batch_number() -> String {
    Uuid::new_v4()
        .to_string()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn retrieval_method_round_trips_wire_names() {
        for (method, name) in [
            (RetrievalMethod::Fifo, "FIFO"),
            (RetrievalMethod::Lifo, "LIFO"),
            (RetrievalMethod::Fefo, "FEFO"),
        ] {
            assert_eq!(method.to_string(), name);
            assert_eq!(RetrievalMethod::from_str(name).unwrap(), method);
        }
    }

    #[test]
    fn retrieval_method_defaults_to_fifo() {
        assert_eq!(RetrievalMethod::default(), RetrievalMethod::Fifo);
    }

    #[test]
    fn generated_batch_numbers_are_short_and_uppercase() {
        let number = generate_batch_number();
        assert_eq!(number.len(), 8);
        assert_eq!(number, number.to_uppercase());
    }
}
