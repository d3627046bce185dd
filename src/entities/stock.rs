use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Denormalized per-(product, warehouse) total, derived from batch quantities.
/// Never edited directly; rewritten by the aggregator after every batch or
/// allocation mutation. A missing row means zero stock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_on_hand: Decimal,
    pub status: String,
    pub last_updated: DateTime<Utc>,
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

impl ActiveModelBehavior for ActiveModel {}

/// Qualitative stock level, a fixed function of quantity on hand.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    utoipa::ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Empty,
    AlmostOut,
    Good,
    Full,
}

impl StockStatus {
    /// Band thresholds: <= 0 empty, <= 10 almost out, <= 100 good, else full.
    pub fn for_quantity(quantity: Decimal) -> Self {
        if quantity <= Decimal::ZERO {
            StockStatus::Empty
        } else if quantity <= Decimal::TEN {
            StockStatus::AlmostOut
        } else if quantity <= Decimal::ONE_HUNDRED {
            StockStatus::Good
        } else {
            StockStatus::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(dec!(-5), StockStatus::Empty; "negative is empty")]
    #[test_case(dec!(0), StockStatus::Empty; "zero is empty")]
    #[test_case(dec!(0.01), StockStatus::AlmostOut; "just above zero")]
    #[test_case(dec!(10), StockStatus::AlmostOut; "almost out upper bound")]
    #[test_case(dec!(10.01), StockStatus::Good; "just above almost out")]
    #[test_case(dec!(100), StockStatus::Good; "good upper bound")]
    #[test_case(dec!(100.01), StockStatus::Full; "just above good")]
    fn status_band_boundaries(quantity: Decimal, expected: StockStatus) {
        assert_eq!(StockStatus::for_quantity(quantity), expected);
    }

    #[test]
    fn status_round_trips_wire_names() {
        for status in [
            StockStatus::Empty,
            StockStatus::AlmostOut,
            StockStatus::Good,
            StockStatus::Full,
        ] {
            let name = status.to_string();
            assert_eq!(name.parse::<StockStatus>().unwrap(), status);
        }
    }

    proptest! {
        /// The status bands are monotone in quantity.
        #[test]
        fn status_is_monotone(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo_status = StockStatus::for_quantity(Decimal::new(lo, 2));
            let hi_status = StockStatus::for_quantity(Decimal::new(hi, 2));
            prop_assert!(band_rank(lo_status) <= band_rank(hi_status));
        }
    }

    fn band_rank(status: StockStatus) -> u8 {
        match status {
            StockStatus::Empty => 0,
            StockStatus::AlmostOut => 1,
            StockStatus::Good => 2,
            StockStatus::Full => 3,
        }
    }
}
