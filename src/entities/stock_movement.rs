use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of one inventory transaction. Corrections are made with a
/// new ADJUSTMENT movement or by deletion-with-reversal, never by editing.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,
    pub movement_type: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_quantity: Decimal,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_movement_batch::Entity")]
    Allocations,
}

impl Related<super::stock_movement_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> Option<MovementKind> {
        self.movement_type.parse().ok()
    }
}

/// Kind of inventory transaction.
///
/// ADJUSTMENT quantities are signed: a negative allocation quantity corrects
/// stock downwards, a positive one upwards.
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
pub enum MovementKind {
    In,
    Out,
    Adjustment,
    Return,
}

impl MovementKind {
    /// Sign applied to a batch quantity per allocated unit. OUT and RETURN
    /// remove stock from the batch; IN and ADJUSTMENT add (ADJUSTMENT carries
    /// its own sign in the allocation quantity).
    pub fn batch_sign(&self) -> Decimal {
        match self {
            MovementKind::Out | MovementKind::Return => Decimal::NEGATIVE_ONE,
            MovementKind::In | MovementKind::Adjustment => Decimal::ONE,
        }
    }

    /// Only ADJUSTMENT allocations may carry a negative quantity.
    pub fn allows_signed_quantity(&self) -> bool {
        matches!(self, MovementKind::Adjustment)
    }
}
