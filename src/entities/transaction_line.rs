use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::soft_delete::SoftDeletable;

/// One product row within a transaction. Lines are soft-deleted together
/// with their transaction; the referenced product is protected while any
/// line exists.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub transaction_id: Uuid,
    pub product_id: Uuid,

    /// Batch/lot code when the product is lot-tracked.
    pub lot: Option<String>,
    pub expires_on: Option<Date>,

    /// Positive, 3 decimal places.
    pub quantity: Decimal,
    /// 4 decimal places.
    pub unit_cost: Decimal,
    /// Output of the pricing policy at add time, 2 decimal places.
    pub sale_price: Decimal,
    /// quantity * sale_price, rounded to 2 decimal places at commit.
    pub line_total: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction::Entity",
        from = "Column::TransactionId",
        to = "super::transaction::Column::Id"
    )]
    Transaction,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::return_entity::Entity")]
    Returns,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDeletable for Entity {
    fn id_column() -> Self::Column {
        Column::Id
    }

    fn deleted_at_column() -> Self::Column {
        Column::DeletedAt
    }
}
