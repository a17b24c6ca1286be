use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::soft_delete::SoftDeletable;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ProductStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Discontinued")]
    Discontinued,
    #[sea_orm(string_value = "OutOfStock")]
    OutOfStock,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "Active",
            ProductStatus::Inactive => "Inactive",
            ProductStatus::Discontinued => "Discontinued",
            ProductStatus::OutOfStock => "OutOfStock",
        }
    }

    /// Whether new transaction lines may reference the product.
    /// OutOfStock products stay sellable on paper; stock availability is
    /// checked at finalize time.
    pub fn is_tradable(&self) -> bool {
        matches!(self, ProductStatus::Active | ProductStatus::OutOfStock)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Optional SKU.
    pub code: Option<String>,

    #[validate(length(min = 1, max = 150, message = "Product name must be between 1 and 150 characters"))]
    pub name: String,

    pub description: Option<String>,

    /// On-hand quantity. Never negative; mutated only through
    /// `CatalogService::adjust_stock` and the ledger's finalize/void paths.
    pub stock: Decimal,

    /// Reorder threshold.
    pub min_stock: Decimal,

    /// Flexible attribute map (color, size, brand, ...).
    pub attributes: Option<Json>,

    pub status: ProductStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_below_minimum(&self) -> bool {
        self.stock < self.min_stock
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_category::Entity")]
    ProductCategories,
    #[sea_orm(has_many = "super::transaction_line::Entity")]
    TransactionLines,
}

impl Related<super::product_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCategories.def()
    }
}

impl Related<super::transaction_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionLines.def()
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
