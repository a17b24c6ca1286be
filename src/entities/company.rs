use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::enums::{CompanyKind, EntityStatus};
use super::soft_delete::SoftDeletable;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Full registered name.
    #[validate(length(min = 1, max = 150, message = "Company name must be between 1 and 150 characters"))]
    pub name: String,

    /// Tax identification number, digits only, no check digit.
    #[sea_orm(unique)]
    pub tax_id: i64,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub kind: CompanyKind,
    pub status: EntityStatus,

    /// Free-form metadata (original `metadatos` JSON column).
    pub metadata: Option<Json>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::branch::Entity")]
    Branches,
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branches.def()
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
