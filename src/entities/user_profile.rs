use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::enums::{BusinessRole, DocumentKind, Gender, ProfileStatus};
use super::soft_delete::SoftDeletable;

/// Business profile for any party the ledger references: employees,
/// customers and suppliers are all profiles with different roles.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub employee_code: Option<String>,
    pub document_kind: DocumentKind,

    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 15, message = "Document must be between 1 and 15 characters"))]
    pub document: String,

    #[validate(length(min = 1, max = 80))]
    pub first_names: String,
    #[validate(length(min = 1, max = 80))]
    pub last_names: String,

    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub corporate_email: Option<String>,

    pub address: Option<String>,
    pub municipality_id: Option<Uuid>,
    pub birth_date: Option<Date>,
    pub gender: Gender,
    pub business_role: BusinessRole,

    pub hired_on: Option<Date>,
    pub terminated_on: Option<Date>,
    pub salary: Option<Decimal>,

    /// Home branch for employees; detached when the branch is deleted.
    pub branch_id: Option<Uuid>,

    pub status: ProfileStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_names)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::municipality::Entity",
        from = "Column::MunicipalityId",
        to = "super::municipality::Column::Id"
    )]
    Municipality,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn full_name_joins_name_parts() {
        let profile = Model {
            id: Uuid::new_v4(),
            employee_code: None,
            document_kind: DocumentKind::Cc,
            document: "1015404888".to_string(),
            first_names: "Ana Maria".to_string(),
            last_names: "Rojas".to_string(),
            phone: None,
            corporate_email: None,
            address: None,
            municipality_id: None,
            birth_date: None,
            gender: Gender::Female,
            business_role: BusinessRole::Seller,
            hired_on: None,
            terminated_on: None,
            salary: None,
            branch_id: None,
            status: ProfileStatus::Active,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        };

        assert_eq!(profile.full_name(), "Ana Maria Rojas");
    }
}
