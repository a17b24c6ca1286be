use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TransactionKind;
use super::soft_delete::SoftDeletable;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ReturnStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Processed")]
    Processed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "Pending",
            ReturnStatus::Processed => "Processed",
            ReturnStatus::Cancelled => "Cancelled",
            ReturnStatus::Rejected => "Rejected",
        }
    }

    /// Pending and Processed returns hold quantity against their line;
    /// Cancelled and Rejected release it.
    pub fn holds_quantity(&self) -> bool {
        matches!(self, ReturnStatus::Pending | ReturnStatus::Processed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ReturnReason {
    #[sea_orm(string_value = "Defective")]
    Defective,
    #[sea_orm(string_value = "WrongItem")]
    WrongItem,
    #[sea_orm(string_value = "Expired")]
    Expired,
    #[sea_orm(string_value = "CustomerChange")]
    CustomerChange,
    #[sea_orm(string_value = "Warranty")]
    Warranty,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// A return against one specific transaction line. The line is protected
/// while any return references it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub branch_id: Uuid,

    /// Human-readable number, unique per branch.
    pub number: String,

    pub reason: ReturnReason,
    pub transaction_line_id: Uuid,

    /// Mirrors the original transaction's kind.
    pub kind: TransactionKind,

    pub quantity_returned: Decimal,

    /// Historical sale price * quantity, settled when the return is
    /// processed; zero while pending.
    pub refund_amount: Decimal,

    pub status: ReturnStatus,
    pub notes: Option<String>,

    /// Processing employee.
    pub employee_id: Uuid,

    pub recorded_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction_line::Entity",
        from = "Column::TransactionLineId",
        to = "super::transaction_line::Column::Id"
    )]
    TransactionLine,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
}

impl Related<super::transaction_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionLine.def()
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
