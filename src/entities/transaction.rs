use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::enums::TransactionKind;
use super::soft_delete::SoftDeletable;

/// Lifecycle of a transaction. Draft and InProgress accept lines;
/// Cancelled is reachable before finalization, Voided only after.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "InProgress")]
    InProgress,
    #[sea_orm(string_value = "Finalized")]
    Finalized,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Voided")]
    Voided,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Draft => "Draft",
            TransactionStatus::InProgress => "InProgress",
            TransactionStatus::Finalized => "Finalized",
            TransactionStatus::Cancelled => "Cancelled",
            TransactionStatus::Voided => "Voided",
        }
    }

    pub fn accepts_lines(&self) -> bool {
        matches!(self, TransactionStatus::Draft | TransactionStatus::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "Cash")]
    Cash,
    #[sea_orm(string_value = "Card")]
    Card,
    #[sea_orm(string_value = "Transfer")]
    Transfer,
    #[sea_orm(string_value = "Credit")]
    Credit,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// A purchase or sale header. (branch, invoice_number, kind) is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 80, message = "Invoice number must be between 1 and 80 characters"))]
    pub invoice_number: String,

    pub branch_id: Uuid,

    /// Counterpart for purchases. Exactly one of supplier/customer is set,
    /// matching `kind`.
    pub supplier_id: Option<Uuid>,
    /// Counterpart for sales.
    pub customer_id: Option<Uuid>,

    /// Recording employee.
    pub employee_id: Uuid,

    /// Set once at open time, immutable afterwards.
    pub recorded_at: DateTime<Utc>,

    /// Sum of line totals, recomputed as lines are added.
    pub base_value: Decimal,
    pub discount: Decimal,
    /// `base_value - discount`, settled at finalize time.
    pub total: Decimal,

    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub kind: TransactionKind,

    pub notes: Option<String>,

    /// Optimistic lock; bumped on every state transition.
    pub version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Party the transaction settles against: supplier for purchases,
    /// customer for sales.
    pub fn party_id(&self) -> Option<Uuid> {
        match self.kind {
            TransactionKind::Purchase => self.supplier_id,
            TransactionKind::Sale => self.customer_id,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
    #[sea_orm(has_many = "super::transaction_line::Entity")]
    Lines,
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl Related<super::transaction_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
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
