//! Enums shared by more than one entity. Entity-specific enums live next
//! to their entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// General lifecycle state used by directory and catalog records.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EntityStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
}

/// Whether a transaction moves stock out (sale) or in (purchase).
/// Returns mirror the kind of the transaction they reverse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionKind {
    #[sea_orm(string_value = "Sale")]
    Sale,
    #[sea_orm(string_value = "Purchase")]
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "Sale",
            TransactionKind::Purchase => "Purchase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Region {
    #[sea_orm(string_value = "Caribe")]
    Caribe,
    #[sea_orm(string_value = "CentroOriente")]
    CentroOriente,
    #[sea_orm(string_value = "CentroSur")]
    CentroSur,
    #[sea_orm(string_value = "EjeCafetero")]
    EjeCafetero,
    #[sea_orm(string_value = "Llano")]
    Llano,
    #[sea_orm(string_value = "Pacifico")]
    Pacifico,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DocumentKind {
    #[sea_orm(string_value = "Cc")]
    Cc,
    #[sea_orm(string_value = "Ce")]
    Ce,
    #[sea_orm(string_value = "Ti")]
    Ti,
    #[sea_orm(string_value = "Passport")]
    Passport,
    #[sea_orm(string_value = "Nit")]
    Nit,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Gender {
    #[sea_orm(string_value = "Female")]
    Female,
    #[sea_orm(string_value = "Male")]
    Male,
    #[sea_orm(string_value = "Other")]
    Other,
    #[sea_orm(string_value = "Unspecified")]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum BusinessRole {
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Manager")]
    Manager,
    #[sea_orm(string_value = "Seller")]
    Seller,
    #[sea_orm(string_value = "Warehouse")]
    Warehouse,
    #[sea_orm(string_value = "Accountant")]
    Accountant,
    #[sea_orm(string_value = "Customer")]
    Customer,
    #[sea_orm(string_value = "Supplier")]
    Supplier,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ProfileStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Suspended")]
    Suspended,
    #[sea_orm(string_value = "Terminated")]
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum CompanyKind {
    #[sea_orm(string_value = "Sas")]
    Sas,
    #[sea_orm(string_value = "Ltda")]
    Ltda,
    #[sea_orm(string_value = "SoleProprietor")]
    SoleProprietor,
    #[sea_orm(string_value = "Other")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum BranchKind {
    #[sea_orm(string_value = "Main")]
    Main,
    #[sea_orm(string_value = "Satellite")]
    Satellite,
    #[sea_orm(string_value = "Warehouse")]
    Warehouse,
    #[sea_orm(string_value = "Virtual")]
    Virtual,
}
