use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::soft_delete::SoftDeletable;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AttachmentKind {
    #[sea_orm(string_value = "Image")]
    Image,
    #[sea_orm(string_value = "Document")]
    Document,
    #[sea_orm(string_value = "Video")]
    Video,
    #[sea_orm(string_value = "Audio")]
    Audio,
    #[sea_orm(string_value = "Other")]
    Other,
}

impl AttachmentKind {
    /// Best-effort classification from a file extension.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "bmp" => AttachmentKind::Image,
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "txt" | "csv" | "odt" => {
                AttachmentKind::Document
            }
            "mp4" | "mov" | "avi" | "mkv" | "webm" => AttachmentKind::Video,
            "mp3" | "wav" | "ogg" | "flac" | "aac" => AttachmentKind::Audio,
            _ => AttachmentKind::Other,
        }
    }
}

/// Which entity table an attachment's owner lives in. Owner resolution
/// goes through an explicit match on this tag, never runtime type lookup.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OwnerKind {
    #[sea_orm(string_value = "Company")]
    Company,
    #[sea_orm(string_value = "Branch")]
    Branch,
    #[sea_orm(string_value = "UserProfile")]
    UserProfile,
    #[sea_orm(string_value = "Product")]
    Product,
    #[sea_orm(string_value = "Category")]
    Category,
    #[sea_orm(string_value = "Transaction")]
    Transaction,
    #[sea_orm(string_value = "Return")]
    Return,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Company => "Company",
            OwnerKind::Branch => "Branch",
            OwnerKind::UserProfile => "UserProfile",
            OwnerKind::Product => "Product",
            OwnerKind::Category => "Category",
            OwnerKind::Transaction => "Transaction",
            OwnerKind::Return => "Return",
        }
    }
}

/// Discriminated owner reference for polymorphic attachments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub id: Uuid,
}

impl OwnerRef {
    pub fn new(kind: OwnerKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Polymorphic file attachment. Stored independently of its owner; the
/// owner's delete path cascades attachments explicitly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Opaque public handle, generated at attach time.
    #[sea_orm(unique)]
    pub token: Uuid,

    pub original_name: String,
    pub storage_path: String,
    pub extension: String,
    pub kind: AttachmentKind,

    pub owner_kind: OwnerKind,
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

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
    use test_case::test_case;

    #[test_case("jpg", AttachmentKind::Image)]
    #[test_case("PDF", AttachmentKind::Document)]
    #[test_case("mkv", AttachmentKind::Video)]
    #[test_case("flac", AttachmentKind::Audio)]
    #[test_case("bin", AttachmentKind::Other)]
    #[test_case("", AttachmentKind::Other)]
    fn kind_from_extension(extension: &str, expected: AttachmentKind) {
        assert_eq!(AttachmentKind::from_extension(extension), expected);
    }
}
