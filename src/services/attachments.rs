use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::attachment::{self, AttachmentKind, OwnerKind, OwnerRef};
use crate::entities::soft_delete::{self, SoftDeletable};
use crate::entities::{
    branch, category, company, product, return_entity, transaction, user_profile,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Validate)]
pub struct AttachRequest {
    pub owner: OwnerRef,

    #[validate(length(min = 1, max = 255, message = "Original name must be between 1 and 255 characters"))]
    pub original_name: String,

    #[validate(length(min = 1, max = 500, message = "Storage path must be between 1 and 500 characters"))]
    pub storage_path: String,

    /// Explicit kind; inferred from the file extension when absent.
    pub kind: Option<AttachmentKind>,
}

/// Service for polymorphic file attachments. Only metadata is handled
/// here; file bytes belong to the storage collaborator.
#[derive(Clone)]
pub struct AttachmentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl AttachmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send attachment event");
            }
        }
    }

    /// Links a stored file to its owning entity.
    #[instrument(skip(self, request), fields(owner_kind = %request.owner.kind.as_str(), owner_id = %request.owner.id))]
    pub async fn attach(
        &self,
        request: AttachRequest,
    ) -> Result<attachment::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        ensure_owner_exists(db, request.owner).await?;

        let extension = extension_of(&request.original_name);
        let kind = request
            .kind
            .unwrap_or_else(|| AttachmentKind::from_extension(&extension));

        let now = Utc::now();
        let id = Uuid::new_v4();
        let token = Uuid::new_v4();

        let saved = attachment::ActiveModel {
            id: Set(id),
            token: Set(token),
            original_name: Set(request.original_name),
            storage_path: Set(request.storage_path),
            extension: Set(extension),
            kind: Set(kind),
            owner_kind: Set(request.owner.kind),
            owner_id: Set(request.owner.id),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(attachment_id = %id, token = %token, "Attachment linked");
        self.emit(Event::AttachmentLinked {
            attachment_id: id,
            owner: request.owner.kind.as_str().to_string(),
            owner_id: request.owner.id,
        })
        .await;

        Ok(saved)
    }

    /// Looks an attachment up by its public token.
    #[instrument(skip(self))]
    pub async fn find_by_token(&self, token: Uuid) -> Result<attachment::Model, ServiceError> {
        let db = &*self.db_pool;

        attachment::Entity::find_active()
            .filter(attachment::Column::Token.eq(token))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("attachment with token {}", token)))
    }

    /// Lists the attachments owned by one entity, newest first.
    #[instrument(skip(self), fields(owner_kind = %owner.kind.as_str(), owner_id = %owner.id))]
    pub async fn list_for(
        &self,
        owner: OwnerRef,
        include_deleted: bool,
    ) -> Result<Vec<attachment::Model>, ServiceError> {
        let db = &*self.db_pool;

        let models = attachment::Entity::find_scoped(include_deleted)
            .filter(attachment::Column::OwnerKind.eq(owner.kind))
            .filter(attachment::Column::OwnerId.eq(owner.id))
            .order_by_desc(attachment::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(models)
    }

    #[instrument(skip(self))]
    pub async fn soft_delete(&self, attachment_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let deleted =
            soft_delete::soft_delete_by_id::<attachment::Entity, _>(db, attachment_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!(
                "attachment {}",
                attachment_id
            )));
        }

        self.emit(Event::EntitySoftDeleted {
            entity: "attachment".to_string(),
            id: attachment_id,
        })
        .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, attachment_id: Uuid) -> Result<attachment::Model, ServiceError> {
        let db = &*self.db_pool;

        let restored =
            soft_delete::restore_by_id::<attachment::Entity, _>(db, attachment_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!(
                "attachment {}",
                attachment_id
            )));
        }

        let model = attachment::Entity::find_by_id_scoped(attachment_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("attachment {}", attachment_id)))?;

        self.emit(Event::EntityRestored {
            entity: "attachment".to_string(),
            id: attachment_id,
        })
        .await;

        Ok(model)
    }
}

/// Soft-deletes every active attachment of an owner. Owning services call
/// this on their delete paths; the storage engine itself never cascades.
pub(crate) async fn detach_owner<C>(db: &C, owner: OwnerRef) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let result = attachment::Entity::update_many()
        .col_expr(
            attachment::Column::DeletedAt,
            Expr::value(Some(Utc::now())),
        )
        .filter(attachment::Column::OwnerKind.eq(owner.kind))
        .filter(attachment::Column::OwnerId.eq(owner.id))
        .filter(attachment::Column::DeletedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Resolves the owner through the explicit registry: one arm per owner
/// kind, each checking the matching table for an active row.
pub(crate) async fn ensure_owner_exists<C>(db: &C, owner: OwnerRef) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let exists = match owner.kind {
        OwnerKind::Company => soft_delete::exists_active::<company::Entity, _>(db, owner.id).await?,
        OwnerKind::Branch => soft_delete::exists_active::<branch::Entity, _>(db, owner.id).await?,
        OwnerKind::UserProfile => {
            soft_delete::exists_active::<user_profile::Entity, _>(db, owner.id).await?
        }
        OwnerKind::Product => soft_delete::exists_active::<product::Entity, _>(db, owner.id).await?,
        OwnerKind::Category => {
            soft_delete::exists_active::<category::Entity, _>(db, owner.id).await?
        }
        OwnerKind::Transaction => {
            soft_delete::exists_active::<transaction::Entity, _>(db, owner.id).await?
        }
        OwnerKind::Return => {
            soft_delete::exists_active::<return_entity::Entity, _>(db, owner.id).await?
        }
    };

    if exists {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "{} {}",
            owner.kind.as_str(),
            owner.id
        )))
    }
}

fn extension_of(original_name: &str) -> String {
    original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_of_takes_last_segment() {
        assert_eq!(extension_of("report.final.PDF"), "pdf");
        assert_eq!(extension_of("no-extension"), "");
        assert_eq!(extension_of("trailing-dot."), "");
    }
}
