use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::attachment::{OwnerKind, OwnerRef};
use crate::entities::enums::TransactionKind;
use crate::entities::return_entity::{self, ReturnReason, ReturnStatus};
use crate::entities::soft_delete::{self, SoftDeletable};
use crate::entities::transaction::{self, TransactionStatus};
use crate::entities::{transaction_line, user_profile};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::attachments;
use crate::services::catalog::apply_stock_delta;

#[derive(Debug)]
pub struct FileReturnRequest {
    pub transaction_line_id: Uuid,
    pub quantity: Decimal,
    pub reason: ReturnReason,
    pub employee_id: Uuid,
    pub notes: Option<String>,
    /// Explicit return number; generated per branch when absent.
    pub number: Option<String>,
}

/// Service for returns against committed transaction lines.
///
/// A return holds quantity against its line from the moment it is filed;
/// rejecting or cancelling releases the hold, processing settles it with
/// a refund and an inverse stock movement.
#[derive(Clone)]
pub struct ReturnService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ReturnService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send return event");
            }
        }
    }

    /// Files a return in Pending state. The owning transaction must be
    /// Finalized and the quantity must fit what the line can still return.
    #[instrument(skip(self, request), fields(line_id = %request.transaction_line_id))]
    pub async fn file_return(
        &self,
        request: FileReturnRequest,
    ) -> Result<return_entity::Model, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "returned quantity must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let line = transaction_line::Entity::find_by_id_scoped(request.transaction_line_id, false)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "transaction line {}",
                    request.transaction_line_id
                ))
            })?;

        let tx = transaction::Entity::find_by_id_scoped(line.transaction_id, false)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("transaction {}", line.transaction_id))
            })?;
        if tx.status != TransactionStatus::Finalized {
            return Err(ServiceError::InvalidLineState(format!(
                "line {} belongs to transaction {} in state {}; only Finalized transactions accept returns",
                line.id,
                tx.id,
                tx.status.as_str()
            )));
        }

        if !soft_delete::exists_active::<user_profile::Entity, _>(&txn, request.employee_id).await?
        {
            return Err(ServiceError::NotFound(format!(
                "employee profile {}",
                request.employee_id
            )));
        }

        let quantity = request.quantity.round_dp(3);
        let already_returned = self.quantity_held(&txn, line.id).await?;
        let remaining = line.quantity - already_returned;
        if quantity > remaining {
            return Err(ServiceError::OverReturn {
                line_id: line.id,
                remaining,
                requested: quantity,
            });
        }

        let number = match request.number {
            Some(number) => {
                let duplicate = return_entity::Entity::find()
                    .filter(return_entity::Column::BranchId.eq(tx.branch_id))
                    .filter(return_entity::Column::Number.eq(number.clone()))
                    .count(&txn)
                    .await?;
                if duplicate > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "return number '{}' already exists for branch {}",
                        number, tx.branch_id
                    )));
                }
                number
            }
            None => self.next_number(&txn, tx.branch_id).await?,
        };

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = return_entity::ActiveModel {
            id: Set(id),
            branch_id: Set(tx.branch_id),
            number: Set(number),
            reason: Set(request.reason),
            transaction_line_id: Set(line.id),
            kind: Set(tx.kind),
            quantity_returned: Set(quantity),
            refund_amount: Set(Decimal::ZERO),
            status: Set(ReturnStatus::Pending),
            notes: Set(request.notes),
            employee_id: Set(request.employee_id),
            recorded_at: Set(now),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(return_id = %id, line_id = %line.id, "Return filed");
        self.emit(Event::ReturnFiled {
            return_id: id,
            transaction_line_id: line.id,
            quantity,
        })
        .await;

        Ok(saved)
    }

    /// Processes a pending return: settles the refund from the line's
    /// historical sale price and applies the inverse stock movement.
    #[instrument(skip(self))]
    pub async fn process(&self, return_id: Uuid) -> Result<return_entity::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let ret = self.load_pending(&txn, return_id, "process").await?;

        let line = transaction_line::Entity::find_by_id_scoped(ret.transaction_line_id, false)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("transaction line {}", ret.transaction_line_id))
            })?;

        // Historical price, not the product's current price.
        let refund = (line.sale_price * ret.quantity_returned)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        // A sale return brings stock back in; a purchase return sends it
        // back out and can fail on shortfall, rolling everything back.
        let delta = match ret.kind {
            TransactionKind::Sale => ret.quantity_returned,
            TransactionKind::Purchase => -ret.quantity_returned,
        };
        apply_stock_delta(&txn, line.product_id, delta, false).await?;

        let now = Utc::now();
        let mut active: return_entity::ActiveModel = ret.into();
        active.status = Set(ReturnStatus::Processed);
        active.refund_amount = Set(refund);
        active.updated_at = Set(Some(now));
        let saved = active.update(&txn).await?;

        txn.commit().await?;

        info!(return_id = %return_id, refund = %refund, "Return processed");
        self.emit(Event::ReturnProcessed {
            return_id,
            refund_amount: refund,
            timestamp: now,
        })
        .await;

        Ok(saved)
    }

    /// Rejects a pending return. No stock effect.
    #[instrument(skip(self))]
    pub async fn reject(&self, return_id: Uuid) -> Result<return_entity::Model, ServiceError> {
        let saved = self.close_pending(return_id, ReturnStatus::Rejected, "reject").await?;
        self.emit(Event::ReturnRejected(return_id)).await;
        Ok(saved)
    }

    /// Cancels a pending return. No stock effect.
    #[instrument(skip(self))]
    pub async fn cancel(&self, return_id: Uuid) -> Result<return_entity::Model, ServiceError> {
        let saved = self.close_pending(return_id, ReturnStatus::Cancelled, "cancel").await?;
        self.emit(Event::ReturnCancelled(return_id)).await;
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_return(
        &self,
        return_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<return_entity::Model>, ServiceError> {
        let db = &*self.db_pool;
        let model = return_entity::Entity::find_by_id_scoped(return_id, include_deleted)
            .one(db)
            .await?;
        Ok(model)
    }

    /// Lists returns with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_returns(
        &self,
        branch_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<return_entity::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut select = return_entity::Entity::find_active();
        if let Some(branch_id) = branch_id {
            select = select.filter(return_entity::Column::BranchId.eq(branch_id));
        }

        let paginator = select
            .order_by_desc(return_entity::Column::RecordedAt)
            .paginate(db, limit.max(1));

        let total = paginator.num_items().await?;
        let returns = paginator.fetch_page(page - 1).await?;

        Ok((returns, total))
    }

    /// Soft-deletes a return. A deleted Pending return releases its hold
    /// on the line.
    #[instrument(skip(self))]
    pub async fn soft_delete_return(&self, return_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let deleted =
            soft_delete::soft_delete_by_id::<return_entity::Entity, _>(&txn, return_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("return {}", return_id)));
        }

        attachments::detach_owner(&txn, OwnerRef::new(OwnerKind::Return, return_id)).await?;
        txn.commit().await?;

        self.emit(Event::EntitySoftDeleted {
            entity: "return".to_string(),
            id: return_id,
        })
        .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore_return(
        &self,
        return_id: Uuid,
    ) -> Result<return_entity::Model, ServiceError> {
        let db = &*self.db_pool;

        let restored =
            soft_delete::restore_by_id::<return_entity::Entity, _>(db, return_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!("return {}", return_id)));
        }

        let model = return_entity::Entity::find_by_id_scoped(return_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("return {}", return_id)))?;

        self.emit(Event::EntityRestored {
            entity: "return".to_string(),
            id: return_id,
        })
        .await;

        Ok(model)
    }

    /// Quantity already held against a line by Pending and Processed
    /// returns.
    async fn quantity_held(
        &self,
        txn: &DatabaseTransaction,
        line_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let returns = return_entity::Entity::find_active()
            .filter(return_entity::Column::TransactionLineId.eq(line_id))
            .filter(return_entity::Column::Status.is_in([
                ReturnStatus::Pending,
                ReturnStatus::Processed,
            ]))
            .all(txn)
            .await?;

        Ok(returns.iter().map(|r| r.quantity_returned).sum())
    }

    /// Next sequential return number for a branch. The unique index on
    /// (branch, number) backstops races between concurrent filers.
    async fn next_number(
        &self,
        txn: &DatabaseTransaction,
        branch_id: Uuid,
    ) -> Result<String, ServiceError> {
        let existing = return_entity::Entity::find()
            .filter(return_entity::Column::BranchId.eq(branch_id))
            .count(txn)
            .await?;

        let mut sequence = existing + 1;
        loop {
            let candidate = format!("R-{:05}", sequence);
            let taken = return_entity::Entity::find()
                .filter(return_entity::Column::BranchId.eq(branch_id))
                .filter(return_entity::Column::Number.eq(candidate.clone()))
                .count(txn)
                .await?;
            if taken == 0 {
                return Ok(candidate);
            }
            sequence += 1;
        }
    }

    async fn load_pending(
        &self,
        txn: &DatabaseTransaction,
        return_id: Uuid,
        attempted: &'static str,
    ) -> Result<return_entity::Model, ServiceError> {
        let ret = return_entity::Entity::find_by_id_scoped(return_id, false)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("return {}", return_id)))?;

        if ret.status != ReturnStatus::Pending {
            return Err(ServiceError::InvalidState {
                entity: "return",
                id: ret.id,
                current: ret.status.as_str().to_string(),
                attempted,
            });
        }

        Ok(ret)
    }

    async fn close_pending(
        &self,
        return_id: Uuid,
        next: ReturnStatus,
        attempted: &'static str,
    ) -> Result<return_entity::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let ret = self.load_pending(&txn, return_id, attempted).await?;

        let mut active: return_entity::ActiveModel = ret.into();
        active.status = Set(next);
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(&txn).await?;

        txn.commit().await?;

        Ok(saved)
    }
}
