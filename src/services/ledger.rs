use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::attachment::{OwnerKind, OwnerRef};
use crate::entities::enums::TransactionKind;
use crate::entities::soft_delete::{self, SoftDeletable};
use crate::entities::transaction::{self, PaymentMethod, TransactionStatus};
use crate::entities::{branch, product, return_entity, transaction_line, user_profile};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::attachments;
use crate::services::catalog::apply_stock_delta;
use crate::services::pricing::PricingPolicy;

#[derive(Debug, Validate)]
pub struct OpenTransactionRequest {
    pub kind: TransactionKind,
    pub branch_id: Uuid,
    /// Customer for sales, supplier for purchases.
    pub party_id: Uuid,
    pub employee_id: Uuid,

    #[validate(length(min = 1, max = 80, message = "Invoice number must be between 1 and 80 characters"))]
    pub invoice_number: String,

    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct AddLineRequest {
    pub transaction_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub lot: Option<String>,
    pub expires_on: Option<chrono::NaiveDate>,
}

#[derive(Debug, Default)]
pub struct ListTransactionsQuery {
    pub branch_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub page: u64,
    pub limit: u64,
}

/// Service for the purchase/sale transaction lifecycle.
///
/// State machine: Draft -> InProgress -> Finalized, with Cancelled
/// reachable before finalization and Voided only after. Stock moves at
/// finalize time and is reversed by void, both atomically.
#[derive(Clone)]
pub struct LedgerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    pricing: Arc<dyn PricingPolicy>,
}

impl LedgerService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        pricing: Arc<dyn PricingPolicy>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            pricing,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send ledger event");
            }
        }
    }

    /// Opens a transaction in Draft state.
    #[instrument(skip(self, request), fields(invoice = %request.invoice_number, branch_id = %request.branch_id))]
    pub async fn open(
        &self,
        request: OpenTransactionRequest,
    ) -> Result<transaction::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        if !soft_delete::exists_active::<branch::Entity, _>(db, request.branch_id).await? {
            return Err(ServiceError::NotFound(format!(
                "branch {}",
                request.branch_id
            )));
        }
        if !soft_delete::exists_active::<user_profile::Entity, _>(db, request.party_id).await? {
            return Err(ServiceError::NotFound(format!(
                "party profile {}",
                request.party_id
            )));
        }
        if !soft_delete::exists_active::<user_profile::Entity, _>(db, request.employee_id).await? {
            return Err(ServiceError::NotFound(format!(
                "employee profile {}",
                request.employee_id
            )));
        }

        // (branch, invoice, kind) never repeats, soft-deleted rows included.
        let duplicate = transaction::Entity::find()
            .filter(transaction::Column::BranchId.eq(request.branch_id))
            .filter(transaction::Column::InvoiceNumber.eq(request.invoice_number.clone()))
            .filter(transaction::Column::Kind.eq(request.kind))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "{} invoice '{}' already exists for branch {}",
                request.kind.as_str(),
                request.invoice_number,
                request.branch_id
            )));
        }

        let (supplier_id, customer_id) = match request.kind {
            TransactionKind::Purchase => (Some(request.party_id), None),
            TransactionKind::Sale => (None, Some(request.party_id)),
        };

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = transaction::ActiveModel {
            id: Set(id),
            invoice_number: Set(request.invoice_number),
            branch_id: Set(request.branch_id),
            supplier_id: Set(supplier_id),
            customer_id: Set(customer_id),
            employee_id: Set(request.employee_id),
            recorded_at: Set(now),
            base_value: Set(Decimal::ZERO),
            discount: Set(Decimal::ZERO),
            total: Set(Decimal::ZERO),
            payment_method: Set(request.payment_method),
            status: Set(TransactionStatus::Draft),
            kind: Set(request.kind),
            notes: Set(request.notes),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(transaction_id = %id, "Transaction opened");
        self.emit(Event::TransactionOpened(id)).await;

        Ok(saved)
    }

    /// Adds a line while the transaction is Draft or InProgress. The sale
    /// price comes from the pricing policy; the running base value is
    /// recomputed from the committed lines.
    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id, product_id = %request.product_id))]
    pub async fn add_line(
        &self,
        request: AddLineRequest,
    ) -> Result<transaction_line::Model, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".to_string(),
            ));
        }
        if request.unit_cost < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "unit cost cannot be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let tx = self.load_transaction(&txn, request.transaction_id).await?;
        if !tx.status.accepts_lines() {
            return Err(ServiceError::InvalidState {
                entity: "transaction",
                id: tx.id,
                current: tx.status.as_str().to_string(),
                attempted: "add_line",
            });
        }

        let product = product::Entity::find_by_id_scoped(request.product_id, false)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", request.product_id)))?;
        if !product.status.is_tradable() {
            return Err(ServiceError::InvalidOperation(format!(
                "product {} is {}",
                product.id,
                product.status.as_str()
            )));
        }

        let quantity = request.quantity.round_dp(3);
        let unit_cost = request.unit_cost.round_dp(4);
        let sale_price = self
            .pricing
            .sale_price(&product, unit_cost, tx.kind)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let line_total = (quantity * sale_price)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let now = Utc::now();
        let line_id = Uuid::new_v4();

        let line = transaction_line::ActiveModel {
            id: Set(line_id),
            transaction_id: Set(tx.id),
            product_id: Set(product.id),
            lot: Set(request.lot),
            expires_on: Set(request.expires_on),
            quantity: Set(quantity),
            unit_cost: Set(unit_cost),
            sale_price: Set(sale_price),
            line_total: Set(line_total),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let base_value = self.sum_line_totals(&txn, tx.id).await?;

        let updated = transaction::Entity::update_many()
            .col_expr(transaction::Column::BaseValue, Expr::value(base_value))
            .col_expr(
                transaction::Column::Status,
                Expr::value(TransactionStatus::InProgress),
            )
            .col_expr(
                transaction::Column::Version,
                Expr::col(transaction::Column::Version).add(1),
            )
            .col_expr(transaction::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(transaction::Column::Id.eq(tx.id))
            .filter(transaction::Column::Version.eq(tx.version))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(tx.id));
        }

        txn.commit().await?;

        self.emit(Event::TransactionLineAdded {
            transaction_id: tx.id,
            line_id,
            product_id: product.id,
        })
        .await;

        Ok(line)
    }

    /// Sets the discount while the transaction still accepts changes.
    #[instrument(skip(self))]
    pub async fn set_discount(
        &self,
        transaction_id: Uuid,
        discount: Decimal,
    ) -> Result<transaction::Model, ServiceError> {
        if discount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discount cannot be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let tx = self.load_transaction(&txn, transaction_id).await?;
        if !tx.status.accepts_lines() {
            return Err(ServiceError::InvalidState {
                entity: "transaction",
                id: tx.id,
                current: tx.status.as_str().to_string(),
                attempted: "set_discount",
            });
        }

        let discount = discount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if discount > tx.base_value {
            return Err(ServiceError::InvalidOperation(format!(
                "discount {} exceeds base value {}",
                discount, tx.base_value
            )));
        }

        let updated = transaction::Entity::update_many()
            .col_expr(transaction::Column::Discount, Expr::value(discount))
            .col_expr(
                transaction::Column::Version,
                Expr::col(transaction::Column::Version).add(1),
            )
            .col_expr(
                transaction::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(transaction::Column::Id.eq(tx.id))
            .filter(transaction::Column::Version.eq(tx.version))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(tx.id));
        }

        txn.commit().await?;

        self.require_transaction(transaction_id).await
    }

    /// Finalizes the transaction: settles `total = base - discount`,
    /// applies every line's stock movement and transitions the state, all
    /// in one database transaction.
    #[instrument(skip(self))]
    pub async fn finalize(&self, transaction_id: Uuid) -> Result<transaction::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let tx = self.load_transaction(&txn, transaction_id).await?;
        if !tx.status.accepts_lines() {
            return Err(ServiceError::InvalidState {
                entity: "transaction",
                id: tx.id,
                current: tx.status.as_str().to_string(),
                attempted: "finalize",
            });
        }

        let lines = transaction_line::Entity::find_active()
            .filter(transaction_line::Column::TransactionId.eq(tx.id))
            .all(&txn)
            .await?;
        if lines.is_empty() {
            return Err(ServiceError::EmptyTransaction(tx.id));
        }

        let base_value: Decimal = lines.iter().map(|line| line.line_total).sum();
        let total = base_value - tx.discount;
        if total < Decimal::ZERO {
            return Err(ServiceError::InvalidOperation(format!(
                "discount {} exceeds base value {}",
                tx.discount, base_value
            )));
        }

        // Sales consume stock, purchases receive it. Any shortfall rolls
        // the whole finalize back.
        for line in &lines {
            let delta = match tx.kind {
                TransactionKind::Sale => -line.quantity,
                TransactionKind::Purchase => line.quantity,
            };
            apply_stock_delta(&txn, line.product_id, delta, false).await?;
        }

        let now = Utc::now();
        let updated = transaction::Entity::update_many()
            .col_expr(transaction::Column::BaseValue, Expr::value(base_value))
            .col_expr(transaction::Column::Total, Expr::value(total))
            .col_expr(
                transaction::Column::Status,
                Expr::value(TransactionStatus::Finalized),
            )
            .col_expr(
                transaction::Column::Version,
                Expr::col(transaction::Column::Version).add(1),
            )
            .col_expr(transaction::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(transaction::Column::Id.eq(tx.id))
            .filter(transaction::Column::Version.eq(tx.version))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(tx.id));
        }

        txn.commit().await?;

        info!(transaction_id = %tx.id, total = %total, "Transaction finalized");
        self.emit(Event::TransactionFinalized {
            transaction_id: tx.id,
            total,
        })
        .await;

        self.require_transaction(transaction_id).await
    }

    /// Cancels an unfinalized transaction. No stock effects.
    #[instrument(skip(self))]
    pub async fn cancel(&self, transaction_id: Uuid) -> Result<transaction::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let tx = self.load_transaction(&txn, transaction_id).await?;
        if !tx.status.accepts_lines() {
            return Err(ServiceError::InvalidState {
                entity: "transaction",
                id: tx.id,
                current: tx.status.as_str().to_string(),
                attempted: "cancel",
            });
        }

        self.transition(&txn, &tx, TransactionStatus::Cancelled)
            .await?;
        txn.commit().await?;

        self.emit(Event::TransactionCancelled(tx.id)).await;

        self.require_transaction(transaction_id).await
    }

    /// Voids a finalized transaction, reversing its stock movements.
    #[instrument(skip(self))]
    pub async fn void(&self, transaction_id: Uuid) -> Result<transaction::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let tx = self.load_transaction(&txn, transaction_id).await?;
        if tx.status != TransactionStatus::Finalized {
            return Err(ServiceError::InvalidState {
                entity: "transaction",
                id: tx.id,
                current: tx.status.as_str().to_string(),
                attempted: "void",
            });
        }

        let lines = transaction_line::Entity::find_active()
            .filter(transaction_line::Column::TransactionId.eq(tx.id))
            .all(&txn)
            .await?;

        for line in &lines {
            let delta = match tx.kind {
                TransactionKind::Sale => line.quantity,
                TransactionKind::Purchase => -line.quantity,
            };
            apply_stock_delta(&txn, line.product_id, delta, false).await?;
        }

        self.transition(&txn, &tx, TransactionStatus::Voided).await?;
        txn.commit().await?;

        info!(transaction_id = %tx.id, "Transaction voided");
        self.emit(Event::TransactionVoided(tx.id)).await;

        self.require_transaction(transaction_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(
        &self,
        transaction_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<transaction::Model>, ServiceError> {
        let db = &*self.db_pool;
        let model = transaction::Entity::find_by_id_scoped(transaction_id, include_deleted)
            .one(db)
            .await?;
        Ok(model)
    }

    /// Active lines of a transaction in insertion order.
    #[instrument(skip(self))]
    pub async fn get_lines(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<transaction_line::Model>, ServiceError> {
        let db = &*self.db_pool;
        let lines = transaction_line::Entity::find_active()
            .filter(transaction_line::Column::TransactionId.eq(transaction_id))
            .order_by_asc(transaction_line::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(lines)
    }

    /// Lists transactions with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        query: ListTransactionsQuery,
    ) -> Result<(Vec<transaction::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let page = query.page.max(1);
        let limit = query.limit.max(1);

        let mut select = transaction::Entity::find_active();
        if let Some(branch_id) = query.branch_id {
            select = select.filter(transaction::Column::BranchId.eq(branch_id));
        }
        if let Some(kind) = query.kind {
            select = select.filter(transaction::Column::Kind.eq(kind));
        }

        let paginator = select
            .order_by_desc(transaction::Column::RecordedAt)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let transactions = paginator.fetch_page(page - 1).await?;

        Ok((transactions, total))
    }

    /// Soft-deletes a transaction together with its lines. Blocked while
    /// any return references one of the lines.
    #[instrument(skip(self))]
    pub async fn soft_delete_transaction(&self, transaction_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let tx = self.load_transaction(&txn, transaction_id).await?;

        let line_ids: Vec<Uuid> = transaction_line::Entity::find_active()
            .filter(transaction_line::Column::TransactionId.eq(tx.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|line| line.id)
            .collect();

        if !line_ids.is_empty() {
            let referencing_returns = return_entity::Entity::find_active()
                .filter(return_entity::Column::TransactionLineId.is_in(line_ids.clone()))
                .count(&txn)
                .await?;
            if referencing_returns > 0 {
                return Err(ServiceError::ReferentialIntegrity(format!(
                    "transaction {} has {} return(s) against its lines",
                    tx.id, referencing_returns
                )));
            }
        }

        let now = Utc::now();
        transaction_line::Entity::update_many()
            .col_expr(transaction_line::Column::DeletedAt, Expr::value(Some(now)))
            .filter(transaction_line::Column::TransactionId.eq(tx.id))
            .filter(transaction_line::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        soft_delete::soft_delete_by_id::<transaction::Entity, _>(&txn, tx.id).await?;
        attachments::detach_owner(&txn, OwnerRef::new(OwnerKind::Transaction, tx.id)).await?;

        txn.commit().await?;

        info!(transaction_id = %tx.id, "Transaction soft-deleted");
        self.emit(Event::EntitySoftDeleted {
            entity: "transaction".to_string(),
            id: tx.id,
        })
        .await;

        Ok(())
    }

    /// Restores a soft-deleted transaction and its lines.
    #[instrument(skip(self))]
    pub async fn restore_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<transaction::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let restored =
            soft_delete::restore_by_id::<transaction::Entity, _>(&txn, transaction_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!(
                "transaction {}",
                transaction_id
            )));
        }

        transaction_line::Entity::update_many()
            .col_expr(
                transaction_line::Column::DeletedAt,
                Expr::value(Option::<chrono::DateTime<Utc>>::None),
            )
            .filter(transaction_line::Column::TransactionId.eq(transaction_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        self.emit(Event::EntityRestored {
            entity: "transaction".to_string(),
            id: transaction_id,
        })
        .await;

        self.require_transaction(transaction_id).await
    }

    async fn load_transaction(
        &self,
        txn: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> Result<transaction::Model, ServiceError> {
        transaction::Entity::find_by_id_scoped(transaction_id, false)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", transaction_id)))
    }

    async fn require_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<transaction::Model, ServiceError> {
        let db = &*self.db_pool;
        transaction::Entity::find_by_id_scoped(transaction_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", transaction_id)))
    }

    async fn sum_line_totals(
        &self,
        txn: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let lines = transaction_line::Entity::find_active()
            .filter(transaction_line::Column::TransactionId.eq(transaction_id))
            .all(txn)
            .await?;
        Ok(lines.iter().map(|line| line.line_total).sum())
    }

    /// Version-checked state transition; a concurrent writer loses here.
    async fn transition(
        &self,
        txn: &DatabaseTransaction,
        tx: &transaction::Model,
        next: TransactionStatus,
    ) -> Result<(), ServiceError> {
        let updated = transaction::Entity::update_many()
            .col_expr(transaction::Column::Status, Expr::value(next))
            .col_expr(
                transaction::Column::Version,
                Expr::col(transaction::Column::Version).add(1),
            )
            .col_expr(
                transaction::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(transaction::Column::Id.eq(tx.id))
            .filter(transaction::Column::Version.eq(tx.version))
            .exec(txn)
            .await?;

        if updated.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(tx.id));
        }
        Ok(())
    }
}
