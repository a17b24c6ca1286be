use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::attachment::{OwnerKind, OwnerRef};
use crate::entities::enums::EntityStatus;
use crate::entities::product::{self, ProductStatus};
use crate::entities::soft_delete::{self, SoftDeletable};
use crate::entities::{category, product_category, transaction_line};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::attachments;

/// Ancestor-walk bound for the category forest. Pre-existing corrupt
/// cycles must terminate the walk, not hang it.
const MAX_CATEGORY_DEPTH: usize = 64;

#[derive(Debug, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Validate)]
pub struct CreateProductRequest {
    pub code: Option<String>,

    #[validate(length(min = 1, max = 150, message = "Product name must be between 1 and 150 characters"))]
    pub name: String,

    pub description: Option<String>,
    pub attributes: Option<JsonValue>,
    pub min_stock: Decimal,
    pub initial_stock: Decimal,
}

#[derive(Debug, Default)]
pub struct UpdateProductRequest {
    pub code: Option<Option<String>>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub attributes: Option<Option<JsonValue>>,
    pub min_stock: Option<Decimal>,
    pub status: Option<ProductStatus>,
}

/// Service for products, hierarchical categories and stock bookkeeping.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send catalog event");
            }
        }
    }

    // ---- Categories ----

    /// Creates a category, optionally under a parent.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        if let Some(parent_id) = request.parent_id {
            if !soft_delete::exists_active::<category::Entity, _>(db, parent_id).await? {
                return Err(ServiceError::NotFound(format!("category {}", parent_id)));
            }
        }

        // Name uniqueness spans soft-deleted rows; so does the index.
        let duplicate = category::Entity::find()
            .filter(category::Column::Name.eq(request.name.clone()))
            .filter(match request.parent_id {
                Some(parent_id) => category::Column::ParentId.eq(parent_id),
                None => category::Column::ParentId.is_null(),
            })
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::DuplicateName(format!(
                "category '{}' already exists under this parent",
                request.name
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = category::ActiveModel {
            id: Set(id),
            name: Set(request.name),
            description: Set(request.description),
            parent_id: Set(request.parent_id),
            status: Set(EntityStatus::Active),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(category_id = %id, "Category created");
        self.emit(Event::CategoryCreated(id)).await;

        Ok(saved)
    }

    /// Moves a category under a new parent (or to the root with `None`).
    /// Refuses to create a cycle.
    #[instrument(skip(self))]
    pub async fn reparent_category(
        &self,
        category_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<category::Model, ServiceError> {
        let db = &*self.db_pool;

        let category = category::Entity::find_by_id_scoped(category_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("category {}", category_id)))?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == category_id {
                return Err(ServiceError::InvalidOperation(
                    "a category cannot be its own parent".to_string(),
                ));
            }
            if !soft_delete::exists_active::<category::Entity, _>(db, parent_id).await? {
                return Err(ServiceError::NotFound(format!("category {}", parent_id)));
            }
            if self.is_descendant(db, parent_id, category_id).await? {
                return Err(ServiceError::InvalidOperation(format!(
                    "reparenting category {} under {} would create a cycle",
                    category_id, parent_id
                )));
            }
        }

        let duplicate = category::Entity::find()
            .filter(category::Column::Name.eq(category.name.clone()))
            .filter(match new_parent_id {
                Some(parent_id) => category::Column::ParentId.eq(parent_id),
                None => category::Column::ParentId.is_null(),
            })
            .filter(category::Column::Id.ne(category_id))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::DuplicateName(format!(
                "category '{}' already exists under the target parent",
                category.name
            )));
        }

        let mut active: category::ActiveModel = category.into();
        active.parent_id = Set(new_parent_id);
        active.updated_at = Set(Some(Utc::now()));
        let saved = active.update(db).await?;

        self.emit(Event::CategoryReparented {
            category_id,
            new_parent_id,
        })
        .await;

        Ok(saved)
    }

    /// Walks `candidate`'s ancestor chain looking for `ancestor`. Bounded
    /// by MAX_CATEGORY_DEPTH.
    async fn is_descendant<C>(
        &self,
        db: &C,
        candidate: Uuid,
        ancestor: Uuid,
    ) -> Result<bool, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut current = Some(candidate);
        for _ in 0..MAX_CATEGORY_DEPTH {
            let Some(current_id) = current else {
                return Ok(false);
            };
            if current_id == ancestor {
                return Ok(true);
            }
            current = category::Entity::find_by_id_scoped(current_id, true)
                .one(db)
                .await?
                .and_then(|c| c.parent_id);
        }
        warn!(candidate = %candidate, "Category ancestor walk hit the depth bound");
        Ok(false)
    }

    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        category_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<category::Model>, ServiceError> {
        let db = &*self.db_pool;
        let model = category::Entity::find_by_id_scoped(category_id, include_deleted)
            .one(db)
            .await?;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        include_deleted: bool,
    ) -> Result<Vec<category::Model>, ServiceError> {
        let db = &*self.db_pool;
        let models = category::Entity::find_scoped(include_deleted)
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?;
        Ok(models)
    }

    /// Soft-deletes a category. Children are detached to the root rather
    /// than cascaded; associations and attachments go with the category.
    #[instrument(skip(self))]
    pub async fn soft_delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let deleted =
            soft_delete::soft_delete_by_id::<category::Entity, _>(&txn, category_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("category {}", category_id)));
        }

        category::Entity::update_many()
            .col_expr(category::Column::ParentId, Expr::value(Option::<Uuid>::None))
            .col_expr(category::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(category::Column::ParentId.eq(category_id))
            .filter(category::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        product_category::Entity::update_many()
            .col_expr(
                product_category::Column::DeletedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(product_category::Column::CategoryId.eq(category_id))
            .filter(product_category::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        attachments::detach_owner(&txn, OwnerRef::new(OwnerKind::Category, category_id)).await?;

        txn.commit().await?;

        info!(category_id = %category_id, "Category soft-deleted");
        self.emit(Event::EntitySoftDeleted {
            entity: "category".to_string(),
            id: category_id,
        })
        .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore_category(
        &self,
        category_id: Uuid,
    ) -> Result<category::Model, ServiceError> {
        let db = &*self.db_pool;

        let restored = soft_delete::restore_by_id::<category::Entity, _>(db, category_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!("category {}", category_id)));
        }

        let model = category::Entity::find_by_id_scoped(category_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("category {}", category_id)))?;

        self.emit(Event::EntityRestored {
            entity: "category".to_string(),
            id: category_id,
        })
        .await;

        Ok(model)
    }

    // ---- Products ----

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        if request.initial_stock < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "initial stock cannot be negative".to_string(),
            ));
        }
        if request.min_stock < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "minimum stock cannot be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;

        if let Some(code) = &request.code {
            let duplicate = product::Entity::find()
                .filter(product::Column::Code.eq(code.clone()))
                .count(db)
                .await?;
            if duplicate > 0 {
                return Err(ServiceError::Conflict(format!(
                    "product code '{}' already exists",
                    code
                )));
            }
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = product::ActiveModel {
            id: Set(id),
            code: Set(request.code),
            name: Set(request.name),
            description: Set(request.description),
            stock: Set(request.initial_stock.round_dp(2)),
            min_stock: Set(request.min_stock.round_dp(2)),
            attributes: Set(request.attributes),
            status: Set(ProductStatus::Active),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(product_id = %id, "Product created");
        self.emit(Event::ProductCreated(id)).await;

        Ok(saved)
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;

        let existing = product::Entity::find_by_id_scoped(product_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

        if let Some(Some(code)) = &request.code {
            let duplicate = product::Entity::find()
                .filter(product::Column::Code.eq(code.clone()))
                .filter(product::Column::Id.ne(product_id))
                .count(db)
                .await?;
            if duplicate > 0 {
                return Err(ServiceError::Conflict(format!(
                    "product code '{}' already exists",
                    code
                )));
            }
        }

        if let Some(min_stock) = request.min_stock {
            if min_stock < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "minimum stock cannot be negative".to_string(),
                ));
            }
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(code) = request.code {
            active.code = Set(code);
        }
        if let Some(name) = request.name {
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "product name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(attributes) = request.attributes {
            active.attributes = Set(attributes);
        }
        if let Some(min_stock) = request.min_stock {
            active.min_stock = Set(min_stock.round_dp(2));
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Some(Utc::now()));

        let saved = active.update(db).await?;
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        product_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<product::Model>, ServiceError> {
        let db = &*self.db_pool;
        let model = product::Entity::find_by_id_scoped(product_id, include_deleted)
            .one(db)
            .await?;
        Ok(model)
    }

    /// Lists active products with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let paginator = product::Entity::find_active()
            .order_by_desc(product::Column::CreatedAt)
            .paginate(db, limit.max(1));

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok((products, total))
    }

    /// Soft-deletes a product. Blocked while any transaction line
    /// references it.
    #[instrument(skip(self))]
    pub async fn soft_delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let referencing_lines = transaction_line::Entity::find_active()
            .filter(transaction_line::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        if referencing_lines > 0 {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "product {} is referenced by {} transaction line(s)",
                product_id, referencing_lines
            )));
        }

        let txn = db.begin().await?;

        let deleted = soft_delete::soft_delete_by_id::<product::Entity, _>(&txn, product_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("product {}", product_id)));
        }

        product_category::Entity::update_many()
            .col_expr(
                product_category::Column::DeletedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(product_category::Column::ProductId.eq(product_id))
            .filter(product_category::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        attachments::detach_owner(&txn, OwnerRef::new(OwnerKind::Product, product_id)).await?;

        txn.commit().await?;

        info!(product_id = %product_id, "Product soft-deleted");
        self.emit(Event::EntitySoftDeleted {
            entity: "product".to_string(),
            id: product_id,
        })
        .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;

        let restored = soft_delete::restore_by_id::<product::Entity, _>(db, product_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!("product {}", product_id)));
        }

        let model = product::Entity::find_by_id_scoped(product_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

        self.emit(Event::EntityRestored {
            entity: "product".to_string(),
            id: product_id,
        })
        .await;

        Ok(model)
    }

    // ---- Associations ----

    /// Associates a product with a category. At most one association per
    /// product is primary; assigning a new primary demotes the old one.
    #[instrument(skip(self))]
    pub async fn assign_category(
        &self,
        product_id: Uuid,
        category_id: Uuid,
        is_primary: bool,
    ) -> Result<product_category::Model, ServiceError> {
        let db = &*self.db_pool;

        if !soft_delete::exists_active::<product::Entity, _>(db, product_id).await? {
            return Err(ServiceError::NotFound(format!("product {}", product_id)));
        }
        if !soft_delete::exists_active::<category::Entity, _>(db, category_id).await? {
            return Err(ServiceError::NotFound(format!("category {}", category_id)));
        }

        let txn = db.begin().await?;

        let existing = product_category::Entity::find()
            .filter(product_category::Column::ProductId.eq(product_id))
            .filter(product_category::Column::CategoryId.eq(category_id))
            .one(&txn)
            .await?;

        if let Some(existing) = &existing {
            if existing.deleted_at.is_none() {
                return Err(ServiceError::DuplicateAssociation {
                    product_id,
                    category_id,
                });
            }
        }

        let now = Utc::now();

        if is_primary {
            product_category::Entity::update_many()
                .col_expr(product_category::Column::IsPrimary, Expr::value(false))
                .col_expr(product_category::Column::UpdatedAt, Expr::value(Some(now)))
                .filter(product_category::Column::ProductId.eq(product_id))
                .filter(product_category::Column::IsPrimary.eq(true))
                .filter(product_category::Column::DeletedAt.is_null())
                .exec(&txn)
                .await?;
        }

        let saved = match existing {
            // The pair existed before and was soft-deleted; revive it so
            // the (product, category) uniqueness invariant holds across
            // the whole table.
            Some(previous) => {
                let mut active: product_category::ActiveModel = previous.into();
                active.is_primary = Set(is_primary);
                active.deleted_at = Set(None);
                active.updated_at = Set(Some(now));
                active.update(&txn).await?
            }
            None => {
                product_category::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product_id),
                    category_id: Set(category_id),
                    is_primary: Set(is_primary),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                    deleted_at: Set(None),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;

        self.emit(Event::CategoryAssigned {
            product_id,
            category_id,
            is_primary,
        })
        .await;

        Ok(saved)
    }

    /// Active associations of a product.
    #[instrument(skip(self))]
    pub async fn product_categories(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_category::Model>, ServiceError> {
        let db = &*self.db_pool;
        let models = product_category::Entity::find_active()
            .filter(product_category::Column::ProductId.eq(product_id))
            .all(db)
            .await?;
        Ok(models)
    }

    // ---- Stock ----

    /// Adjusts on-hand stock by a signed delta. A negative result is
    /// rejected with `InsufficientStock` unless `allow_negative` is set
    /// for administrative corrections.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        delta: Decimal,
        allow_negative: bool,
        reason: Option<String>,
    ) -> Result<Decimal, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let before = product::Entity::find_by_id_scoped(product_id, false)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

        let new_stock = apply_stock_delta(&txn, product_id, delta, allow_negative).await?;

        txn.commit().await?;

        self.emit(Event::StockAdjusted {
            product_id,
            old_quantity: before.stock,
            new_quantity: new_stock,
            reason: reason.unwrap_or_else(|| "manual adjustment".to_string()),
        })
        .await;

        Ok(new_stock)
    }
}

/// Applies a stock delta with a single conditional UPDATE so concurrent
/// adjustments to the same product serialize at the row and the quantity
/// can never race below zero.
pub(crate) async fn apply_stock_delta<C>(
    db: &C,
    product_id: Uuid,
    delta: Decimal,
    allow_negative: bool,
) -> Result<Decimal, ServiceError>
where
    C: ConnectionTrait,
{
    let delta = delta.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let mut update = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(delta),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Some(Utc::now())))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::DeletedAt.is_null());

    if delta < Decimal::ZERO && !allow_negative {
        update = update.filter(product::Column::Stock.gte(-delta));
    }

    let result = update.exec(db).await?;

    if result.rows_affected == 0 {
        let current = product::Entity::find_by_id_scoped(product_id, false)
            .one(db)
            .await?;
        return match current {
            None => Err(ServiceError::NotFound(format!("product {}", product_id))),
            Some(p) => Err(ServiceError::InsufficientStock {
                product_id,
                available: p.stock,
                requested: -delta,
            }),
        };
    }

    let updated = product::Entity::find_by_id_scoped(product_id, false)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

    // Settle the stock flag at zero crossings; Inactive and Discontinued
    // are manual states and stay untouched.
    let next_status = match updated.status {
        ProductStatus::Active if updated.stock <= Decimal::ZERO => Some(ProductStatus::OutOfStock),
        ProductStatus::OutOfStock if updated.stock > Decimal::ZERO => Some(ProductStatus::Active),
        _ => None,
    };

    let new_stock = updated.stock;
    if let Some(status) = next_status {
        let mut active: product::ActiveModel = updated.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now()));
        active.update(db).await?;
    }

    Ok(new_stock)
}
