use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::attachment::{OwnerKind, OwnerRef};
use crate::entities::enums::{
    BranchKind, BusinessRole, CompanyKind, DocumentKind, EntityStatus, Gender, ProfileStatus,
    Region,
};
use crate::entities::soft_delete::{self, SoftDeletable};
use crate::entities::{
    branch, company, department, municipality, return_entity, transaction, user_profile,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::attachments;

#[derive(Debug, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 150, message = "Company name must be between 1 and 150 characters"))]
    pub name: String,
    pub tax_id: i64,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub kind: CompanyKind,
    pub metadata: Option<JsonValue>,
}

#[derive(Debug, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub dane_code: i32,
    pub region: Region,
}

#[derive(Debug, Validate)]
pub struct CreateMunicipalityRequest {
    pub department_id: Uuid,
    #[validate(length(min = 1, max = 400))]
    pub name: String,
    pub dane_code: i32,
}

#[derive(Debug, Validate)]
pub struct CreateBranchRequest {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Branch name must be between 1 and 100 characters"))]
    pub name: String,
    pub manager_id: Option<Uuid>,
    #[validate(length(min = 1, max = 300))]
    pub address: String,
    pub municipality_id: Uuid,
    #[validate(length(min = 1, max = 15))]
    pub phone: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub kind: BranchKind,
    pub settings: Option<JsonValue>,
}

#[derive(Debug, Validate)]
pub struct CreateUserProfileRequest {
    pub employee_code: Option<String>,
    pub document_kind: DocumentKind,
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
    pub birth_date: Option<chrono::NaiveDate>,
    pub gender: Gender,
    pub business_role: BusinessRole,
    pub hired_on: Option<chrono::NaiveDate>,
    pub salary: Option<Decimal>,
    pub branch_id: Option<Uuid>,
}

/// Service for the party directory: companies, branches, locations and
/// user profiles. Supplies the identifiers the ledger validates against.
#[derive(Clone)]
pub struct DirectoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DirectoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send directory event");
            }
        }
    }

    // ---- Companies ----

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_company(
        &self,
        request: CreateCompanyRequest,
    ) -> Result<company::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let duplicate = company::Entity::find()
            .filter(company::Column::TaxId.eq(request.tax_id))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "company with tax id {} already exists",
                request.tax_id
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = company::ActiveModel {
            id: Set(id),
            name: Set(request.name),
            tax_id: Set(request.tax_id),
            email: Set(request.email),
            kind: Set(request.kind),
            status: Set(EntityStatus::Active),
            metadata: Set(request.metadata),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(company_id = %id, "Company created");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_company(
        &self,
        company_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<company::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(company::Entity::find_by_id_scoped(company_id, include_deleted)
            .one(db)
            .await?)
    }

    /// Soft-deletes a company. Blocked while active branches exist.
    #[instrument(skip(self))]
    pub async fn soft_delete_company(&self, company_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let active_branches = branch::Entity::find_active()
            .filter(branch::Column::CompanyId.eq(company_id))
            .count(db)
            .await?;
        if active_branches > 0 {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "company {} still has {} active branch(es)",
                company_id, active_branches
            )));
        }

        let txn = db.begin().await?;
        let deleted = soft_delete::soft_delete_by_id::<company::Entity, _>(&txn, company_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("company {}", company_id)));
        }
        attachments::detach_owner(&txn, OwnerRef::new(OwnerKind::Company, company_id)).await?;
        txn.commit().await?;

        self.emit(Event::EntitySoftDeleted {
            entity: "company".to_string(),
            id: company_id,
        })
        .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore_company(&self, company_id: Uuid) -> Result<company::Model, ServiceError> {
        let db = &*self.db_pool;
        let restored = soft_delete::restore_by_id::<company::Entity, _>(db, company_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!("company {}", company_id)));
        }
        let model = company::Entity::find_by_id_scoped(company_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("company {}", company_id)))?;

        self.emit(Event::EntityRestored {
            entity: "company".to_string(),
            id: company_id,
        })
        .await;
        Ok(model)
    }

    // ---- Departments and municipalities ----

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_department(
        &self,
        request: CreateDepartmentRequest,
    ) -> Result<department::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let duplicate = department::Entity::find()
            .filter(
                sea_orm::Condition::any()
                    .add(department::Column::Name.eq(request.name.clone()))
                    .add(department::Column::DaneCode.eq(request.dane_code)),
            )
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "department '{}' or code {} already exists",
                request.name, request.dane_code
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = department::ActiveModel {
            id: Set(id),
            name: Set(request.name),
            dane_code: Set(request.dane_code),
            region: Set(request.region),
            status: Set(EntityStatus::Active),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        Ok(saved)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_municipality(
        &self,
        request: CreateMunicipalityRequest,
    ) -> Result<municipality::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        if !soft_delete::exists_active::<department::Entity, _>(db, request.department_id).await? {
            return Err(ServiceError::NotFound(format!(
                "department {}",
                request.department_id
            )));
        }

        let duplicate = municipality::Entity::find()
            .filter(municipality::Column::DaneCode.eq(request.dane_code))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "municipality code {} already exists",
                request.dane_code
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = municipality::ActiveModel {
            id: Set(id),
            department_id: Set(request.department_id),
            name: Set(request.name),
            dane_code: Set(request.dane_code),
            status: Set(EntityStatus::Active),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_department(
        &self,
        department_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<department::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(
            department::Entity::find_by_id_scoped(department_id, include_deleted)
                .one(db)
                .await?,
        )
    }

    #[instrument(skip(self))]
    pub async fn list_departments(
        &self,
        include_deleted: bool,
    ) -> Result<Vec<department::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(department::Entity::find_scoped(include_deleted)
            .order_by_asc(department::Column::Name)
            .all(db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_municipality(
        &self,
        municipality_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<municipality::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(
            municipality::Entity::find_by_id_scoped(municipality_id, include_deleted)
                .one(db)
                .await?,
        )
    }

    /// Soft-deletes a department and cascades to its municipalities.
    /// Blocked while any branch sits in one of them.
    #[instrument(skip(self))]
    pub async fn soft_delete_department(&self, department_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let municipality_ids: Vec<Uuid> = municipality::Entity::find_active()
            .filter(municipality::Column::DepartmentId.eq(department_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        if !municipality_ids.is_empty() {
            let referencing_branches = branch::Entity::find_active()
                .filter(branch::Column::MunicipalityId.is_in(municipality_ids.clone()))
                .count(db)
                .await?;
            if referencing_branches > 0 {
                return Err(ServiceError::ReferentialIntegrity(format!(
                    "department {} has {} active branch(es) in its municipalities",
                    department_id, referencing_branches
                )));
            }
        }

        let txn = db.begin().await?;

        let deleted =
            soft_delete::soft_delete_by_id::<department::Entity, _>(&txn, department_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!(
                "department {}",
                department_id
            )));
        }

        let now = Utc::now();
        if !municipality_ids.is_empty() {
            // Profiles keep working without a municipality.
            user_profile::Entity::update_many()
                .col_expr(
                    user_profile::Column::MunicipalityId,
                    Expr::value(Option::<Uuid>::None),
                )
                .col_expr(user_profile::Column::UpdatedAt, Expr::value(Some(now)))
                .filter(user_profile::Column::MunicipalityId.is_in(municipality_ids.clone()))
                .filter(user_profile::Column::DeletedAt.is_null())
                .exec(&txn)
                .await?;

            municipality::Entity::update_many()
                .col_expr(municipality::Column::DeletedAt, Expr::value(Some(now)))
                .filter(municipality::Column::Id.is_in(municipality_ids))
                .filter(municipality::Column::DeletedAt.is_null())
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        self.emit(Event::EntitySoftDeleted {
            entity: "department".to_string(),
            id: department_id,
        })
        .await;
        Ok(())
    }

    /// Soft-deletes a municipality. Blocked while branches reference it;
    /// profiles referencing it are detached.
    #[instrument(skip(self))]
    pub async fn soft_delete_municipality(&self, municipality_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let referencing_branches = branch::Entity::find_active()
            .filter(branch::Column::MunicipalityId.eq(municipality_id))
            .count(db)
            .await?;
        if referencing_branches > 0 {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "municipality {} is referenced by {} active branch(es)",
                municipality_id, referencing_branches
            )));
        }

        let txn = db.begin().await?;

        let deleted =
            soft_delete::soft_delete_by_id::<municipality::Entity, _>(&txn, municipality_id)
                .await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!(
                "municipality {}",
                municipality_id
            )));
        }

        user_profile::Entity::update_many()
            .col_expr(
                user_profile::Column::MunicipalityId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                user_profile::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(user_profile::Column::MunicipalityId.eq(municipality_id))
            .filter(user_profile::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        self.emit(Event::EntitySoftDeleted {
            entity: "municipality".to_string(),
            id: municipality_id,
        })
        .await;
        Ok(())
    }

    /// Restores a department. Only the marker is flipped; municipalities
    /// cascaded away with it must be restored individually.
    #[instrument(skip(self))]
    pub async fn restore_department(
        &self,
        department_id: Uuid,
    ) -> Result<department::Model, ServiceError> {
        let db = &*self.db_pool;
        let restored =
            soft_delete::restore_by_id::<department::Entity, _>(db, department_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!(
                "department {}",
                department_id
            )));
        }
        let model = department::Entity::find_by_id_scoped(department_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("department {}", department_id)))?;

        self.emit(Event::EntityRestored {
            entity: "department".to_string(),
            id: department_id,
        })
        .await;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn restore_municipality(
        &self,
        municipality_id: Uuid,
    ) -> Result<municipality::Model, ServiceError> {
        let db = &*self.db_pool;

        let municipality = municipality::Entity::find_by_id_scoped(municipality_id, true)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("municipality {}", municipality_id)))?;

        // A municipality cannot come back under a department that is
        // itself deleted.
        if !soft_delete::exists_active::<department::Entity, _>(db, municipality.department_id)
            .await?
        {
            return Err(ServiceError::InvalidOperation(format!(
                "department {} of municipality {} is deleted",
                municipality.department_id, municipality_id
            )));
        }

        soft_delete::restore_by_id::<municipality::Entity, _>(db, municipality_id).await?;
        let model = municipality::Entity::find_by_id_scoped(municipality_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("municipality {}", municipality_id)))?;

        self.emit(Event::EntityRestored {
            entity: "municipality".to_string(),
            id: municipality_id,
        })
        .await;
        Ok(model)
    }

    // ---- Branches ----

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_branch(
        &self,
        request: CreateBranchRequest,
    ) -> Result<branch::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        if !soft_delete::exists_active::<company::Entity, _>(db, request.company_id).await? {
            return Err(ServiceError::NotFound(format!(
                "company {}",
                request.company_id
            )));
        }
        if !soft_delete::exists_active::<municipality::Entity, _>(db, request.municipality_id)
            .await?
        {
            return Err(ServiceError::NotFound(format!(
                "municipality {}",
                request.municipality_id
            )));
        }
        if let Some(manager_id) = request.manager_id {
            if !soft_delete::exists_active::<user_profile::Entity, _>(db, manager_id).await? {
                return Err(ServiceError::NotFound(format!("profile {}", manager_id)));
            }
        }

        let duplicate = branch::Entity::find()
            .filter(branch::Column::CompanyId.eq(request.company_id))
            .filter(branch::Column::Name.eq(request.name.clone()))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::DuplicateName(format!(
                "branch '{}' already exists for company {}",
                request.name, request.company_id
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = branch::ActiveModel {
            id: Set(id),
            company_id: Set(request.company_id),
            name: Set(request.name),
            manager_id: Set(request.manager_id),
            address: Set(request.address),
            municipality_id: Set(request.municipality_id),
            phone: Set(request.phone),
            email: Set(request.email),
            kind: Set(request.kind),
            status: Set(EntityStatus::Active),
            settings: Set(request.settings),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(branch_id = %id, "Branch created");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_branch(
        &self,
        branch_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<branch::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(branch::Entity::find_by_id_scoped(branch_id, include_deleted)
            .one(db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_branches(
        &self,
        company_id: Option<Uuid>,
        include_deleted: bool,
    ) -> Result<Vec<branch::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut select = branch::Entity::find_scoped(include_deleted);
        if let Some(company_id) = company_id {
            select = select.filter(branch::Column::CompanyId.eq(company_id));
        }

        Ok(select.order_by_asc(branch::Column::Name).all(db).await?)
    }

    /// Soft-deletes a branch. Blocked while transactions or returns
    /// reference it; employee profiles are detached.
    #[instrument(skip(self))]
    pub async fn soft_delete_branch(&self, branch_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let referencing_transactions = transaction::Entity::find_active()
            .filter(transaction::Column::BranchId.eq(branch_id))
            .count(db)
            .await?;
        if referencing_transactions > 0 {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "branch {} is referenced by {} active transaction(s)",
                branch_id, referencing_transactions
            )));
        }

        let referencing_returns = return_entity::Entity::find_active()
            .filter(return_entity::Column::BranchId.eq(branch_id))
            .count(db)
            .await?;
        if referencing_returns > 0 {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "branch {} is referenced by {} active return(s)",
                branch_id, referencing_returns
            )));
        }

        let txn = db.begin().await?;

        let deleted = soft_delete::soft_delete_by_id::<branch::Entity, _>(&txn, branch_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("branch {}", branch_id)));
        }

        user_profile::Entity::update_many()
            .col_expr(
                user_profile::Column::BranchId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                user_profile::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(user_profile::Column::BranchId.eq(branch_id))
            .filter(user_profile::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        attachments::detach_owner(&txn, OwnerRef::new(OwnerKind::Branch, branch_id)).await?;

        txn.commit().await?;

        self.emit(Event::EntitySoftDeleted {
            entity: "branch".to_string(),
            id: branch_id,
        })
        .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore_branch(&self, branch_id: Uuid) -> Result<branch::Model, ServiceError> {
        let db = &*self.db_pool;
        let restored = soft_delete::restore_by_id::<branch::Entity, _>(db, branch_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!("branch {}", branch_id)));
        }
        let model = branch::Entity::find_by_id_scoped(branch_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("branch {}", branch_id)))?;

        self.emit(Event::EntityRestored {
            entity: "branch".to_string(),
            id: branch_id,
        })
        .await;
        Ok(model)
    }

    // ---- User profiles ----

    #[instrument(skip(self, request), fields(document = %request.document))]
    pub async fn create_user_profile(
        &self,
        request: CreateUserProfileRequest,
    ) -> Result<user_profile::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let duplicate = user_profile::Entity::find()
            .filter(user_profile::Column::Document.eq(request.document.clone()))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "profile with document {} already exists",
                request.document
            )));
        }

        if let Some(code) = &request.employee_code {
            let duplicate = user_profile::Entity::find()
                .filter(user_profile::Column::EmployeeCode.eq(code.clone()))
                .count(db)
                .await?;
            if duplicate > 0 {
                return Err(ServiceError::Conflict(format!(
                    "employee code '{}' already exists",
                    code
                )));
            }
        }

        if let Some(branch_id) = request.branch_id {
            if !soft_delete::exists_active::<branch::Entity, _>(db, branch_id).await? {
                return Err(ServiceError::NotFound(format!("branch {}", branch_id)));
            }
        }
        if let Some(municipality_id) = request.municipality_id {
            if !soft_delete::exists_active::<municipality::Entity, _>(db, municipality_id).await? {
                return Err(ServiceError::NotFound(format!(
                    "municipality {}",
                    municipality_id
                )));
            }
        }

        if let Some(salary) = request.salary {
            if salary < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "salary cannot be negative".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        let saved = user_profile::ActiveModel {
            id: Set(id),
            employee_code: Set(request.employee_code),
            document_kind: Set(request.document_kind),
            document: Set(request.document),
            first_names: Set(request.first_names),
            last_names: Set(request.last_names),
            phone: Set(request.phone),
            corporate_email: Set(request.corporate_email),
            address: Set(request.address),
            municipality_id: Set(request.municipality_id),
            birth_date: Set(request.birth_date),
            gender: Set(request.gender),
            business_role: Set(request.business_role),
            hired_on: Set(request.hired_on),
            terminated_on: Set(None),
            salary: Set(request.salary),
            branch_id: Set(request.branch_id),
            status: Set(ProfileStatus::Active),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(profile_id = %id, "User profile created");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_user_profile(
        &self,
        profile_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<user_profile::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(
            user_profile::Entity::find_by_id_scoped(profile_id, include_deleted)
                .one(db)
                .await?,
        )
    }

    /// Lists active profiles with pagination, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_user_profiles(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<user_profile::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let paginator = user_profile::Entity::find_active()
            .order_by_asc(user_profile::Column::FirstNames)
            .order_by_asc(user_profile::Column::LastNames)
            .paginate(db, limit.max(1));

        let total = paginator.num_items().await?;
        let profiles = paginator.fetch_page(page - 1).await?;

        Ok((profiles, total))
    }

    /// Soft-deletes a profile. Blocked while transactions or returns
    /// reference it; branch-manager references are detached.
    #[instrument(skip(self))]
    pub async fn soft_delete_user_profile(&self, profile_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let referencing_transactions = transaction::Entity::find_active()
            .filter(
                sea_orm::Condition::any()
                    .add(transaction::Column::SupplierId.eq(profile_id))
                    .add(transaction::Column::CustomerId.eq(profile_id))
                    .add(transaction::Column::EmployeeId.eq(profile_id)),
            )
            .count(db)
            .await?;
        if referencing_transactions > 0 {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "profile {} is referenced by {} active transaction(s)",
                profile_id, referencing_transactions
            )));
        }

        let referencing_returns = return_entity::Entity::find_active()
            .filter(return_entity::Column::EmployeeId.eq(profile_id))
            .count(db)
            .await?;
        if referencing_returns > 0 {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "profile {} is referenced by {} active return(s)",
                profile_id, referencing_returns
            )));
        }

        let txn = db.begin().await?;

        let deleted =
            soft_delete::soft_delete_by_id::<user_profile::Entity, _>(&txn, profile_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("profile {}", profile_id)));
        }

        branch::Entity::update_many()
            .col_expr(branch::Column::ManagerId, Expr::value(Option::<Uuid>::None))
            .col_expr(branch::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(branch::Column::ManagerId.eq(profile_id))
            .filter(branch::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        attachments::detach_owner(&txn, OwnerRef::new(OwnerKind::UserProfile, profile_id)).await?;

        txn.commit().await?;

        self.emit(Event::EntitySoftDeleted {
            entity: "user_profile".to_string(),
            id: profile_id,
        })
        .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore_user_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<user_profile::Model, ServiceError> {
        let db = &*self.db_pool;
        let restored = soft_delete::restore_by_id::<user_profile::Entity, _>(db, profile_id).await?;
        if !restored {
            return Err(ServiceError::NotFound(format!("profile {}", profile_id)));
        }
        let model = user_profile::Entity::find_by_id_scoped(profile_id, false)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile {}", profile_id)))?;

        self.emit(Event::EntityRestored {
            entity: "user_profile".to_string(),
            id: profile_id,
        })
        .await;
        Ok(model)
    }
}
