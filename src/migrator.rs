use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240501_000001_create_directory_tables::Migration),
            Box::new(m20240501_000002_create_catalog_tables::Migration),
            Box::new(m20240501_000003_create_transaction_tables::Migration),
            Box::new(m20240501_000004_create_returns_table::Migration),
            Box::new(m20240501_000005_create_attachments_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240501_000001_create_directory_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000001_create_directory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Companies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Companies::Name).string_len(150).not_null())
                        .col(
                            ColumnDef::new(Companies::TaxId)
                                .big_integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Companies::Email).string_len(100).null())
                        .col(ColumnDef::new(Companies::Kind).string_len(32).not_null())
                        .col(ColumnDef::new(Companies::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Companies::Metadata).json().null())
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Companies::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Companies::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Departments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Departments::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Departments::Name)
                                .string_len(200)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Departments::DaneCode)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Departments::Region).string_len(32).not_null())
                        .col(ColumnDef::new(Departments::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Departments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Departments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Departments::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Municipalities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Municipalities::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Municipalities::DepartmentId).uuid().not_null())
                        .col(ColumnDef::new(Municipalities::Name).string_len(400).not_null())
                        .col(
                            ColumnDef::new(Municipalities::DaneCode)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Municipalities::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Municipalities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Municipalities::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Municipalities::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-municipalities-department")
                                .from(Municipalities::Table, Municipalities::DepartmentId)
                                .to(Departments::Table, Departments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Branches::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Branches::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Branches::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Branches::Name).string_len(100).not_null())
                        // No FK: user_profiles is created after branches and
                        // references it back; the relation stays service-enforced.
                        .col(ColumnDef::new(Branches::ManagerId).uuid().null())
                        .col(ColumnDef::new(Branches::Address).string_len(300).not_null())
                        .col(ColumnDef::new(Branches::MunicipalityId).uuid().not_null())
                        .col(ColumnDef::new(Branches::Phone).string_len(15).not_null())
                        .col(ColumnDef::new(Branches::Email).string_len(100).null())
                        .col(ColumnDef::new(Branches::Kind).string_len(32).not_null())
                        .col(ColumnDef::new(Branches::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Branches::Settings).json().null())
                        .col(
                            ColumnDef::new(Branches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Branches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Branches::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-branches-company")
                                .from(Branches::Table, Branches::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-branches-municipality")
                                .from(Branches::Table, Branches::MunicipalityId)
                                .to(Municipalities::Table, Municipalities::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-branches-company-name")
                        .table(Branches::Table)
                        .col(Branches::CompanyId)
                        .col(Branches::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UserProfiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserProfiles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserProfiles::EmployeeCode)
                                .string_len(20)
                                .null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(UserProfiles::DocumentKind)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserProfiles::Document)
                                .string_len(15)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(UserProfiles::FirstNames)
                                .string_len(80)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserProfiles::LastNames)
                                .string_len(80)
                                .not_null(),
                        )
                        .col(ColumnDef::new(UserProfiles::Phone).string_len(15).null())
                        .col(
                            ColumnDef::new(UserProfiles::CorporateEmail)
                                .string_len(100)
                                .null(),
                        )
                        .col(ColumnDef::new(UserProfiles::Address).string_len(300).null())
                        .col(ColumnDef::new(UserProfiles::MunicipalityId).uuid().null())
                        .col(ColumnDef::new(UserProfiles::BirthDate).date().null())
                        .col(ColumnDef::new(UserProfiles::Gender).string_len(16).not_null())
                        .col(
                            ColumnDef::new(UserProfiles::BusinessRole)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(UserProfiles::HiredOn).date().null())
                        .col(ColumnDef::new(UserProfiles::TerminatedOn).date().null())
                        .col(ColumnDef::new(UserProfiles::Salary).decimal_len(12, 2).null())
                        .col(ColumnDef::new(UserProfiles::BranchId).uuid().null())
                        .col(ColumnDef::new(UserProfiles::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(UserProfiles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserProfiles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(UserProfiles::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-user_profiles-municipality")
                                .from(UserProfiles::Table, UserProfiles::MunicipalityId)
                                .to(Municipalities::Table, Municipalities::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-user_profiles-branch")
                                .from(UserProfiles::Table, UserProfiles::BranchId)
                                .to(Branches::Table, Branches::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Branches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Municipalities::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Departments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Companies {
        Table,
        Id,
        Name,
        TaxId,
        Email,
        Kind,
        Status,
        Metadata,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub enum Departments {
        Table,
        Id,
        Name,
        DaneCode,
        Region,
        Status,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub enum Municipalities {
        Table,
        Id,
        DepartmentId,
        Name,
        DaneCode,
        Status,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub enum Branches {
        Table,
        Id,
        CompanyId,
        Name,
        ManagerId,
        Address,
        MunicipalityId,
        Phone,
        Email,
        Kind,
        Status,
        Settings,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub enum UserProfiles {
        Table,
        Id,
        EmployeeCode,
        DocumentKind,
        Document,
        FirstNames,
        LastNames,
        Phone,
        CorporateEmail,
        Address,
        MunicipalityId,
        BirthDate,
        Gender,
        BusinessRole,
        HiredOn,
        TerminatedOn,
        Salary,
        BranchId,
        Status,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240501_000002_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Categories::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Categories::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .col(ColumnDef::new(Categories::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Categories::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-categories-parent")
                                .from(Categories::Table, Categories::ParentId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            // Name uniqueness under one parent. NULL parents compare
            // distinct at the database level; the service check covers
            // root categories.
            manager
                .create_index(
                    Index::create()
                        .name("idx-categories-name-parent")
                        .table(Categories::Table)
                        .col(Categories::Name)
                        .col(Categories::ParentId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Code)
                                .string_len(50)
                                .null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string_len(150).not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::Stock)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::MinStock)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Attributes).json().null())
                        .col(ColumnDef::new(Products::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCategories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductCategories::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductCategories::CategoryId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductCategories::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductCategories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCategories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductCategories::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-product_categories-product")
                                .from(ProductCategories::Table, ProductCategories::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-product_categories-category")
                                .from(ProductCategories::Table, ProductCategories::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-product_categories-pair")
                        .table(ProductCategories::Table)
                        .col(ProductCategories::ProductId)
                        .col(ProductCategories::CategoryId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductCategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Categories {
        Table,
        Id,
        Name,
        Description,
        ParentId,
        Status,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Code,
        Name,
        Description,
        Stock,
        MinStock,
        Attributes,
        Status,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub enum ProductCategories {
        Table,
        Id,
        ProductId,
        CategoryId,
        IsPrimary,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240501_000003_create_transaction_tables {

    use sea_orm_migration::prelude::*;

    use super::m20240501_000001_create_directory_tables::{Branches, UserProfiles};
    use super::m20240501_000002_create_catalog_tables::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000003_create_transaction_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::InvoiceNumber)
                                .string_len(80)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::BranchId).uuid().not_null())
                        .col(ColumnDef::new(Transactions::SupplierId).uuid().null())
                        .col(ColumnDef::new(Transactions::CustomerId).uuid().null())
                        .col(ColumnDef::new(Transactions::EmployeeId).uuid().not_null())
                        .col(
                            ColumnDef::new(Transactions::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::BaseValue)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Transactions::Discount)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Transactions::Total)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Transactions::PaymentMethod)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Transactions::Kind).string_len(16).not_null())
                        .col(ColumnDef::new(Transactions::Notes).text().null())
                        .col(
                            ColumnDef::new(Transactions::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Transactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-transactions-branch")
                                .from(Transactions::Table, Transactions::BranchId)
                                .to(Branches::Table, Branches::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-transactions-supplier")
                                .from(Transactions::Table, Transactions::SupplierId)
                                .to(UserProfiles::Table, UserProfiles::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-transactions-customer")
                                .from(Transactions::Table, Transactions::CustomerId)
                                .to(UserProfiles::Table, UserProfiles::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-transactions-employee")
                                .from(Transactions::Table, Transactions::EmployeeId)
                                .to(UserProfiles::Table, UserProfiles::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-transactions-branch-invoice-kind")
                        .table(Transactions::Table)
                        .col(Transactions::BranchId)
                        .col(Transactions::InvoiceNumber)
                        .col(Transactions::Kind)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TransactionLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TransactionLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLines::TransactionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransactionLines::ProductId).uuid().not_null())
                        .col(ColumnDef::new(TransactionLines::Lot).string_len(50).null())
                        .col(ColumnDef::new(TransactionLines::ExpiresOn).date().null())
                        .col(
                            ColumnDef::new(TransactionLines::Quantity)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLines::UnitCost)
                                .decimal_len(15, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLines::SalePrice)
                                .decimal_len(15, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLines::LineTotal)
                                .decimal_len(15, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TransactionLines::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-transaction_lines-transaction")
                                .from(TransactionLines::Table, TransactionLines::TransactionId)
                                .to(Transactions::Table, Transactions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-transaction_lines-product")
                                .from(TransactionLines::Table, TransactionLines::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-transaction_lines-transaction")
                        .table(TransactionLines::Table)
                        .col(TransactionLines::TransactionId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-transaction_lines-product")
                        .table(TransactionLines::Table)
                        .col(TransactionLines::ProductId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TransactionLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transactions::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Transactions {
        Table,
        Id,
        InvoiceNumber,
        BranchId,
        SupplierId,
        CustomerId,
        EmployeeId,
        RecordedAt,
        BaseValue,
        Discount,
        Total,
        PaymentMethod,
        Status,
        Kind,
        Notes,
        Version,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub enum TransactionLines {
        Table,
        Id,
        TransactionId,
        ProductId,
        Lot,
        ExpiresOn,
        Quantity,
        UnitCost,
        SalePrice,
        LineTotal,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240501_000004_create_returns_table {

    use sea_orm_migration::prelude::*;

    use super::m20240501_000001_create_directory_tables::{Branches, UserProfiles};
    use super::m20240501_000003_create_transaction_tables::TransactionLines;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000004_create_returns_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Returns::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Returns::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Returns::BranchId).uuid().not_null())
                        .col(ColumnDef::new(Returns::Number).string_len(50).not_null())
                        .col(ColumnDef::new(Returns::Reason).string_len(32).not_null())
                        .col(ColumnDef::new(Returns::TransactionLineId).uuid().not_null())
                        .col(ColumnDef::new(Returns::Kind).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Returns::QuantityReturned)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Returns::RefundAmount)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Returns::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Returns::Notes).text().null())
                        .col(ColumnDef::new(Returns::EmployeeId).uuid().not_null())
                        .col(
                            ColumnDef::new(Returns::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Returns::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Returns::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Returns::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-returns-branch")
                                .from(Returns::Table, Returns::BranchId)
                                .to(Branches::Table, Branches::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-returns-transaction_line")
                                .from(Returns::Table, Returns::TransactionLineId)
                                .to(TransactionLines::Table, TransactionLines::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-returns-employee")
                                .from(Returns::Table, Returns::EmployeeId)
                                .to(UserProfiles::Table, UserProfiles::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-returns-branch-number")
                        .table(Returns::Table)
                        .col(Returns::BranchId)
                        .col(Returns::Number)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-returns-transaction_line")
                        .table(Returns::Table)
                        .col(Returns::TransactionLineId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Returns::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Returns {
        Table,
        Id,
        BranchId,
        Number,
        Reason,
        TransactionLineId,
        Kind,
        QuantityReturned,
        RefundAmount,
        Status,
        Notes,
        EmployeeId,
        RecordedAt,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240501_000005_create_attachments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000005_create_attachments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Attachments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Attachments::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Attachments::Token)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Attachments::OriginalName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Attachments::StoragePath)
                                .string_len(500)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Attachments::Extension).string_len(10).not_null())
                        .col(ColumnDef::new(Attachments::Kind).string_len(32).not_null())
                        .col(ColumnDef::new(Attachments::OwnerKind).string_len(32).not_null())
                        .col(ColumnDef::new(Attachments::OwnerId).uuid().not_null())
                        .col(
                            ColumnDef::new(Attachments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Attachments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Attachments::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Index for polymorphic owner lookups.
            manager
                .create_index(
                    Index::create()
                        .name("idx-attachments-owner")
                        .table(Attachments::Table)
                        .col(Attachments::OwnerKind)
                        .col(Attachments::OwnerId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Attachments::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Attachments {
        Table,
        Id,
        Token,
        OriginalName,
        StoragePath,
        Extension,
        Kind,
        OwnerKind,
        OwnerId,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}
