//! Shared integration-test harness: in-memory SQLite with the embedded
//! migrator applied and a seeded directory (company, branch, employee,
//! customer, supplier).

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use comercia_ledger::db::{self, DbConfig, DbPool};
use comercia_ledger::entities::enums::{
    BranchKind, BusinessRole, CompanyKind, DocumentKind, Gender, Region, TransactionKind,
};
use comercia_ledger::entities::transaction::PaymentMethod;
use comercia_ledger::entities::{branch, product, transaction, user_profile};
use comercia_ledger::events;
use comercia_ledger::services::catalog::CreateProductRequest;
use comercia_ledger::services::directory::{
    CreateBranchRequest, CreateCompanyRequest, CreateDepartmentRequest, CreateMunicipalityRequest,
    CreateUserProfileRequest,
};
use comercia_ledger::services::ledger::OpenTransactionRequest;
use comercia_ledger::services::{
    AttachmentService, CatalogService, CostPricing, DirectoryService, LedgerService, ReturnService,
};

pub struct TestApp {
    pub db: Arc<DbPool>,
    pub directory: DirectoryService,
    pub catalog: CatalogService,
    pub ledger: LedgerService,
    pub returns: ReturnService,
    pub attachments: AttachmentService,
    pub branch: branch::Model,
    pub employee: user_profile::Model,
    pub customer: user_profile::Model,
    pub supplier: user_profile::Model,
}

impl TestApp {
    pub async fn new() -> Self {
        // A single connection keeps every statement on the same in-memory
        // database.
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(5),
        };
        let pool = db::establish_connection_with_config(&config)
            .await
            .expect("in-memory database");
        db::run_migrations(&pool).await.expect("migrations");

        let db = Arc::new(pool);

        let (sender, rx) = events::channel(256);
        tokio::spawn(events::process_events(rx));
        let sender = Some(Arc::new(sender));

        let directory = DirectoryService::new(db.clone(), sender.clone());
        let catalog = CatalogService::new(db.clone(), sender.clone());
        let ledger = LedgerService::new(db.clone(), sender.clone(), Arc::new(CostPricing));
        let returns = ReturnService::new(db.clone(), sender.clone());
        let attachments = AttachmentService::new(db.clone(), sender);

        let company = directory
            .create_company(CreateCompanyRequest {
                name: "Comercia Demo SAS".to_string(),
                tax_id: 900123456,
                email: Some("contacto@comercia.test".to_string()),
                kind: CompanyKind::Sas,
                metadata: None,
            })
            .await
            .expect("seed company");

        let department = directory
            .create_department(CreateDepartmentRequest {
                name: "Antioquia".to_string(),
                dane_code: 5,
                region: Region::EjeCafetero,
            })
            .await
            .expect("seed department");

        let municipality = directory
            .create_municipality(CreateMunicipalityRequest {
                department_id: department.id,
                name: "Medellin".to_string(),
                dane_code: 5001,
            })
            .await
            .expect("seed municipality");

        let branch = directory
            .create_branch(CreateBranchRequest {
                company_id: company.id,
                name: "Centro".to_string(),
                manager_id: None,
                address: "Cra 50 # 10-20".to_string(),
                municipality_id: municipality.id,
                phone: "6042345678".to_string(),
                email: None,
                kind: BranchKind::Main,
                settings: None,
            })
            .await
            .expect("seed branch");

        let employee = directory
            .create_user_profile(profile_request(
                "1015404001",
                "Laura",
                "Gomez",
                BusinessRole::Seller,
                Some(branch.id),
            ))
            .await
            .expect("seed employee");

        let customer = directory
            .create_user_profile(profile_request(
                "1015404002",
                "Carlos",
                "Perez",
                BusinessRole::Customer,
                None,
            ))
            .await
            .expect("seed customer");

        let supplier = directory
            .create_user_profile(profile_request(
                "1015404003",
                "Distribuciones",
                "Andinas",
                BusinessRole::Supplier,
                None,
            ))
            .await
            .expect("seed supplier");

        Self {
            db,
            directory,
            catalog,
            ledger,
            returns,
            attachments,
            branch,
            employee,
            customer,
            supplier,
        }
    }

    pub async fn seed_product(&self, code: &str, stock: Decimal) -> product::Model {
        self.catalog
            .create_product(CreateProductRequest {
                code: Some(code.to_string()),
                name: format!("Product {}", code),
                description: None,
                attributes: None,
                min_stock: dec!(1),
                initial_stock: stock,
            })
            .await
            .expect("seed product")
    }

    pub async fn open_sale(&self, invoice: &str) -> transaction::Model {
        self.ledger
            .open(OpenTransactionRequest {
                kind: TransactionKind::Sale,
                branch_id: self.branch.id,
                party_id: self.customer.id,
                employee_id: self.employee.id,
                invoice_number: invoice.to_string(),
                payment_method: PaymentMethod::Cash,
                notes: None,
            })
            .await
            .expect("open sale")
    }

    pub async fn open_purchase(&self, invoice: &str) -> transaction::Model {
        self.ledger
            .open(OpenTransactionRequest {
                kind: TransactionKind::Purchase,
                branch_id: self.branch.id,
                party_id: self.supplier.id,
                employee_id: self.employee.id,
                invoice_number: invoice.to_string(),
                payment_method: PaymentMethod::Transfer,
                notes: None,
            })
            .await
            .expect("open purchase")
    }

    pub async fn current_stock(&self, product_id: uuid::Uuid) -> Decimal {
        self.catalog
            .get_product(product_id, false)
            .await
            .expect("get product")
            .expect("product exists")
            .stock
    }
}

pub fn profile_request(
    document: &str,
    first_names: &str,
    last_names: &str,
    role: BusinessRole,
    branch_id: Option<uuid::Uuid>,
) -> CreateUserProfileRequest {
    CreateUserProfileRequest {
        employee_code: None,
        document_kind: DocumentKind::Cc,
        document: document.to_string(),
        first_names: first_names.to_string(),
        last_names: last_names.to_string(),
        phone: None,
        corporate_email: None,
        address: None,
        municipality_id: None,
        birth_date: None,
        gender: Gender::Unspecified,
        business_role: role,
        hired_on: None,
        salary: None,
        branch_id,
    }
}
