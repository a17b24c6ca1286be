//! Integration tests for the party directory: uniqueness, protected
//! deletes and detach cascades.

mod common;

use assert_matches::assert_matches;
use common::{profile_request, TestApp};
use comercia_ledger::entities::enums::BusinessRole;
use comercia_ledger::errors::ServiceError;
use comercia_ledger::services::directory::CreateCompanyRequest;
use rust_decimal_macros::dec;

#[tokio::test]
async fn duplicate_tax_id_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .directory
        .create_company(CreateCompanyRequest {
            name: "Otra Empresa".to_string(),
            tax_id: 900123456,
            email: None,
            kind: comercia_ledger::entities::enums::CompanyKind::Ltda,
            metadata: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn branch_with_transactions_is_protected() {
    let app = TestApp::new().await;

    app.open_sale("S-DIR-1").await;

    let err = app.directory.soft_delete_branch(app.branch.id).await.unwrap_err();
    assert_matches!(err, ServiceError::ReferentialIntegrity(_));
}

#[tokio::test]
async fn employee_referenced_by_transactions_is_protected() {
    let app = TestApp::new().await;

    app.open_sale("S-DIR-2").await;

    let err = app
        .directory
        .soft_delete_user_profile(app.employee.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ReferentialIntegrity(_));

    // An unreferenced profile deletes fine.
    let bystander = app
        .directory
        .create_user_profile(profile_request(
            "1015404999",
            "Sin",
            "Referencias",
            BusinessRole::Customer,
            None,
        ))
        .await
        .unwrap();
    app.directory
        .soft_delete_user_profile(bystander.id)
        .await
        .expect("unreferenced profile deletes");
}

#[tokio::test]
async fn deleting_branch_detaches_its_employees() {
    let app = TestApp::new().await;

    // A branch with no ledger activity but one employee.
    let second = app
        .directory
        .create_branch(comercia_ledger::services::directory::CreateBranchRequest {
            company_id: app.branch.company_id,
            name: "Norte".to_string(),
            manager_id: None,
            address: "Cll 80 # 45-10".to_string(),
            municipality_id: app.branch.municipality_id,
            phone: "6049876543".to_string(),
            email: None,
            kind: comercia_ledger::entities::enums::BranchKind::Satellite,
            settings: None,
        })
        .await
        .unwrap();

    let clerk = app
        .directory
        .create_user_profile(profile_request(
            "1015404100",
            "Pedro",
            "Nel",
            BusinessRole::Warehouse,
            Some(second.id),
        ))
        .await
        .unwrap();

    app.directory.soft_delete_branch(second.id).await.unwrap();

    let clerk = app
        .directory
        .get_user_profile(clerk.id, false)
        .await
        .unwrap()
        .expect("profile survives branch deletion");
    assert_eq!(clerk.branch_id, None);
}

#[tokio::test]
async fn company_with_branches_is_protected() {
    let app = TestApp::new().await;

    let err = app
        .directory
        .soft_delete_company(app.branch.company_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ReferentialIntegrity(_));
}

#[tokio::test]
async fn municipality_with_branches_is_protected() {
    let app = TestApp::new().await;

    let err = app
        .directory
        .soft_delete_municipality(app.branch.municipality_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ReferentialIntegrity(_));
}

#[tokio::test]
async fn soft_deleted_profile_is_restorable() {
    let app = TestApp::new().await;

    let profile = app
        .directory
        .create_user_profile(profile_request(
            "1015404200",
            "Temporal",
            "Restaurable",
            BusinessRole::Customer,
            None,
        ))
        .await
        .unwrap();

    app.directory.soft_delete_user_profile(profile.id).await.unwrap();
    assert!(app
        .directory
        .get_user_profile(profile.id, false)
        .await
        .unwrap()
        .is_none());
    assert!(app
        .directory
        .get_user_profile(profile.id, true)
        .await
        .unwrap()
        .is_some());

    let restored = app.directory.restore_user_profile(profile.id).await.unwrap();
    assert!(restored.deleted_at.is_none());
}

#[tokio::test]
async fn transactions_list_filters_by_branch_and_kind() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-LIST", dec!(50)).await;

    for invoice in ["S-L1", "S-L2"] {
        let tx = app.open_sale(invoice).await;
        app.ledger
            .add_line(comercia_ledger::services::ledger::AddLineRequest {
                transaction_id: tx.id,
                product_id: product.id,
                quantity: dec!(1),
                unit_cost: dec!(1.00),
                lot: None,
                expires_on: None,
            })
            .await
            .unwrap();
        app.ledger.finalize(tx.id).await.unwrap();
    }
    app.open_purchase("P-L1").await;

    let (sales, total) = app
        .ledger
        .list_transactions(comercia_ledger::services::ledger::ListTransactionsQuery {
            branch_id: Some(app.branch.id),
            kind: Some(comercia_ledger::entities::enums::TransactionKind::Sale),
            page: 1,
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(sales.len(), 2);
}
