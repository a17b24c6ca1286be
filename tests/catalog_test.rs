//! Integration tests for the catalog: soft-delete visibility, category
//! uniqueness and hierarchy, the single-primary association invariant and
//! stock adjustments.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use comercia_ledger::errors::ServiceError;
use comercia_ledger::services::catalog::CreateCategoryRequest;
use rust_decimal_macros::dec;

fn category_request(name: &str, parent_id: Option<uuid::Uuid>) -> CreateCategoryRequest {
    CreateCategoryRequest {
        name: name.to_string(),
        description: None,
        parent_id,
    }
}

#[tokio::test]
async fn soft_deleted_product_is_hidden_from_default_reads() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-HIDE", dec!(5)).await;

    app.catalog
        .soft_delete_product(product.id)
        .await
        .expect("soft delete");

    let default_read = app.catalog.get_product(product.id, false).await.unwrap();
    assert!(default_read.is_none());

    let with_deleted = app.catalog.get_product(product.id, true).await.unwrap();
    let model = with_deleted.expect("still retrievable with the flag");
    assert!(model.deleted_at.is_some());

    let restored = app.catalog.restore_product(product.id).await.unwrap();
    assert!(restored.deleted_at.is_none());
}

#[tokio::test]
async fn duplicate_category_name_under_same_parent_is_rejected() {
    let app = TestApp::new().await;

    let root = app
        .catalog
        .create_category(category_request("Bebidas", None))
        .await
        .unwrap();

    let err = app
        .catalog
        .create_category(category_request("Bebidas", None))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::DuplicateName(_));

    // Same name under a different parent is fine.
    app.catalog
        .create_category(category_request("Bebidas", Some(root.id)))
        .await
        .expect("same name under another parent");
}

#[tokio::test]
async fn reparent_refuses_cycles() {
    let app = TestApp::new().await;

    let parent = app
        .catalog
        .create_category(category_request("Abarrotes", None))
        .await
        .unwrap();
    let child = app
        .catalog
        .create_category(category_request("Granos", Some(parent.id)))
        .await
        .unwrap();
    let grandchild = app
        .catalog
        .create_category(category_request("Arroz", Some(child.id)))
        .await
        .unwrap();

    let err = app
        .catalog
        .reparent_category(parent.id, Some(grandchild.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let err = app
        .catalog
        .reparent_category(parent.id, Some(parent.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    // A legal move still works.
    app.catalog
        .reparent_category(grandchild.id, Some(parent.id))
        .await
        .expect("reparent to grandparent");
}

#[tokio::test]
async fn deleting_parent_category_detaches_children() {
    let app = TestApp::new().await;

    let parent = app
        .catalog
        .create_category(category_request("Lacteos", None))
        .await
        .unwrap();
    let child = app
        .catalog
        .create_category(category_request("Quesos", Some(parent.id)))
        .await
        .unwrap();

    app.catalog
        .soft_delete_category(parent.id)
        .await
        .expect("delete parent");

    let child = app
        .catalog
        .get_category(child.id, false)
        .await
        .unwrap()
        .expect("child survives");
    assert_eq!(child.parent_id, None);
}

#[tokio::test]
async fn second_primary_assignment_demotes_the_first() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-PRIM", dec!(1)).await;

    let c1 = app
        .catalog
        .create_category(category_request("Aseo", None))
        .await
        .unwrap();
    let c2 = app
        .catalog
        .create_category(category_request("Hogar", None))
        .await
        .unwrap();

    app.catalog
        .assign_category(product.id, c1.id, true)
        .await
        .unwrap();
    app.catalog
        .assign_category(product.id, c2.id, true)
        .await
        .unwrap();

    let associations = app.catalog.product_categories(product.id).await.unwrap();
    assert_eq!(associations.len(), 2);

    let primaries: Vec<_> = associations.iter().filter(|a| a.is_primary).collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].category_id, c2.id);
}

#[tokio::test]
async fn repeated_association_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-DUP", dec!(1)).await;

    let category = app
        .catalog
        .create_category(category_request("Dulces", None))
        .await
        .unwrap();

    app.catalog
        .assign_category(product.id, category.id, false)
        .await
        .unwrap();

    let err = app
        .catalog
        .assign_category(product.id, category.id, true)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::DuplicateAssociation { .. });
}

#[tokio::test]
async fn adjust_stock_enforces_the_floor_unless_overridden() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-ADJ", dec!(10)).await;

    let new_stock = app
        .catalog
        .adjust_stock(product.id, dec!(-4), false, None)
        .await
        .unwrap();
    assert_eq!(new_stock, dec!(6));

    let err = app
        .catalog
        .adjust_stock(product.id, dec!(-7), false, None)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InsufficientStock { available, requested, .. } => {
            assert_eq!(available, dec!(6));
            assert_eq!(requested, dec!(7));
        }
    );
    assert_eq!(app.current_stock(product.id).await, dec!(6));

    // Administrative override may drive the quantity negative.
    let corrected = app
        .catalog
        .adjust_stock(product.id, dec!(-7), true, Some("inventory audit".to_string()))
        .await
        .unwrap();
    assert_eq!(corrected, dec!(-1));
}

#[tokio::test]
async fn stock_flag_flips_at_zero_crossings() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-FLAG", dec!(3)).await;

    app.catalog
        .adjust_stock(product.id, dec!(-3), false, None)
        .await
        .unwrap();
    let drained = app
        .catalog
        .get_product(product.id, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        drained.status,
        comercia_ledger::entities::product::ProductStatus::OutOfStock
    );

    app.catalog
        .adjust_stock(product.id, dec!(5), false, None)
        .await
        .unwrap();
    let restocked = app
        .catalog
        .get_product(product.id, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        restocked.status,
        comercia_ledger::entities::product::ProductStatus::Active
    );
}

#[tokio::test]
async fn product_with_transaction_lines_cannot_be_deleted() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-PROT", dec!(10)).await;

    let tx = app.open_sale("S-PROT-1").await;
    app.ledger
        .add_line(comercia_ledger::services::ledger::AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(1),
            unit_cost: dec!(2.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();

    let err = app.catalog.soft_delete_product(product.id).await.unwrap_err();
    assert_matches!(err, ServiceError::ReferentialIntegrity(_));
}
