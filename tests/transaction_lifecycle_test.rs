//! Integration tests for the transaction lifecycle: totals, stock
//! movement at finalize, atomicity on shortfall, cancel and void.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use comercia_ledger::entities::transaction::TransactionStatus;
use comercia_ledger::errors::ServiceError;
use comercia_ledger::services::ledger::AddLineRequest;
use rust_decimal_macros::dec;

fn line(tx: uuid::Uuid, product: uuid::Uuid, quantity: rust_decimal::Decimal, unit_cost: rust_decimal::Decimal) -> AddLineRequest {
    AddLineRequest {
        transaction_id: tx,
        product_id: product,
        quantity,
        unit_cost,
        lot: None,
        expires_on: None,
    }
}

#[tokio::test]
async fn finalize_sale_moves_stock_and_settles_total() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("SKU-A", dec!(10)).await;
    let product_b = app.seed_product("SKU-B", dec!(8)).await;

    let tx = app.open_sale("S-0001").await;
    assert_eq!(tx.status, TransactionStatus::Draft);

    app.ledger
        .add_line(line(tx.id, product_a.id, dec!(3), dec!(4.00)))
        .await
        .unwrap();
    app.ledger
        .add_line(line(tx.id, product_b.id, dec!(2), dec!(2.50)))
        .await
        .unwrap();

    let in_progress = app.ledger.get_transaction(tx.id, false).await.unwrap().unwrap();
    assert_eq!(in_progress.status, TransactionStatus::InProgress);
    assert_eq!(in_progress.base_value, dec!(17.00));

    let finalized = app.ledger.finalize(tx.id).await.unwrap();
    assert_eq!(finalized.status, TransactionStatus::Finalized);
    assert_eq!(finalized.total, dec!(17.00));
    assert_eq!(finalized.total, finalized.base_value - finalized.discount);

    assert_eq!(app.current_stock(product_a.id).await, dec!(7));
    assert_eq!(app.current_stock(product_b.id).await, dec!(6));
}

#[tokio::test]
async fn finalize_applies_discount() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-DISC", dec!(10)).await;

    let tx = app.open_sale("S-0002").await;
    app.ledger
        .add_line(line(tx.id, product.id, dec!(2), dec!(10.00)))
        .await
        .unwrap();
    app.ledger.set_discount(tx.id, dec!(5.00)).await.unwrap();

    let finalized = app.ledger.finalize(tx.id).await.unwrap();
    assert_eq!(finalized.base_value, dec!(20.00));
    assert_eq!(finalized.total, dec!(15.00));
}

#[tokio::test]
async fn finalize_shortfall_rolls_every_stock_back() {
    let app = TestApp::new().await;
    let plentiful = app.seed_product("SKU-OK", dec!(100)).await;
    let scarce = app.seed_product("SKU-LOW", dec!(1)).await;

    let tx = app.open_sale("S-0003").await;
    app.ledger
        .add_line(line(tx.id, plentiful.id, dec!(5), dec!(1.00)))
        .await
        .unwrap();
    app.ledger
        .add_line(line(tx.id, scarce.id, dec!(3), dec!(1.00)))
        .await
        .unwrap();

    let err = app.ledger.finalize(tx.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock { .. });

    // Atomicity: the first line's decrement must not survive.
    assert_eq!(app.current_stock(plentiful.id).await, dec!(100));
    assert_eq!(app.current_stock(scarce.id).await, dec!(1));

    let tx = app.ledger.get_transaction(tx.id, false).await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::InProgress);
}

#[tokio::test]
async fn finalize_purchase_receives_stock() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-PUR", dec!(2)).await;

    let tx = app.open_purchase("P-0001").await;
    app.ledger
        .add_line(line(tx.id, product.id, dec!(10), dec!(5.00)))
        .await
        .unwrap();

    let finalized = app.ledger.finalize(tx.id).await.unwrap();
    assert_eq!(finalized.total, dec!(50.00));
    assert_eq!(app.current_stock(product.id).await, dec!(12));
}

#[tokio::test]
async fn empty_transaction_cannot_finalize() {
    let app = TestApp::new().await;

    let tx = app.open_sale("S-0004").await;
    let err = app.ledger.finalize(tx.id).await.unwrap_err();
    assert_matches!(err, ServiceError::EmptyTransaction(id) if id == tx.id);
}

#[tokio::test]
async fn finalized_transaction_rejects_new_lines() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-LATE", dec!(10)).await;

    let tx = app.open_sale("S-0005").await;
    app.ledger
        .add_line(line(tx.id, product.id, dec!(1), dec!(1.00)))
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();

    let err = app
        .ledger
        .add_line(line(tx.id, product.id, dec!(1), dec!(1.00)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidState { attempted: "add_line", .. });
}

#[tokio::test]
async fn cancel_is_only_legal_before_finalize() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-CXL", dec!(10)).await;

    let draft = app.open_sale("S-0006").await;
    let cancelled = app.ledger.cancel(draft.id).await.unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);

    let tx = app.open_sale("S-0007").await;
    app.ledger
        .add_line(line(tx.id, product.id, dec!(2), dec!(1.00)))
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();

    let err = app.ledger.cancel(tx.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidState { attempted: "cancel", .. });

    // Cancel never touches stock.
    assert_eq!(app.current_stock(product.id).await, dec!(8));
}

#[tokio::test]
async fn void_restores_pre_finalize_stock() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("SKU-VA", dec!(10)).await;
    let product_b = app.seed_product("SKU-VB", dec!(4)).await;

    let tx = app.open_sale("S-0008").await;
    app.ledger
        .add_line(line(tx.id, product_a.id, dec!(6), dec!(1.00)))
        .await
        .unwrap();
    app.ledger
        .add_line(line(tx.id, product_b.id, dec!(4), dec!(1.00)))
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();

    assert_eq!(app.current_stock(product_a.id).await, dec!(4));
    assert_eq!(app.current_stock(product_b.id).await, dec!(0));

    let voided = app.ledger.void(tx.id).await.unwrap();
    assert_eq!(voided.status, TransactionStatus::Voided);

    assert_eq!(app.current_stock(product_a.id).await, dec!(10));
    assert_eq!(app.current_stock(product_b.id).await, dec!(4));
}

#[tokio::test]
async fn void_requires_finalized_state() {
    let app = TestApp::new().await;

    let tx = app.open_sale("S-0009").await;
    let err = app.ledger.void(tx.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidState { attempted: "void", .. });
}

#[tokio::test]
async fn invoice_number_is_unique_per_branch_and_kind() {
    let app = TestApp::new().await;

    app.open_sale("S-0010").await;
    let err = app
        .ledger
        .open(comercia_ledger::services::ledger::OpenTransactionRequest {
            kind: comercia_ledger::entities::enums::TransactionKind::Sale,
            branch_id: app.branch.id,
            party_id: app.customer.id,
            employee_id: app.employee.id,
            invoice_number: "S-0010".to_string(),
            payment_method: comercia_ledger::entities::transaction::PaymentMethod::Cash,
            notes: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // The same number is fine for the other kind.
    app.open_purchase("S-0010").await;
}

#[tokio::test]
async fn soft_delete_cascades_to_lines_and_restore_revives_them() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-DEL", dec!(10)).await;

    let tx = app.open_sale("S-0011").await;
    app.ledger
        .add_line(line(tx.id, product.id, dec!(1), dec!(1.00)))
        .await
        .unwrap();

    app.ledger.soft_delete_transaction(tx.id).await.unwrap();

    assert!(app.ledger.get_transaction(tx.id, false).await.unwrap().is_none());
    assert!(app.ledger.get_lines(tx.id).await.unwrap().is_empty());
    assert!(app
        .ledger
        .get_transaction(tx.id, true)
        .await
        .unwrap()
        .is_some());

    let restored = app.ledger.restore_transaction(tx.id).await.unwrap();
    assert_eq!(restored.id, tx.id);
    assert_eq!(app.ledger.get_lines(tx.id).await.unwrap().len(), 1);
}
