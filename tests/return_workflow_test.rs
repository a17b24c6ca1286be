//! Integration tests for the return workflow: filing limits, historical
//! pricing, inverse stock movement and terminal states. Includes the
//! end-to-end purchase/return scenario.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use comercia_ledger::entities::return_entity::{ReturnReason, ReturnStatus};
use comercia_ledger::errors::ServiceError;
use comercia_ledger::services::ledger::AddLineRequest;
use comercia_ledger::services::returns::FileReturnRequest;
use rust_decimal_macros::dec;

fn return_request(line_id: uuid::Uuid, quantity: rust_decimal::Decimal, employee: uuid::Uuid) -> FileReturnRequest {
    FileReturnRequest {
        transaction_line_id: line_id,
        quantity,
        reason: ReturnReason::Defective,
        employee_id: employee,
        notes: Some("customer reported damage".to_string()),
        number: None,
    }
}

#[tokio::test]
async fn purchase_then_return_scenario() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-X", dec!(0)).await;

    // Open purchase "F-001", add (qty=10, unit cost=5.00), finalize.
    let tx = app.open_purchase("F-001").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(10),
            unit_cost: dec!(5.00),
            lot: Some("L-42".to_string()),
            expires_on: None,
        })
        .await
        .unwrap();

    let finalized = app.ledger.finalize(tx.id).await.unwrap();
    assert_eq!(finalized.total, dec!(50.00));
    assert_eq!(app.current_stock(product.id).await, dec!(10));

    // File a return of 4 units and process it: stock drops by 4 and the
    // refund settles at the line's historical price.
    let lines = app.ledger.get_lines(tx.id).await.unwrap();
    let filed = app
        .returns
        .file_return(return_request(lines[0].id, dec!(4), app.employee.id))
        .await
        .unwrap();
    assert_eq!(filed.status, ReturnStatus::Pending);
    assert_eq!(filed.refund_amount, dec!(0));

    let processed = app.returns.process(filed.id).await.unwrap();
    assert_eq!(processed.status, ReturnStatus::Processed);
    assert_eq!(processed.refund_amount, dec!(20.00));
    assert_eq!(app.current_stock(product.id).await, dec!(6));
}

#[tokio::test]
async fn over_return_is_rejected_and_exact_remainder_succeeds() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-OVER", dec!(20)).await;

    let tx = app.open_sale("S-RET-1").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(5),
            unit_cost: dec!(2.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();
    let line = &app.ledger.get_lines(tx.id).await.unwrap()[0];

    app.returns
        .file_return(return_request(line.id, dec!(3), app.employee.id))
        .await
        .unwrap();

    // 3 of 5 are already held; 4 more cannot fit.
    let err = app
        .returns
        .file_return(return_request(line.id, dec!(4), app.employee.id))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::OverReturn { remaining, requested, .. } => {
            assert_eq!(remaining, dec!(2));
            assert_eq!(requested, dec!(4));
        }
    );

    // Exactly the remainder is accepted.
    app.returns
        .file_return(return_request(line.id, dec!(2), app.employee.id))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_returns_release_their_hold() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-REL", dec!(20)).await;

    let tx = app.open_sale("S-RET-2").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(4),
            unit_cost: dec!(1.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();
    let line = &app.ledger.get_lines(tx.id).await.unwrap()[0];

    let filed = app
        .returns
        .file_return(return_request(line.id, dec!(4), app.employee.id))
        .await
        .unwrap();
    let cancelled = app.returns.cancel(filed.id).await.unwrap();
    assert_eq!(cancelled.status, ReturnStatus::Cancelled);
    // No stock movement for a cancelled return.
    assert_eq!(app.current_stock(product.id).await, dec!(16));

    // The full quantity is returnable again.
    app.returns
        .file_return(return_request(line.id, dec!(4), app.employee.id))
        .await
        .expect("hold released");
}

#[tokio::test]
async fn sale_return_restocks_on_process() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-RST", dec!(10)).await;

    let tx = app.open_sale("S-RET-3").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(6),
            unit_cost: dec!(3.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();
    assert_eq!(app.current_stock(product.id).await, dec!(4));

    let line = &app.ledger.get_lines(tx.id).await.unwrap()[0];
    let filed = app
        .returns
        .file_return(return_request(line.id, dec!(2), app.employee.id))
        .await
        .unwrap();
    let processed = app.returns.process(filed.id).await.unwrap();

    assert_eq!(processed.refund_amount, dec!(6.00));
    assert_eq!(app.current_stock(product.id).await, dec!(6));
}

#[tokio::test]
async fn returns_require_a_finalized_transaction() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-NF", dec!(10)).await;

    let tx = app.open_sale("S-RET-4").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(1),
            unit_cost: dec!(1.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();

    let line = &app.ledger.get_lines(tx.id).await.unwrap()[0];
    let err = app
        .returns
        .file_return(return_request(line.id, dec!(1), app.employee.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidLineState(_));
}

#[tokio::test]
async fn processed_returns_are_terminal() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-TERM", dec!(10)).await;

    let tx = app.open_sale("S-RET-5").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(2),
            unit_cost: dec!(1.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();

    let line = &app.ledger.get_lines(tx.id).await.unwrap()[0];
    let filed = app
        .returns
        .file_return(return_request(line.id, dec!(1), app.employee.id))
        .await
        .unwrap();
    app.returns.process(filed.id).await.unwrap();

    let err = app.returns.cancel(filed.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidState { attempted: "cancel", .. });
    let err = app.returns.reject(filed.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidState { attempted: "reject", .. });
    let err = app.returns.process(filed.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidState { attempted: "process", .. });
}

#[tokio::test]
async fn return_numbers_are_sequential_per_branch() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-NUM", dec!(30)).await;

    let tx = app.open_sale("S-RET-6").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: tx.id,
            product_id: product.id,
            quantity: dec!(9),
            unit_cost: dec!(1.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();
    app.ledger.finalize(tx.id).await.unwrap();
    let line = &app.ledger.get_lines(tx.id).await.unwrap()[0];

    let first = app
        .returns
        .file_return(return_request(line.id, dec!(1), app.employee.id))
        .await
        .unwrap();
    let second = app
        .returns
        .file_return(return_request(line.id, dec!(1), app.employee.id))
        .await
        .unwrap();

    assert_eq!(first.number, "R-00001");
    assert_eq!(second.number, "R-00002");

    // An explicit number must not collide.
    let err = app
        .returns
        .file_return(FileReturnRequest {
            number: Some("R-00002".to_string()),
            ..return_request(line.id, dec!(1), app.employee.id)
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn voiding_a_purchase_fails_when_stock_already_left() {
    let app = TestApp::new().await;
    let product = app.seed_product("SKU-GONE", dec!(0)).await;

    let purchase = app.open_purchase("P-GONE-1").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: purchase.id,
            product_id: product.id,
            quantity: dec!(5),
            unit_cost: dec!(1.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();
    app.ledger.finalize(purchase.id).await.unwrap();

    // Sell everything that was received.
    let sale = app.open_sale("S-GONE-1").await;
    app.ledger
        .add_line(AddLineRequest {
            transaction_id: sale.id,
            product_id: product.id,
            quantity: dec!(5),
            unit_cost: dec!(1.00),
            lot: None,
            expires_on: None,
        })
        .await
        .unwrap();
    app.ledger.finalize(sale.id).await.unwrap();

    // Reversing the purchase would need 5 units that are no longer there.
    let err = app.ledger.void(purchase.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock { .. });
}
