//! Payment status over HTTP: scenarios A-C and the stored-purchase lookup.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{add_return, dec, money, payment, purchase, TestApp};
use serde_json::json;
use settlement_service::models::{
    PaymentMethod, PaymentStatus, PurchaseStatus, TimelineEvent, TimelineEventType,
};
use uuid::Uuid;

#[tokio::test]
async fn half_paid_purchase_is_partially_paid() {
    let app = TestApp::spawn(vec![]);
    let mut snapshot = purchase("1000");
    snapshot.payments.push(payment(1, "500", PaymentMethod::Cash));

    let (status, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&body["remainingAmount"]), dec("500"));
    assert_eq!(body["displayStatus"], "Partially Paid");
    assert_eq!(body["displayBadgeColor"], "blue");
    assert_eq!(body["progressPercentage"], 50);
}

#[tokio::test]
async fn two_payments_covering_total_is_paid() {
    let app = TestApp::spawn(vec![]);
    let mut snapshot = purchase("1000");
    snapshot.payments.push(payment(1, "500", PaymentMethod::Cash));
    snapshot.payments.push(payment(2, "500", PaymentMethod::Check));

    let (status, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&body["remainingAmount"]), dec("0"));
    assert_eq!(body["displayStatus"], "Paid");
    assert_eq!(body["displayBadgeColor"], "green");
    assert_eq!(body["progressPercentage"], 100);
}

#[tokio::test]
async fn return_after_full_payment_is_refund_due() {
    let app = TestApp::spawn(vec![]);
    let mut snapshot = purchase("1000");
    snapshot.payments.push(payment(1, "1000", PaymentMethod::BankTransfer));
    add_return(&mut snapshot, "300", true);

    let (status, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&body["netOwed"]), dec("700"));
    assert_eq!(money(&body["overpaidAmount"]), dec("300"));
    assert_eq!(money(&body["refundDue"]), dec("300"));
    assert_eq!(body["displayStatus"], "Refund Due");
    assert_eq!(body["displayBadgeColor"], "purple");
    assert_eq!(body["showRefundSection"], true);
}

#[tokio::test]
async fn exact_decimal_payments_are_paid() {
    let app = TestApp::spawn(vec![]);
    let mut snapshot = purchase("0.30");
    snapshot.payments.push(payment(1, "0.10", PaymentMethod::Cash));
    snapshot.payments.push(payment(2, "0.20", PaymentMethod::Cash));

    let (_, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(body["displayStatus"], "Paid");
    assert_eq!(money(&body["remainingAmount"]), dec("0"));
}

#[tokio::test]
async fn void_payments_do_not_count() {
    let app = TestApp::spawn(vec![]);
    let mut snapshot = purchase("200");
    let mut void = payment(1, "200", PaymentMethod::Cash);
    void.status = PaymentStatus::Void;
    snapshot.payments.push(void);

    let (_, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(body["displayStatus"], "Unpaid");
    assert_eq!(body["displayBadgeColor"], "yellow");
    assert_eq!(money(&body["amountPaid"]), dec("0"));
}

#[tokio::test]
async fn cancelled_purchase_is_red() {
    let app = TestApp::spawn(vec![]);
    let mut snapshot = purchase("200");
    snapshot.purchase.status = PurchaseStatus::Cancelled;

    let (_, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(body["displayStatus"], "Cancelled");
    assert_eq!(body["displayBadgeColor"], "red");
}

#[tokio::test]
async fn resolved_balance_with_returns_is_settled() {
    let app = TestApp::spawn(vec![]);
    let mut snapshot = purchase("1000");
    snapshot.payments.push(payment(1, "700", PaymentMethod::Cash));
    add_return(&mut snapshot, "300", false);
    snapshot
        .timeline
        .push(TimelineEvent::new(TimelineEventType::BalanceResolved, Utc::now()));

    let (_, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(body["displayStatus"], "Settled");
    assert_eq!(body["balanceResolved"], true);
}

#[tokio::test]
async fn negative_total_is_bad_request() {
    let app = TestApp::spawn(vec![]);
    let snapshot = purchase("-5");

    let (status, body) = app
        .post("/payment-status", serde_json::to_value(&snapshot).unwrap())
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = TestApp::spawn(vec![]);

    let (status, _) = app
        .post("/payment-status", json!({ "purchase": { "total_amount": "10" } }))
        .await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn stored_purchase_status_by_id() {
    let mut snapshot = purchase("1000");
    snapshot.payments.push(payment(1, "250", PaymentMethod::CreditCard));
    let id = snapshot.purchase_id();
    let app = TestApp::spawn(vec![snapshot]);

    let (status, body) = app
        .get(&format!("/purchases/{}/payment-status", id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&body["remainingAmount"]), dec("750"));
    assert_eq!(body["progressPercentage"], 25);
}

#[tokio::test]
async fn unknown_purchase_is_404() {
    let app = TestApp::spawn(vec![]);

    let (status, body) = app
        .get(&format!("/purchases/{}/payment-status", Uuid::new_v4()))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}
