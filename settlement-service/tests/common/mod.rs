//! Common test utilities for settlement-service integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use settlement_service::config::SettlementConfig;
use settlement_service::models::{
    Payment, PaymentMethod, PaymentStatus, Purchase, PurchaseReturn, PurchaseSnapshot,
    PurchaseStatus, RefundStatus, ReturnStatus,
};
use settlement_service::services::InMemorySettlementStore;
use settlement_service::{build_router, AppState};
use std::str::FromStr;
use std::sync::{Arc, Once};
use tower::util::ServiceExt;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,settlement_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Read a money field serialized as a decimal string.
pub fn money(value: &Value) -> Decimal {
    let raw = value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    Decimal::from_str(&raw).unwrap_or_else(|_| panic!("not a decimal: {}", value))
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemorySettlementStore>,
}

impl TestApp {
    pub fn spawn(snapshots: Vec<PurchaseSnapshot>) -> Self {
        Self::with_config(snapshots, SettlementConfig::default())
    }

    pub fn with_config(snapshots: Vec<PurchaseSnapshot>, config: SettlementConfig) -> Self {
        init_tracing();
        let store = Arc::new(InMemorySettlementStore::from_snapshots(snapshots));
        let state = AppState::new(config, store.clone());
        Self {
            router: build_router(state),
            store,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::POST, uri, None).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

pub fn payment(day: u32, amount: &str, method: PaymentMethod) -> Payment {
    Payment {
        payment_id: Uuid::new_v4(),
        amount: dec(amount),
        payment_date: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
        status: PaymentStatus::Active,
        payment_method: method,
        created_utc: None,
    }
}

pub fn purchase(total: &str) -> PurchaseSnapshot {
    PurchaseSnapshot::new(Purchase {
        purchase_id: Uuid::new_v4(),
        total_amount: dec(total),
        status: PurchaseStatus::Received,
    })
}

pub fn add_return(snapshot: &mut PurchaseSnapshot, amount: &str, eligible: bool) -> Uuid {
    let ret = PurchaseReturn {
        return_id: Uuid::new_v4(),
        purchase_id: snapshot.purchase_id(),
        total_amount: dec(amount),
        return_date: Utc.with_ymd_and_hms(2024, 3, 20, 14, 0, 0).unwrap(),
        status: ReturnStatus::Approved,
        refund_status: RefundStatus::Pending,
        auto_refund_eligible: eligible,
        refund_failure_reason: None,
    };
    let id = ret.return_id;
    snapshot.returns.push(ret);
    id
}
