//! Integration tests for the webhook HTTP endpoint.
//!
//! These drive the full axum router with the in-memory store and a fixed
//! clock:
//! 1. Accepted, rejected and replayed deliveries
//! 2. Processing records left behind by each outcome
//! 3. Routing of provider events to the billing actions

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderName, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use payment_webhooks::adapters::http::{webhook_router, WebhookAppState};
use payment_webhooks::adapters::{FixedClock, InMemoryIdempotencyStore};
use payment_webhooks::application::register_billing_handlers;
use payment_webhooks::domain::billing::{
    BillingEventContext, CheckoutSession, Invoice, PaymentIntent, Subscription,
};
use payment_webhooks::domain::foundation::{DomainError, ErrorCode, Timestamp};
use payment_webhooks::domain::webhook::{
    sign_header, HandlerError, HandlerRegistry, ProcessingStatus, SignatureVerifier,
    VerifierConfig, WebhookDispatcher, WebhookEvent,
};
use payment_webhooks::ports::{BillingActions, IdempotencyStore};

const SECRET: &str = "whsec_integration_secret";
const NOW: i64 = 1_704_067_200;
const PATH: &str = "/webhooks/stripe";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    store: Arc<InMemoryIdempotencyStore>,
    clock: Arc<FixedClock>,
}

impl TestApp {
    fn new(registry: HandlerRegistry) -> Self {
        let store = Arc::new(InMemoryIdempotencyStore::new());
        let clock = Arc::new(FixedClock::new(Timestamp::from_unix_secs(NOW).unwrap()));
        let dispatcher = WebhookDispatcher::new(
            SignatureVerifier::new(VerifierConfig::new(SECRET)),
            store.clone(),
            Arc::new(registry),
            clock.clone(),
        );
        let state = WebhookAppState::new(
            Arc::new(dispatcher),
            HeaderName::from_static("stripe-signature"),
        );

        Self {
            router: webhook_router(state, PATH, 1024 * 1024),
            store,
            clock,
        }
    }

    async fn post(&self, body: &str, signature: Option<String>) -> (StatusCode, Value) {
        let mut request = Request::post(PATH).header("content-type", "application/json");
        if let Some(signature) = signature {
            request = request.header("Stripe-Signature", signature);
        }
        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn status_of(&self, event_id: &str) -> Option<ProcessingStatus> {
        self.store
            .find(event_id)
            .await
            .unwrap()
            .map(|record| record.status)
    }
}

fn signed(body: &str, timestamp: i64) -> Option<String> {
    Some(sign_header(SECRET, timestamp, body.as_bytes()))
}

/// Records every billing action call as `"<action>:<object id>"`.
#[derive(Default)]
struct RecordingActions {
    calls: Mutex<Vec<String>>,
}

impl RecordingActions {
    fn record(&self, action: &str, id: &str) -> Result<(), DomainError> {
        self.calls.lock().unwrap().push(format!("{}:{}", action, id));
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingActions for RecordingActions {
    async fn checkout_completed(
        &self,
        _ctx: &BillingEventContext,
        user_id: &str,
        session: &CheckoutSession,
    ) -> Result<(), DomainError> {
        self.record("checkout_completed", &format!("{}/{}", session.id, user_id))
    }

    async fn invoice_paid(
        &self,
        _ctx: &BillingEventContext,
        invoice: &Invoice,
    ) -> Result<(), DomainError> {
        self.record("invoice_paid", &invoice.id)
    }

    async fn invoice_payment_failed(
        &self,
        _ctx: &BillingEventContext,
        invoice: &Invoice,
    ) -> Result<(), DomainError> {
        self.record("invoice_payment_failed", &invoice.id)
    }

    async fn subscription_changed(
        &self,
        _ctx: &BillingEventContext,
        subscription: &Subscription,
    ) -> Result<(), DomainError> {
        self.record("subscription_changed", &subscription.id)
    }

    async fn subscription_deleted(
        &self,
        _ctx: &BillingEventContext,
        subscription: &Subscription,
    ) -> Result<(), DomainError> {
        self.record("subscription_deleted", &subscription.id)
    }

    async fn payment_intent_succeeded(
        &self,
        _ctx: &BillingEventContext,
        intent: &PaymentIntent,
    ) -> Result<(), DomainError> {
        self.record("payment_intent_succeeded", &intent.id)
    }
}

// =============================================================================
// Delivery Scenarios
// =============================================================================

#[tokio::test]
async fn unregistered_type_is_acknowledged_and_recorded() {
    let app = TestApp::new(HandlerRegistry::new());
    let body = r#"{"id":"evt_1","type":"x.y"}"#;

    let (status, json) = app.post(body, signed(body, NOW)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["received"], true);
    assert_eq!(json["outcome"], "succeeded");
    assert_eq!(json["detail"], "no_handler");
    assert_eq!(app.status_of("evt_1").await, Some(ProcessingStatus::Succeeded));
}

#[tokio::test]
async fn replay_after_tolerance_is_rejected_without_record() {
    let app = TestApp::new(HandlerRegistry::new());
    let body = r#"{"id":"evt_1","type":"x.y"}"#;
    app.clock.advance_secs(5 * 60 + 1);

    let (status, json) = app.post(body, signed(body, NOW)).await;

    assert!(status.is_client_error());
    assert_eq!(json["detail"], "STALE_TIMESTAMP");
    assert_eq!(app.status_of("evt_1").await, None);
}

#[tokio::test]
async fn delivery_at_tolerance_boundary_is_accepted() {
    let app = TestApp::new(HandlerRegistry::new());
    let body = r#"{"id":"evt_1","type":"x.y"}"#;
    app.clock.advance_secs(300);

    let (status, _) = app.post(body, signed(body, NOW)).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn always_failing_handler_is_retried_on_redelivery() {
    let mut registry = HandlerRegistry::new();
    let calls = Arc::new(Mutex::new(0u32));
    let counter = calls.clone();
    registry.register_fn("y.z", move |_event: WebhookEvent| {
        let counter = counter.clone();
        async move {
            *counter.lock().unwrap() += 1;
            Err(HandlerError::Transient("downstream unavailable".to_string()))
        }
    });
    let app = TestApp::new(registry);
    let body = r#"{"id":"evt_2","type":"y.z"}"#;

    let (first, json) = app.post(body, signed(body, NOW)).await;
    assert_eq!(first, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["received"], false);
    assert_eq!(app.status_of("evt_2").await, Some(ProcessingStatus::Failed));

    let (second, _) = app.post(body, signed(body, NOW)).await;
    assert_eq!(second, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(*calls.lock().unwrap(), 2);

    let record = app.store.find("evt_2").await.unwrap().unwrap();
    assert_eq!(record.attempts, 2);
    assert!(record.last_error.unwrap().contains("downstream unavailable"));
}

#[tokio::test]
async fn redelivery_after_success_runs_nothing() {
    let actions = Arc::new(RecordingActions::default());
    let mut registry = HandlerRegistry::new();
    register_billing_handlers(&mut registry, actions.clone());
    let app = TestApp::new(registry);
    let body = json!({
        "id": "evt_3",
        "type": "invoice.paid",
        "data": {"object": {"id": "in_1", "amount_paid": 1000}}
    })
    .to_string();

    let (first, _) = app.post(&body, signed(&body, NOW)).await;
    let (second, json) = app.post(&body, signed(&body, NOW + 60)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(json["outcome"], "duplicate");
    assert_eq!(json["detail"], "already_succeeded");
    assert_eq!(actions.calls(), vec!["invoice_paid:in_1"]);
}

#[tokio::test]
async fn tampered_body_is_unauthorized() {
    let app = TestApp::new(HandlerRegistry::new());
    let original = r#"{"id":"evt_4","type":"x.y"}"#;
    let tampered = r#"{"id":"evt_4","type":"x.z"}"#;

    let (status, json) = app.post(tampered, signed(original, NOW)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["detail"], "SIGNATURE_MISMATCH");
    assert_eq!(app.status_of("evt_4").await, None);
}

#[tokio::test]
async fn malformed_signature_header_is_bad_request() {
    let app = TestApp::new(HandlerRegistry::new());

    let (status, json) = app
        .post(r#"{"id":"evt_5","type":"x.y"}"#, Some("garbage".to_string()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "MALFORMED_HEADER");
}

#[tokio::test]
async fn signed_but_malformed_body_is_bad_request() {
    let app = TestApp::new(HandlerRegistry::new());
    let body = r#"{"type":"x.y"}"#;

    let (status, json) = app.post(body, signed(body, NOW)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "MALFORMED_PAYLOAD");
    assert!(app.store.is_empty().await);
}

// =============================================================================
// Billing Routing
// =============================================================================

#[tokio::test]
async fn billing_events_reach_their_actions() {
    let actions = Arc::new(RecordingActions::default());
    let mut registry = HandlerRegistry::new();
    register_billing_handlers(&mut registry, actions.clone());
    let app = TestApp::new(registry);

    let deliveries = [
        json!({
            "id": "evt_a",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_1", "mode": "subscription", "metadata": {"userId": "user-1"}}}
        }),
        json!({
            "id": "evt_b",
            "type": "customer.subscription.updated",
            "data": {"object": {"id": "sub_1", "customer": "cus_1", "status": "active"}}
        }),
        json!({
            "id": "evt_c",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_1", "amount": 500, "currency": "usd"}}
        }),
    ];

    for delivery in deliveries {
        let body = delivery.to_string();
        let (status, _) = app.post(&body, signed(&body, NOW)).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(
        actions.calls(),
        vec![
            "checkout_completed:cs_1/user-1",
            "subscription_changed:sub_1",
            "payment_intent_succeeded:pi_1",
        ]
    );
}

#[tokio::test]
async fn undecodable_billing_object_fails_the_delivery() {
    let actions = Arc::new(RecordingActions::default());
    let mut registry = HandlerRegistry::new();
    register_billing_handlers(&mut registry, actions.clone());
    let app = TestApp::new(registry);
    let body = json!({"id": "evt_d", "type": "invoice.paid", "data": {"object": [1, 2]}}).to_string();

    let (status, _) = app.post(&body, signed(&body, NOW)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(actions.calls().is_empty());
    assert_eq!(app.status_of("evt_d").await, Some(ProcessingStatus::Failed));
}

#[tokio::test]
async fn downstream_error_is_recorded_as_failure() {
    struct Unavailable;

    #[async_trait]
    impl BillingActions for Unavailable {
        async fn checkout_completed(
            &self,
            _: &BillingEventContext,
            _: &str,
            _: &CheckoutSession,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn invoice_paid(&self, _: &BillingEventContext, _: &Invoice) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::DownstreamUnavailable, "ledger offline"))
        }
        async fn invoice_payment_failed(
            &self,
            _: &BillingEventContext,
            _: &Invoice,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn subscription_changed(
            &self,
            _: &BillingEventContext,
            _: &Subscription,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn subscription_deleted(
            &self,
            _: &BillingEventContext,
            _: &Subscription,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn payment_intent_succeeded(
            &self,
            _: &BillingEventContext,
            _: &PaymentIntent,
        ) -> Result<(), DomainError> {
            Ok(())
        }
    }

    let mut registry = HandlerRegistry::new();
    register_billing_handlers(&mut registry, Arc::new(Unavailable));
    let app = TestApp::new(registry);
    let body = json!({"id": "evt_e", "type": "invoice.paid", "data": {"object": {"id": "in_9"}}})
        .to_string();

    let (status, json) = app.post(&body, signed(&body, NOW)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "HANDLER_FAILED");
    let record = app.store.find("evt_e").await.unwrap().unwrap();
    assert!(record.last_error.unwrap().contains("ledger offline"));
}
