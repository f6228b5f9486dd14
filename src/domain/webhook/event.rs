//! Webhook event types.
//!
//! `WebhookEvent` is the decoded form of a verified delivery. Its `id` is
//! stable across redeliveries and is the sole deduplication key.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Decoded webhook event.
///
/// Only the envelope is interpreted; `payload` is handed to handlers
/// untouched, and they own its validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Provider-assigned identifier (evt_xxx format).
    pub id: String,

    /// Type tag (e.g., "checkout.session.completed").
    pub event_type: String,

    /// When the provider created the event.
    pub created: Option<Timestamp>,

    /// The object that triggered the event (`data.object` on the wire).
    pub payload: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    pub api_version: Option<String>,
}

impl WebhookEvent {
    /// Creates an event with an empty payload.
    pub fn new(id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            created: None,
            payload: serde_json::Value::Null,
            previous_attributes: None,
            livemode: false,
            api_version: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_created(mut self, created: Timestamp) -> Self {
        self.created = Some(created);
        self
    }

    /// Attempts to deserialize the payload as the specified type.
    pub fn deserialize_payload<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    /// Parse the event type into a known enum variant.
    pub fn known_type(&self) -> Option<KnownEventType> {
        KnownEventType::parse(&self.event_type)
    }
}

/// Event types the bundled billing handlers understand.
///
/// Routing is string-keyed; this enum only names the types registered by
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownEventType {
    /// Checkout session completed successfully.
    CheckoutSessionCompleted,
    /// Invoice paid (initial or renewal).
    InvoicePaid,
    /// Invoice payment failed.
    InvoicePaymentFailed,
    /// Customer subscription was created.
    CustomerSubscriptionCreated,
    /// Customer subscription was updated.
    CustomerSubscriptionUpdated,
    /// Customer subscription was deleted.
    CustomerSubscriptionDeleted,
    /// One-off payment intent succeeded.
    PaymentIntentSucceeded,
}

impl KnownEventType {
    pub const ALL: [KnownEventType; 7] = [
        Self::CheckoutSessionCompleted,
        Self::InvoicePaid,
        Self::InvoicePaymentFailed,
        Self::CustomerSubscriptionCreated,
        Self::CustomerSubscriptionUpdated,
        Self::CustomerSubscriptionDeleted,
        Self::PaymentIntentSucceeded,
    ];

    /// Parse event type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checkout.session.completed" => Some(Self::CheckoutSessionCompleted),
            "invoice.paid" => Some(Self::InvoicePaid),
            "invoice.payment_failed" => Some(Self::InvoicePaymentFailed),
            "customer.subscription.created" => Some(Self::CustomerSubscriptionCreated),
            "customer.subscription.updated" => Some(Self::CustomerSubscriptionUpdated),
            "customer.subscription.deleted" => Some(Self::CustomerSubscriptionDeleted),
            "payment_intent.succeeded" => Some(Self::PaymentIntentSucceeded),
            _ => None,
        }
    }

    /// Convert to the provider's event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::InvoicePaid => "invoice.paid",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::CustomerSubscriptionCreated => "customer.subscription.created",
            Self::CustomerSubscriptionUpdated => "customer.subscription.updated",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
        }
    }
}

impl std::fmt::Display for KnownEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_types_round_trip_through_strings() {
        for known in KnownEventType::ALL {
            assert_eq!(KnownEventType::parse(known.as_str()), Some(known));
        }
    }

    #[test]
    fn unknown_type_is_none() {
        assert_eq!(KnownEventType::parse("charge.refunded"), None);
        assert_eq!(WebhookEvent::new("evt_1", "x.y").known_type(), None);
    }

    #[test]
    fn deserialize_payload_reads_typed_view() {
        #[derive(Deserialize)]
        struct Invoice {
            id: String,
            amount_paid: i64,
        }

        let event = WebhookEvent::new("evt_1", "invoice.paid")
            .with_payload(json!({"id": "in_123", "amount_paid": 1000, "extra": true}));

        let invoice: Invoice = event.deserialize_payload().unwrap();

        assert_eq!(invoice.id, "in_123");
        assert_eq!(invoice.amount_paid, 1000);
    }

    #[test]
    fn deserialize_payload_reports_shape_mismatch() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Invoice {
            id: String,
        }

        let event = WebhookEvent::new("evt_1", "invoice.paid").with_payload(json!([1, 2]));

        assert!(event.deserialize_payload::<Invoice>().is_err());
    }
}
