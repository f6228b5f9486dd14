//! Provider objects as they arrive in `data.object`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::webhook::WebhookEvent;

/// Checkout metadata key that links a session to an application user.
pub const USER_ID_METADATA_KEY: &str = "userId";

/// Event fields passed alongside every billing object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingEventContext {
    pub event_id: String,
    pub event_type: String,
    pub created: Option<Timestamp>,
    pub livemode: bool,
}

impl From<&WebhookEvent> for BillingEventContext {
    fn from(event: &WebhookEvent) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            created: event.created,
            livemode: event.livemode,
        }
    }
}

/// Checkout session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    Payment,
    Setup,
    Subscription,
    #[serde(other)]
    Unknown,
}

/// Checkout Session object (cs_...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,

    /// Customer ID if a customer was created or attached.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription ID when the session created a subscription.
    #[serde(default)]
    pub subscription: Option<String>,

    pub mode: CheckoutMode,

    /// Total in the smallest currency unit.
    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Application user the session was opened for, if recorded.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .get(USER_ID_METADATA_KEY)
            .map(String::as_str)
            .filter(|id| !id.trim().is_empty())
    }
}

/// Invoice object (in_...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,

    #[serde(default)]
    pub customer: Option<String>,

    /// Associated subscription ID.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Invoice status (draft, open, paid, void, uncollectible).
    #[serde(default)]
    pub status: Option<String>,

    /// Amount paid in cents.
    #[serde(default)]
    pub amount_paid: i64,

    /// Amount due in cents.
    #[serde(default)]
    pub amount_due: i64,

    #[serde(default)]
    pub currency: Option<String>,

    /// Number of payment attempts made.
    #[serde(default)]
    pub attempt_count: i32,
}

/// Subscription object (sub_...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,

    pub customer: String,

    /// Provider status (trialing, active, past_due, canceled, ...).
    pub status: String,

    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// PaymentIntent object (pi_...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,

    /// Amount in the smallest currency unit.
    pub amount: i64,

    pub currency: String,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}
