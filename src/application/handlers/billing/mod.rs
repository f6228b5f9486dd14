//! Billing webhook handlers.
//!
//! One `WebhookHandler` per billing event type. Each decodes its provider
//! object from the event payload and forwards to `BillingActions`.
//!
//! A payload that does not decode into the expected object is a
//! `HandlerError::Permanent`; a `BillingActions` failure is
//! `HandlerError::Downstream`.

mod checkout_completed;
mod invoice;
mod payment_intent;
mod register;
mod subscription;

pub use checkout_completed::CheckoutCompletedHandler;
pub use invoice::{InvoicePaidHandler, InvoicePaymentFailedHandler};
pub use payment_intent::PaymentIntentSucceededHandler;
pub use register::register_billing_handlers;
pub use subscription::{SubscriptionChangedHandler, SubscriptionDeletedHandler};

use serde::de::DeserializeOwned;

use crate::domain::webhook::{HandlerError, WebhookEvent};

/// Typed view of `event.payload`.
fn decode_object<T: DeserializeOwned>(event: &WebhookEvent, kind: &str) -> Result<T, HandlerError> {
    event.deserialize_payload().map_err(|e| {
        HandlerError::Permanent(format!(
            "{} payload is not a valid {}: {}",
            event.event_type, kind, e
        ))
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::billing::{
        BillingEventContext, CheckoutSession, Invoice, PaymentIntent, Subscription,
    };
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::BillingActions;

    /// Records each call as `"<action>:<object id>"`.
    #[derive(Default)]
    pub struct RecordingBillingActions {
        pub calls: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl RecordingBillingActions {
        pub fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, action: &str, id: &str) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push(format!("{}:{}", action, id));
            if self.fail {
                Err(DomainError::new(
                    ErrorCode::DownstreamUnavailable,
                    "billing store unavailable",
                ))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl BillingActions for RecordingBillingActions {
        async fn checkout_completed(
            &self,
            _ctx: &BillingEventContext,
            user_id: &str,
            session: &CheckoutSession,
        ) -> Result<(), DomainError> {
            self.record("checkout_completed", &format!("{}@{}", session.id, user_id))
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
}
