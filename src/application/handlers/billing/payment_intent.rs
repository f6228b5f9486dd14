//! Handler for `payment_intent.succeeded`.

use std::sync::Arc;

use async_trait::async_trait;

use super::decode_object;
use crate::domain::billing::{BillingEventContext, PaymentIntent};
use crate::domain::webhook::{HandlerError, WebhookEvent, WebhookHandler};
use crate::ports::BillingActions;

/// Fulfils one-off payments made outside checkout.
pub struct PaymentIntentSucceededHandler {
    actions: Arc<dyn BillingActions>,
}

impl PaymentIntentSucceededHandler {
    pub fn new(actions: Arc<dyn BillingActions>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl WebhookHandler for PaymentIntentSucceededHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError> {
        let intent: PaymentIntent = decode_object(event, "payment intent")?;
        self.actions
            .payment_intent_succeeded(&BillingEventContext::from(event), &intent)
            .await?;
        Ok(())
    }
}
