//! Handlers for `invoice.paid` and `invoice.payment_failed`.

use std::sync::Arc;

use async_trait::async_trait;

use super::decode_object;
use crate::domain::billing::{BillingEventContext, Invoice};
use crate::domain::webhook::{HandlerError, WebhookEvent, WebhookHandler};
use crate::ports::BillingActions;

/// Extends access and records the receipt for a paid invoice.
pub struct InvoicePaidHandler {
    actions: Arc<dyn BillingActions>,
}

impl InvoicePaidHandler {
    pub fn new(actions: Arc<dyn BillingActions>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl WebhookHandler for InvoicePaidHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError> {
        let invoice: Invoice = decode_object(event, "invoice")?;
        self.actions
            .invoice_paid(&BillingEventContext::from(event), &invoice)
            .await?;
        Ok(())
    }
}

/// Flags the customer after a failed collection attempt.
pub struct InvoicePaymentFailedHandler {
    actions: Arc<dyn BillingActions>,
}

impl InvoicePaymentFailedHandler {
    pub fn new(actions: Arc<dyn BillingActions>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl WebhookHandler for InvoicePaymentFailedHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError> {
        let invoice: Invoice = decode_object(event, "invoice")?;
        self.actions
            .invoice_payment_failed(&BillingEventContext::from(event), &invoice)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::test_support::RecordingBillingActions;
    use serde_json::json;

    #[tokio::test]
    async fn paid_invoice_is_forwarded() {
        let actions = Arc::new(RecordingBillingActions::default());
        let event = WebhookEvent::new("evt_1", "invoice.paid")
            .with_payload(json!({"id": "in_1", "amount_paid": 1000, "currency": "usd"}));

        InvoicePaidHandler::new(actions.clone())
            .handle(&event)
            .await
            .unwrap();

        assert_eq!(actions.calls(), vec!["invoice_paid:in_1"]);
    }

    #[tokio::test]
    async fn failed_invoice_is_forwarded() {
        let actions = Arc::new(RecordingBillingActions::default());
        let event = WebhookEvent::new("evt_1", "invoice.payment_failed")
            .with_payload(json!({"id": "in_2", "attempt_count": 2}));

        InvoicePaymentFailedHandler::new(actions.clone())
            .handle(&event)
            .await
            .unwrap();

        assert_eq!(actions.calls(), vec!["invoice_payment_failed:in_2"]);
    }

    #[tokio::test]
    async fn non_object_payload_is_permanent_failure() {
        let event = WebhookEvent::new("evt_1", "invoice.paid");

        let result = InvoicePaidHandler::new(Arc::new(RecordingBillingActions::default()))
            .handle(&event)
            .await;

        assert!(matches!(result, Err(HandlerError::Permanent(_))));
    }
}
