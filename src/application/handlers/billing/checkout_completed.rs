//! Handler for `checkout.session.completed`.

use std::sync::Arc;

use async_trait::async_trait;

use super::decode_object;
use crate::domain::billing::{BillingEventContext, CheckoutSession};
use crate::domain::webhook::{HandlerError, WebhookEvent, WebhookHandler};
use crate::ports::BillingActions;

pub struct CheckoutCompletedHandler {
    actions: Arc<dyn BillingActions>,
}

impl CheckoutCompletedHandler {
    pub fn new(actions: Arc<dyn BillingActions>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl WebhookHandler for CheckoutCompletedHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError> {
        let session: CheckoutSession = decode_object(event, "checkout session")?;

        // Sessions opened outside the app carry no user; nothing to link.
        let Some(user_id) = session.user_id() else {
            tracing::error!(
                event_id = %event.id,
                session_id = %session.id,
                "Missing userId in checkout session metadata; skipping"
            );
            return Ok(());
        };

        let ctx = BillingEventContext::from(event);
        self.actions
            .checkout_completed(&ctx, user_id, &session)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::test_support::RecordingBillingActions;
    use serde_json::json;

    fn event(object: serde_json::Value) -> WebhookEvent {
        WebhookEvent::new("evt_1", "checkout.session.completed").with_payload(object)
    }

    #[tokio::test]
    async fn forwards_session_with_user() {
        let actions = Arc::new(RecordingBillingActions::default());
        let handler = CheckoutCompletedHandler::new(actions.clone());

        handler
            .handle(&event(json!({
                "id": "cs_1",
                "mode": "subscription",
                "subscription": "sub_1",
                "metadata": {"userId": "user_42"}
            })))
            .await
            .unwrap();

        assert_eq!(actions.calls(), vec!["checkout_completed:cs_1@user_42"]);
    }

    #[tokio::test]
    async fn session_without_user_is_acknowledged_and_skipped() {
        let actions = Arc::new(RecordingBillingActions::default());
        let handler = CheckoutCompletedHandler::new(actions.clone());

        let result = handler
            .handle(&event(json!({"id": "cs_1", "mode": "payment"})))
            .await;

        assert!(result.is_ok());
        assert!(actions.calls().is_empty());
    }

    #[tokio::test]
    async fn undecodable_session_is_permanent_failure() {
        let handler = CheckoutCompletedHandler::new(Arc::new(RecordingBillingActions::default()));

        let result = handler.handle(&event(json!({"mode": "payment"}))).await;

        assert!(matches!(result, Err(HandlerError::Permanent(_))));
    }

    #[tokio::test]
    async fn billing_failure_is_downstream_error() {
        let handler = CheckoutCompletedHandler::new(Arc::new(RecordingBillingActions::failing()));

        let result = handler
            .handle(&event(json!({
                "id": "cs_1",
                "mode": "payment",
                "metadata": {"userId": "user_42"}
            })))
            .await;

        assert!(matches!(result, Err(HandlerError::Downstream(_))));
    }
}
