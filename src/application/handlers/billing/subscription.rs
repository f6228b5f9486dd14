//! Handlers for subscription lifecycle events.
//!
//! Subscription events may arrive out of order. `BillingActions`
//! implementations should compare `ctx.created` against what they last
//! applied before overwriting state.

use std::sync::Arc;

use async_trait::async_trait;

use super::decode_object;
use crate::domain::billing::{BillingEventContext, Subscription};
use crate::domain::webhook::{HandlerError, WebhookEvent, WebhookHandler};
use crate::ports::BillingActions;

/// Handles `customer.subscription.created` and `customer.subscription.updated`.
pub struct SubscriptionChangedHandler {
    actions: Arc<dyn BillingActions>,
}

impl SubscriptionChangedHandler {
    pub fn new(actions: Arc<dyn BillingActions>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl WebhookHandler for SubscriptionChangedHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError> {
        let subscription: Subscription = decode_object(event, "subscription")?;
        self.actions
            .subscription_changed(&BillingEventContext::from(event), &subscription)
            .await?;
        Ok(())
    }
}

/// Handles `customer.subscription.deleted`.
pub struct SubscriptionDeletedHandler {
    actions: Arc<dyn BillingActions>,
}

impl SubscriptionDeletedHandler {
    pub fn new(actions: Arc<dyn BillingActions>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl WebhookHandler for SubscriptionDeletedHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError> {
        let subscription: Subscription = decode_object(event, "subscription")?;
        self.actions
            .subscription_deleted(&BillingEventContext::from(event), &subscription)
            .await?;
        Ok(())
    }
}
