//! Wires the billing handlers into a registry.

use std::sync::Arc;

use super::{
    CheckoutCompletedHandler, InvoicePaidHandler, InvoicePaymentFailedHandler,
    PaymentIntentSucceededHandler, SubscriptionChangedHandler, SubscriptionDeletedHandler,
};
use crate::domain::webhook::{HandlerRegistry, KnownEventType};
use crate::ports::BillingActions;

/// Registers one handler for every `KnownEventType`.
pub fn register_billing_handlers(
    registry: &mut HandlerRegistry,
    actions: Arc<dyn BillingActions>,
) -> &mut HandlerRegistry {
    let subscription_changed = Arc::new(SubscriptionChangedHandler::new(actions.clone()));

    registry
        .register(
            KnownEventType::CheckoutSessionCompleted.as_str(),
            Arc::new(CheckoutCompletedHandler::new(actions.clone())),
        )
        .register(
            KnownEventType::InvoicePaid.as_str(),
            Arc::new(InvoicePaidHandler::new(actions.clone())),
        )
        .register(
            KnownEventType::InvoicePaymentFailed.as_str(),
            Arc::new(InvoicePaymentFailedHandler::new(actions.clone())),
        )
        .register(
            KnownEventType::CustomerSubscriptionCreated.as_str(),
            subscription_changed.clone(),
        )
        .register(
            KnownEventType::CustomerSubscriptionUpdated.as_str(),
            subscription_changed,
        )
        .register(
            KnownEventType::CustomerSubscriptionDeleted.as_str(),
            Arc::new(SubscriptionDeletedHandler::new(actions.clone())),
        )
        .register(
            KnownEventType::PaymentIntentSucceeded.as_str(),
            Arc::new(PaymentIntentSucceededHandler::new(actions)),
        )
}
