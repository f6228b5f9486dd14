//! BillingActions that only record what would happen.
//!
//! Default wiring for the binary until real entitlement storage is
//! plugged in; every side effect becomes a structured log line.

use async_trait::async_trait;

use crate::domain::billing::{
    BillingEventContext, CheckoutMode, CheckoutSession, Invoice, PaymentIntent, Subscription,
};
use crate::domain::foundation::DomainError;
use crate::ports::BillingActions;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingBillingActions;

impl LoggingBillingActions {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BillingActions for LoggingBillingActions {
    async fn checkout_completed(
        &self,
        ctx: &BillingEventContext,
        user_id: &str,
        session: &CheckoutSession,
    ) -> Result<(), DomainError> {
        match session.mode {
            CheckoutMode::Subscription => tracing::info!(
                event_id = %ctx.event_id,
                user_id = %user_id,
                subscription = ?session.subscription,
                "Subscription created for user"
            ),
            CheckoutMode::Payment => tracing::info!(
                event_id = %ctx.event_id,
                user_id = %user_id,
                amount_total = ?session.amount_total,
                "Payment completed for user"
            ),
            mode => tracing::info!(
                event_id = %ctx.event_id,
                user_id = %user_id,
                mode = ?mode,
                "Checkout completed"
            ),
        }
        Ok(())
    }

    async fn invoice_paid(
        &self,
        ctx: &BillingEventContext,
        invoice: &Invoice,
    ) -> Result<(), DomainError> {
        tracing::info!(
            event_id = %ctx.event_id,
            invoice_id = %invoice.id,
            amount_paid = invoice.amount_paid,
            "Invoice paid"
        );
        Ok(())
    }

    async fn invoice_payment_failed(
        &self,
        ctx: &BillingEventContext,
        invoice: &Invoice,
    ) -> Result<(), DomainError> {
        tracing::warn!(
            event_id = %ctx.event_id,
            invoice_id = %invoice.id,
            attempt_count = invoice.attempt_count,
            "Invoice payment failed"
        );
        Ok(())
    }

    async fn subscription_changed(
        &self,
        ctx: &BillingEventContext,
        subscription: &Subscription,
    ) -> Result<(), DomainError> {
        tracing::info!(
            event_id = %ctx.event_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Subscription updated"
        );
        Ok(())
    }

    async fn subscription_deleted(
        &self,
        ctx: &BillingEventContext,
        subscription: &Subscription,
    ) -> Result<(), DomainError> {
        tracing::info!(
            event_id = %ctx.event_id,
            subscription_id = %subscription.id,
            "Subscription cancelled"
        );
        Ok(())
    }

    async fn payment_intent_succeeded(
        &self,
        ctx: &BillingEventContext,
        intent: &PaymentIntent,
    ) -> Result<(), DomainError> {
        tracing::info!(
            event_id = %ctx.event_id,
            payment_intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            "PaymentIntent succeeded"
        );
        Ok(())
    }
}
