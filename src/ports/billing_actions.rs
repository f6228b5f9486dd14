//! BillingActions port - business side effects of billing webhooks.
//!
//! The bundled billing handlers decode provider objects and call into this
//! port. Implementations update entitlements, send receipts and so on; the
//! webhook pipeline treats them as opaque.
//!
//! Every method may be called more than once for the same event id (a
//! failed attempt is retried on redelivery), so implementations must be
//! idempotent on `ctx.event_id`.

use async_trait::async_trait;

use crate::domain::billing::{
    BillingEventContext, CheckoutSession, Invoice, PaymentIntent, Subscription,
};
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait BillingActions: Send + Sync {
    /// A checkout session for `user_id` completed.
    async fn checkout_completed(
        &self,
        ctx: &BillingEventContext,
        user_id: &str,
        session: &CheckoutSession,
    ) -> Result<(), DomainError>;

    /// An invoice was paid (initial or renewal).
    async fn invoice_paid(
        &self,
        ctx: &BillingEventContext,
        invoice: &Invoice,
    ) -> Result<(), DomainError>;

    /// Collecting an invoice failed.
    async fn invoice_payment_failed(
        &self,
        ctx: &BillingEventContext,
        invoice: &Invoice,
    ) -> Result<(), DomainError>;

    /// A subscription was created or updated.
    async fn subscription_changed(
        &self,
        ctx: &BillingEventContext,
        subscription: &Subscription,
    ) -> Result<(), DomainError>;

    /// A subscription ended.
    async fn subscription_deleted(
        &self,
        ctx: &BillingEventContext,
        subscription: &Subscription,
    ) -> Result<(), DomainError>;

    /// A one-off payment intent succeeded.
    async fn payment_intent_succeeded(
        &self,
        ctx: &BillingEventContext,
        intent: &PaymentIntent,
    ) -> Result<(), DomainError>;
}
