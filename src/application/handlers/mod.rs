//! Webhook handlers registered with the dispatcher.

pub mod billing;

pub use billing::{
    register_billing_handlers, CheckoutCompletedHandler, InvoicePaidHandler,
    InvoicePaymentFailedHandler, PaymentIntentSucceededHandler, SubscriptionChangedHandler,
    SubscriptionDeletedHandler,
};
