//! Billing domain - provider objects carried by billing webhook events.
//!
//! Only the fields the billing side effects need are modelled; every other
//! field in the provider payload is ignored on decode.

mod objects;

pub use objects::{
    BillingEventContext, CheckoutMode, CheckoutSession, Invoice, PaymentIntent, Subscription,
    USER_ID_METADATA_KEY,
};
