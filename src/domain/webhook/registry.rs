//! Handler registry - maps event type strings to handlers.
//!
//! The registry is built once at startup, then shared read-only as
//! `Arc<HandlerRegistry>`. Types without a handler are acknowledged by the
//! dispatcher without running anything.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::errors::HandlerError;
use super::event::WebhookEvent;

/// Handler for one webhook event type.
///
/// Implementations must tolerate being invoked more than once for the same
/// event id: a failed attempt is retried on redelivery.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError>;
}

/// Adapts an async closure into a [`WebhookHandler`].
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(WebhookEvent) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> WebhookHandler for HandlerFn<F>
where
    F: Fn(WebhookEvent) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync,
{
    async fn handle(&self, event: &WebhookEvent) -> Result<(), HandlerError> {
        (self.f)(event.clone()).await
    }
}

/// Event type → handler lookup table.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn WebhookHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event_type`.
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register(
        &mut self,
        event_type: impl Into<String>,
        handler: Arc<dyn WebhookHandler>,
    ) -> &mut Self {
        let event_type = event_type.into();
        if self.handlers.insert(event_type.clone(), handler).is_some() {
            tracing::warn!(event_type = %event_type, "Replaced existing webhook handler");
        }
        self
    }

    /// Registers an async closure for `event_type`.
    ///
    /// ```ignore
    /// registry.register_fn("invoice.paid", |event| async move {
    ///     tracing::info!(event_id = %event.id, "paid");
    ///     Ok(())
    /// });
    /// ```
    pub fn register_fn<F, Fut>(&mut self, event_type: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(WebhookEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let handler = HandlerFn::new(
            move |event: WebhookEvent| -> BoxFuture<'static, Result<(), HandlerError>> {
                Box::pin(f(event))
            },
        );
        self.register(event_type, Arc::new(handler))
    }

    /// Handler for `event_type`, if one is registered. Matching is exact.
    pub fn lookup(&self, event_type: &str) -> Option<Arc<dyn WebhookHandler>> {
        self.handlers.get(event_type).cloned()
    }

    /// Registered type strings, sorted.
    pub fn registered_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
