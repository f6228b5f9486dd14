//! Decodes a verified body into a [`WebhookEvent`].

use serde::Deserialize;

use super::errors::ParseError;
use super::event::WebhookEvent;
use super::signature::SignedEnvelope;
use crate::domain::foundation::Timestamp;

/// Provider event envelope as it appears on the wire.
///
/// Additional fields from the provider's full schema are ignored.
#[derive(Debug, Deserialize)]
struct WireEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    data: Option<WireEventData>,
    #[serde(default)]
    livemode: bool,
    #[serde(default)]
    api_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEventData {
    #[serde(default)]
    object: serde_json::Value,
    #[serde(default)]
    previous_attributes: Option<serde_json::Value>,
}

/// Stateless decoder for verified webhook bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventParser;

impl EventParser {
    /// Extracts `id`, `type`, `created` and the type-specific payload.
    ///
    /// The payload's internal shape is not validated.
    ///
    /// # Errors
    ///
    /// `ParseError::MalformedPayload` when the body is not JSON, lacks `id`
    /// or `type`, has an empty `id`/`type`, or carries an unrepresentable
    /// `created` value.
    pub fn parse(envelope: &SignedEnvelope) -> Result<WebhookEvent, ParseError> {
        let wire: WireEvent = serde_json::from_slice(envelope.body())
            .map_err(|e| ParseError::MalformedPayload(e.to_string()))?;

        if wire.id.trim().is_empty() {
            return Err(ParseError::MalformedPayload("empty event id".to_string()));
        }
        if wire.event_type.trim().is_empty() {
            return Err(ParseError::MalformedPayload("empty event type".to_string()));
        }

        let created = wire
            .created
            .map(|secs| {
                Timestamp::from_unix_secs(secs).ok_or_else(|| {
                    ParseError::MalformedPayload(format!("created out of range: {}", secs))
                })
            })
            .transpose()?;

        let (payload, previous_attributes) = match wire.data {
            Some(data) => (data.object, data.previous_attributes),
            None => (serde_json::Value::Null, None),
        };

        Ok(WebhookEvent {
            id: wire.id,
            event_type: wire.event_type,
            created,
            payload,
            previous_attributes,
            livemode: wire.livemode,
            api_version: wire.api_version,
        })
    }
}
