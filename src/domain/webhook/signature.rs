//! Webhook signature verification.
//!
//! Implements verification of provider signatures using HMAC-SHA256 over
//! `"{t}.{raw body}"`, with a symmetric freshness window around the
//! injected `now` to defeat replay of captured payloads.

use std::time::Duration;

use axum::body::Bytes;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

use super::errors::VerificationError;
use crate::domain::foundation::Timestamp;

/// Default freshness tolerance (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Parsed components from the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp asserted by the provider.
    pub timestamp: i64,
    /// Every `v1` signature (HMAC-SHA256), in header order.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>...][,v0=<legacy>]`
    ///
    /// Unknown keys are ignored for forward compatibility.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::MalformedHeader` if the header format is
    /// invalid, the timestamp is missing, or there is no `v1` entry.
    pub fn parse(header: &str) -> Result<Self, VerificationError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| malformed("invalid header format"))?;

            match key.trim() {
                "t" => {
                    if timestamp.is_some() {
                        return Err(malformed("duplicate timestamp"));
                    }
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| malformed("invalid timestamp"))?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex::decode(value.trim())
                            .map_err(|_| malformed("invalid v1 signature hex"))?,
                    );
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| malformed("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(malformed("missing v1 signature"));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

fn malformed(reason: &str) -> VerificationError {
    VerificationError::MalformedHeader(reason.to_string())
}

/// Output of successful verification.
///
/// Can only be produced by [`SignatureVerifier`], so holding one proves the
/// body was authenticated.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    body: Bytes,
    timestamp: Timestamp,
}

impl SignedEnvelope {
    /// The exact bytes that were verified.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The timestamp asserted in the signature header.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[cfg(test)]
    pub(crate) fn trusted(body: impl Into<Bytes>, timestamp: Timestamp) -> Self {
        Self {
            body: body.into(),
            timestamp,
        }
    }
}

/// Shared secret and freshness window used by the verifier.
pub struct VerifierConfig {
    secret: SecretString,
    tolerance: Duration,
}

impl VerifierConfig {
    /// Creates a config with the default 300 second tolerance.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            tolerance: Duration::from_secs(DEFAULT_TOLERANCE_SECS),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }
}

impl std::fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("secret", &"[REDACTED]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

/// Verifier for webhook signatures.
#[derive(Debug)]
pub struct SignatureVerifier {
    config: VerifierConfig,
}

impl SignatureVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Verifies a delivery against the configured secret and tolerance.
    pub fn verify(
        &self,
        raw_body: Bytes,
        signature_header: Option<&str>,
        now: Timestamp,
    ) -> Result<SignedEnvelope, VerificationError> {
        verify(
            raw_body,
            signature_header,
            self.config.secret.expose_secret().as_bytes(),
            now,
            self.config.tolerance,
        )
    }
}

/// Verifies a signed payload. Pure function of its inputs.
///
/// # Verification Steps
///
/// 1. Reject an empty secret
/// 2. Parse the signature header
/// 3. Validate `|now - t| <= tolerance`
/// 4. Compute the expected HMAC-SHA256 over `"{t}.{raw body}"`
/// 5. Compare against every `v1` value in constant time
///
/// # Errors
///
/// - `EmptySecret` - No secret configured
/// - `MissingHeader` - Header absent or blank
/// - `MalformedHeader` - Header could not be parsed
/// - `StaleTimestamp` - Timestamp outside the tolerance window
/// - `SignatureMismatch` - No `v1` value matched
pub fn verify(
    raw_body: Bytes,
    signature_header: Option<&str>,
    secret: &[u8],
    now: Timestamp,
    tolerance: Duration,
) -> Result<SignedEnvelope, VerificationError> {
    if secret.is_empty() {
        return Err(VerificationError::EmptySecret);
    }

    let header = match signature_header.map(str::trim) {
        Some(h) if !h.is_empty() => SignatureHeader::parse(h)?,
        _ => return Err(VerificationError::MissingHeader),
    };

    let age_secs = now.as_unix_secs().abs_diff(header.timestamp);
    if age_secs > tolerance.as_secs() {
        return Err(VerificationError::StaleTimestamp);
    }
    let timestamp = Timestamp::from_unix_secs(header.timestamp)
        .ok_or_else(|| malformed("timestamp out of range"))?;

    let expected = expected_mac(secret, header.timestamp, &raw_body);
    let matched = header
        .v1_signatures
        .iter()
        .fold(Choice::from(0), |acc, candidate| {
            acc | Choice::from(constant_time_compare(&expected, candidate) as u8)
        });
    if !bool::from(matched) {
        return Err(VerificationError::SignatureMismatch);
    }

    Ok(SignedEnvelope {
        body: raw_body,
        timestamp,
    })
}

/// Computes the HMAC-SHA256 of the canonical signed string.
///
/// The body bytes are fed to the MAC as-is; they are never decoded.
fn expected_mac(secret: &[u8], timestamp: i64, body: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Hex-encoded `v1` signature for a body, as the provider would compute it.
pub fn compute_signature(secret: &str, timestamp: i64, body: &[u8]) -> String {
    hex::encode(expected_mac(secret.as_bytes(), timestamp, body))
}

/// A complete `t=...,v1=...` header for a body.
pub fn sign_header(secret: &str, timestamp: i64, body: &[u8]) -> String {
    format!(
        "t={},v1={}",
        timestamp,
        compute_signature(secret, timestamp, body)
    )
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
