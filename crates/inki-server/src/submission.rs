//! Submission Pipeline
//!
//! Turns a raw request body into accepted keys:
//!
//! ```text
//! Decoding -> ParsingPayload -> ValidatingKey -> ResolvingAnchor -> VerifyingSignature -> Accepted
//! ```
//!
//! Any stage may reject. Every envelope in a request is verified before the
//! registry is touched, so a request is committed entirely or not at all.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use inki_core::{decode, EnvelopeError, Key, KeyValidationError};

use crate::config::{ResolveError, TrustAnchorResolver};
use crate::keys::KeyRegistry;

/// Pipeline stage a request was rejected in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decoding,
    ParsingPayload,
    ValidatingKey,
    ResolvingAnchor,
    VerifyingSignature,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decoding => "decoding",
            Stage::ParsingPayload => "parsing_payload",
            Stage::ValidatingKey => "validating_key",
            Stage::ResolvingAnchor => "resolving_anchor",
            Stage::VerifyingSignature => "verifying_signature",
        };
        f.write_str(name)
    }
}

/// Reasons a submission is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Malformed request: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),

    #[error("Malformed key payload in envelope {index}: {reason}")]
    MalformedPayload { index: usize, reason: String },

    #[error("Invalid key in envelope {index}: {source}")]
    InvalidKey {
        index: usize,
        #[source]
        source: KeyValidationError,
    },

    #[error("User '{user}' is not allowed to register keys")]
    NotAllowed { user: String },

    #[error("Server configuration error: {0}")]
    ServerError(String),

    /// Deliberately carries no detail about the identities that were tried
    #[error("Request signature could not be verified")]
    Unauthorized,
}

impl SubmissionError {
    pub fn stage(&self) -> Stage {
        match self {
            SubmissionError::MalformedEnvelope(_) => Stage::Decoding,
            SubmissionError::MalformedPayload { .. } => Stage::ParsingPayload,
            SubmissionError::InvalidKey { .. } => Stage::ValidatingKey,
            SubmissionError::NotAllowed { .. } | SubmissionError::ServerError(_) => {
                Stage::ResolvingAnchor
            }
            SubmissionError::Unauthorized => Stage::VerifyingSignature,
        }
    }
}

impl From<ResolveError> for SubmissionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnknownUser(user) => SubmissionError::NotAllowed { user },
            ResolveError::Misconfigured { .. } => SubmissionError::ServerError(err.to_string()),
        }
    }
}

/// Verifies signed submissions and commits them to the registry
#[derive(Clone)]
pub struct SubmissionPipeline {
    resolver: Arc<dyn TrustAnchorResolver>,
    registry: Arc<KeyRegistry>,
}

impl SubmissionPipeline {
    pub fn new(resolver: Arc<dyn TrustAnchorResolver>, registry: Arc<KeyRegistry>) -> Self {
        Self { resolver, registry }
    }

    pub fn registry(&self) -> &Arc<KeyRegistry> {
        &self.registry
    }

    /// Run every check without touching the registry
    pub async fn verify_request(&self, body: &[u8]) -> Result<Vec<Key>, SubmissionError> {
        self.verify_request_at(body, Utc::now()).await
    }

    /// [`Self::verify_request`] with expiry judged at `now`
    pub async fn verify_request_at(
        &self,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<Key>, SubmissionError> {
        let result = self.check(body, now).await;
        if let Err(err) = &result {
            warn!(stage = %err.stage(), error = %err, "Rejected key submission");
        }
        result
    }

    /// Verify the request, then add every key it carries.
    ///
    /// Returns the accepted keys with their armored signature blocks.
    pub async fn submit(&self, body: &[u8]) -> Result<Vec<Key>, SubmissionError> {
        self.submit_at(body, Utc::now()).await
    }

    pub async fn submit_at(
        &self,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<Key>, SubmissionError> {
        let keys = self.verify_request_at(body, now).await?;

        for key in &keys {
            self.registry.add(key.clone());
        }

        if !keys.is_empty() {
            info!(accepted = keys.len(), "Accepted key submission");
        }
        Ok(keys)
    }

    async fn check(&self, body: &[u8], now: DateTime<Utc>) -> Result<Vec<Key>, SubmissionError> {
        let envelopes = decode(body)?;
        let mut accepted = Vec::with_capacity(envelopes.len());

        for (index, envelope) in envelopes.iter().enumerate() {
            let key: Key = envelope.decode_json().map_err(|e| {
                SubmissionError::MalformedPayload {
                    index,
                    reason: e.to_string(),
                }
            })?;

            key.validate_at(now)
                .map_err(|source| SubmissionError::InvalidKey { index, source })?;

            let anchor = self.resolver.resolve(&key.user).await?;

            anchor
                .verify(key.canonical_payload().as_bytes(), &envelope.signature)
                .map_err(|_| SubmissionError::Unauthorized)?;

            let signature = envelope.signature.armored().to_string();
            accepted.push(key.with_signature(signature));
        }

        Ok(accepted)
    }
}
