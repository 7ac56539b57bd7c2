//! SSH key entity
//!
//! A `Key` binds one SSH public key to a user account until an expiry time.
//! Keys are compared by identity (`user` + `public_key`); the expiry and the
//! signature that accompanied a submission are not part of that identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Reasons a key fails validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyValidationError {
    #[error("Invalid SSH public key: {0}")]
    InvalidPublicKey(String),

    #[error("Key expired at {0}")]
    Expired(DateTime<Utc>),
}

/// An SSH public key registered for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// When the key stops being valid
    #[serde(rename = "expire")]
    pub expires: DateTime<Utc>,

    /// OpenSSH authorized-key line, e.g. `ssh-ed25519 AAAA... comment`
    #[serde(rename = "key")]
    pub public_key: String,

    /// Account the key grants access to
    pub user: String,

    /// Armored signature block the key was submitted with.
    /// Transport-time only; never serialized.
    #[serde(skip)]
    pub signature: Option<String>,
}

/// Field set covered by a submission signature. Order is protocol.
#[derive(Serialize)]
struct SigningData<'a> {
    expire: &'a DateTime<Utc>,
    key: &'a str,
    user: &'a str,
}

impl Key {
    pub fn new(user: impl Into<String>, public_key: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            expires,
            public_key: public_key.into(),
            user: user.into(),
            signature: None,
        }
    }

    /// Attach the armored signature block that accompanied this key
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Validate against the current time
    pub fn validate(&self) -> Result<(), KeyValidationError> {
        self.validate_at(Utc::now())
    }

    /// Validate key syntax, then expiry relative to `now`.
    ///
    /// A key whose expiry equals `now` is already expired.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), KeyValidationError> {
        self.parse_public_key()?;

        if self.is_expired_at(now) {
            return Err(KeyValidationError::Expired(self.expires));
        }

        Ok(())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }

    /// Lowercase hex SHA-256 of the key's SSH wire encoding.
    ///
    /// Returns an empty string when the key does not parse; an empty
    /// fingerprint never matches anything.
    pub fn fingerprint(&self) -> String {
        match self.parse_public_key().map(|k| k.to_bytes()) {
            Ok(Ok(wire)) => hex::encode(Sha256::digest(&wire)),
            _ => String::new(),
        }
    }

    /// Text covered by the submission signature: compact JSON of
    /// `{expire, key, user}` on a single line.
    pub fn canonical_payload(&self) -> String {
        let data = SigningData {
            expire: &self.expires,
            key: &self.public_key,
            user: &self.user,
        };

        // Serializing borrowed strings and a timestamp cannot fail
        serde_json::to_string(&data).unwrap_or_default()
    }

    /// Same user and same key material; expiry and signature are ignored
    pub fn identity_equals(&self, other: &Key) -> bool {
        self.user == other.user && self.public_key == other.public_key
    }

    /// The key as a single `authorized_keys` line, without line terminator
    pub fn authorized_key_line(&self) -> &str {
        self.public_key.trim()
    }

    /// Parse the key as exactly one OpenSSH line
    fn parse_public_key(&self) -> Result<ssh_key::PublicKey, KeyValidationError> {
        let line = self.public_key.trim();
        if line.contains(['\n', '\r']) {
            return Err(KeyValidationError::InvalidPublicKey(
                "key spans more than one line".into(),
            ));
        }

        ssh_key::PublicKey::from_openssh(line)
            .map_err(|e| KeyValidationError::InvalidPublicKey(e.to_string()))
    }
}
