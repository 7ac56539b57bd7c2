//! Composable key queries

use chrono::{DateTime, Utc};

use inki_core::Key;

/// A filter over registry entries.
///
/// `And` and `Or` evaluate their left side first and skip the right side
/// when the result is already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPredicate {
    /// Same user and key material as the given key
    IdentityEquals(Key),
    UserEquals(String),
    /// Matches the key's fingerprint; an empty fingerprint never matches
    FingerprintEquals(String),
    NotExpired,
    /// `now >= expires`, the exact complement of `NotExpired`
    Expired,
    And(Box<KeyPredicate>, Box<KeyPredicate>),
    Or(Box<KeyPredicate>, Box<KeyPredicate>),
}

impl KeyPredicate {
    pub fn identity_equals(key: &Key) -> Self {
        KeyPredicate::IdentityEquals(key.clone())
    }

    pub fn user_equals(user: impl Into<String>) -> Self {
        KeyPredicate::UserEquals(user.into())
    }

    pub fn fingerprint_equals(fingerprint: impl Into<String>) -> Self {
        KeyPredicate::FingerprintEquals(fingerprint.into())
    }

    pub fn and(self, other: KeyPredicate) -> Self {
        KeyPredicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: KeyPredicate) -> Self {
        KeyPredicate::Or(Box::new(self), Box::new(other))
    }

    pub fn matches(&self, key: &Key) -> bool {
        self.matches_at(key, Utc::now())
    }

    /// Evaluate against `key` with expiry judged at `now`
    pub fn matches_at(&self, key: &Key, now: DateTime<Utc>) -> bool {
        match self {
            KeyPredicate::IdentityEquals(other) => key.identity_equals(other),
            KeyPredicate::UserEquals(user) => key.user == *user,
            KeyPredicate::FingerprintEquals(fingerprint) => {
                !fingerprint.is_empty() && key.fingerprint() == *fingerprint
            }
            KeyPredicate::NotExpired => !key.is_expired_at(now),
            KeyPredicate::Expired => key.is_expired_at(now),
            KeyPredicate::And(left, right) => {
                left.matches_at(key, now) && right.matches_at(key, now)
            }
            KeyPredicate::Or(left, right) => {
                left.matches_at(key, now) || right.matches_at(key, now)
            }
        }
    }
}
