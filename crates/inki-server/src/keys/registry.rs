//! Key Registry
//!
//! Thread-safe, ordered store of the keys the server currently knows about.
//! Every operation holds the lock for its whole duration and does no I/O
//! while holding it.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use inki_core::Key;

use super::predicate::KeyPredicate;

/// Ordered set of keys, unique by identity (user + key material)
#[derive(Debug, Default)]
pub struct KeyRegistry {
    keys: Mutex<Vec<Key>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an existing snapshot, keeping its order
    pub fn from_keys(keys: Vec<Key>) -> Self {
        let registry = Self::new();
        for key in keys {
            registry.add(key);
        }
        registry
    }

    // Every critical section leaves the vector consistent, so a panic in
    // another holder never leaves it half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<Key>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert `key`, or renew the expiry of an identity-equal entry.
    ///
    /// The submission signature is not stored. Returns `true` when a new
    /// entry was appended.
    pub fn add(&self, mut key: Key) -> bool {
        key.signature = None;
        let mut keys = self.lock();

        if let Some(existing) = keys.iter_mut().find(|k| k.identity_equals(&key)) {
            debug!(
                user = %key.user,
                previous = %existing.expires,
                expires = %key.expires,
                "Renewed key"
            );
            existing.expires = key.expires;
            return false;
        }

        info!(user = %key.user, expires = %key.expires, "Added key");
        keys.push(key);
        true
    }

    /// Remove every key matching `predicate`, returning how many were removed
    pub fn remove(&self, predicate: &KeyPredicate) -> usize {
        self.remove_at(predicate, Utc::now())
    }

    pub fn remove_at(&self, predicate: &KeyPredicate, now: DateTime<Utc>) -> usize {
        let mut keys = self.lock();
        let (removed, kept): (Vec<Key>, Vec<Key>) = std::mem::take(&mut *keys)
            .into_iter()
            .partition(|k| predicate.matches_at(k, now));
        *keys = kept;

        if !removed.is_empty() {
            info!(removed = removed.len(), remaining = keys.len(), "Removed keys");
        }
        removed.len()
    }

    /// Remove the entry identity-equal to `key`
    pub fn remove_key(&self, key: &Key) -> bool {
        self.remove(&KeyPredicate::identity_equals(key)) > 0
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All keys matching `predicate`, in registry order
    pub fn query(&self, predicate: &KeyPredicate) -> Vec<Key> {
        self.query_at(predicate, Utc::now())
    }

    pub fn query_at(&self, predicate: &KeyPredicate, now: DateTime<Utc>) -> Vec<Key> {
        self.lock()
            .iter()
            .filter(|k| predicate.matches_at(k, now))
            .cloned()
            .collect()
    }

    /// First key matching `predicate`
    pub fn query_one(&self, predicate: &KeyPredicate) -> Option<Key> {
        self.query_one_at(predicate, Utc::now())
    }

    pub fn query_one_at(&self, predicate: &KeyPredicate, now: DateTime<Utc>) -> Option<Key> {
        self.lock()
            .iter()
            .find(|k| predicate.matches_at(k, now))
            .cloned()
    }

    /// Snapshot of every key, expired ones included
    pub fn all(&self) -> Vec<Key> {
        self.lock().clone()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.lock().iter().any(|k| k.identity_equals(key))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    const KEY_1: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAILM+rvN+ot98qgEN796jTiQfZfG1KaT0PtFDJ/XFSqti foo@bar.com";
    const KEY_2: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGEW1bH0rXyjU8kM2EZxzcwBm0aFMJtGyqy8TMZsOn1E bob@host";

    fn key(user: &str, public_key: &str, expires: DateTime<Utc>) -> Key {
        Key::new(user, public_key, expires)
    }

    #[test]
    fn test_add_and_query() {
        let registry = KeyRegistry::new();
        let now = Utc::now();

        assert!(registry.add(key("alice", KEY_1, now + Duration::hours(1))));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());

        let found = registry.query(&KeyPredicate::user_equals("alice"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].public_key, KEY_1);
    }

    #[test]
    fn test_add_strips_signature() {
        let registry = KeyRegistry::new();
        registry.add(key("alice", KEY_1, Utc::now()).with_signature("sig"));
        assert_eq!(registry.all()[0].signature, None);
    }

    #[test]
    fn test_add_renews_existing_entry() {
        let registry = KeyRegistry::new();
        let now = Utc::now();

        assert!(registry.add(key("alice", KEY_1, now + Duration::hours(1))));
        assert!(!registry.add(key("alice", KEY_1, now + Duration::hours(5))));

        let all = registry.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].expires, now + Duration::hours(5));
    }

    #[test]
    fn test_renewal_accepts_shorter_expiry() {
        let registry = KeyRegistry::new();
        let now = Utc::now();

        registry.add(key("alice", KEY_1, now + Duration::hours(5)));
        registry.add(key("alice", KEY_1, now + Duration::hours(1)));

        assert_eq!(registry.all()[0].expires, now + Duration::hours(1));
    }

    #[test]
    fn test_same_key_for_different_users_is_distinct() {
        let registry = KeyRegistry::new();
        let now = Utc::now();

        registry.add(key("alice", KEY_1, now));
        registry.add(key("bob", KEY_1, now));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_by_user() {
        let now = Utc::now();
        let registry = KeyRegistry::from_keys(vec![
            key("bob", KEY_1, now),
            key("alice", KEY_1, now),
            key("bob", KEY_2, now),
        ]);

        assert_eq!(registry.remove(&KeyPredicate::user_equals("bob")), 2);

        let remaining = registry.all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user, "alice");
    }

    #[test]
    fn test_remove_nothing() {
        let registry = KeyRegistry::from_keys(vec![key("alice", KEY_1, Utc::now())]);
        assert_eq!(registry.remove(&KeyPredicate::user_equals("carol")), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_key() {
        let now = Utc::now();
        let k = key("alice", KEY_1, now);
        let registry = KeyRegistry::from_keys(vec![k.clone(), key("alice", KEY_2, now)]);

        assert!(registry.remove_key(&k));
        assert!(!registry.contains(&k));
        assert!(!registry.remove_key(&k));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_expired() {
        let now = Utc::now();
        let registry = KeyRegistry::from_keys(vec![
            key("alice", KEY_1, now - Duration::minutes(1)),
            key("alice", KEY_2, now + Duration::minutes(1)),
        ]);

        assert_eq!(registry.remove_at(&KeyPredicate::Expired, now), 1);
        assert_eq!(registry.all()[0].public_key, KEY_2);
    }

    #[test]
    fn test_query_preserves_order() {
        let now = Utc::now();
        let registry = KeyRegistry::from_keys(vec![
            key("alice", KEY_2, now),
            key("bob", KEY_1, now),
            key("alice", KEY_1, now),
        ]);

        let keys: Vec<_> = registry
            .query(&KeyPredicate::user_equals("alice"))
            .into_iter()
            .map(|k| k.public_key)
            .collect();
        assert_eq!(keys, vec![KEY_2.to_string(), KEY_1.to_string()]);
    }

    #[test]
    fn test_query_one() {
        let now = Utc::now();
        let k = key("alice", KEY_1, now + Duration::hours(1));
        let registry = KeyRegistry::from_keys(vec![k.clone()]);

        let found = registry
            .query_one(&KeyPredicate::fingerprint_equals(k.fingerprint()))
            .unwrap();
        assert_eq!(found, k);
        assert!(registry
            .query_one(&KeyPredicate::user_equals("bob"))
            .is_none());
    }

    #[test]
    fn test_query_at_expiry_scenario() {
        let t = Utc::now();
        let registry = KeyRegistry::from_keys(vec![key("alice", KEY_1, t + Duration::hours(1))]);
        let query = KeyPredicate::user_equals("alice").and(KeyPredicate::NotExpired);

        assert_eq!(registry.query_at(&query, t + Duration::minutes(30)).len(), 1);
        assert!(registry.query_at(&query, t + Duration::hours(2)).is_empty());
    }

    #[test]
    fn test_concurrent_adds() {
        let registry = Arc::new(KeyRegistry::new());
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        registry.add(key(&format!("user{}", i % 4), KEY_1, now));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 4);
    }
}
