//! Background removal of expired keys

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{KeyPredicate, KeyRegistry};

/// Remove expired keys from `registry` every `interval`.
///
/// The first sweep runs immediately. Abort the returned handle to stop.
pub fn spawn_expiry_sweeper(
    registry: Arc<KeyRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = registry.remove(&KeyPredicate::Expired);
            if removed > 0 {
                debug!(removed, "Swept expired keys");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inki_core::Key;

    const KEY: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAILM+rvN+ot98qgEN796jTiQfZfG1KaT0PtFDJ/XFSqti foo@bar.com";

    #[tokio::test]
    async fn test_sweeper_removes_expired_keys() {
        let now = Utc::now();
        let registry = Arc::new(KeyRegistry::from_keys(vec![
            Key::new("alice", KEY, now - chrono::Duration::minutes(5)),
            Key::new("bob", KEY, now + chrono::Duration::hours(1)),
        ]));

        let handle = spawn_expiry_sweeper(Arc::clone(&registry), Duration::from_millis(10));

        for _ in 0..100 {
            if registry.len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        let remaining = registry.all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user, "bob");
    }
}
