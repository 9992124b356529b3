//! Test utilities for Longbox crates.

use longbox_common_config::LongboxConfig;
use std::future::Future;
use std::time::Duration;

/// Session secret long enough to pass config validation.
pub const TEST_SESSION_SECRET: &str = "longbox-test-session-secret-0123456789";

/// How long [`eventually`] keeps polling.
pub const EVENTUALLY_TIMEOUT: Duration = Duration::from_secs(5);

/// A valid configuration over a fresh in-memory database.
pub fn test_config(rbac_enabled: bool) -> LongboxConfig {
    let mut config = LongboxConfig::default();
    config.session.secret = TEST_SESSION_SECRET.to_string();
    config.database.path = ":memory:".to_string();
    config.database.max_connections = 1;
    config.features.rbac_enabled = rbac_enabled;
    config.features.public_rbac_enabled = rbac_enabled;
    config
}

/// Poll `check` until it holds or [`EVENTUALLY_TIMEOUT`] passes.
///
/// Background audit writes land shortly after the operation that caused
/// them returns; tests use this instead of sleeping a fixed amount.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + EVENTUALLY_TIMEOUT;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longbox_common_config::validate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_config_is_valid() {
        for rbac in [false, true] {
            let config = test_config(rbac);
            assert!(validate(&config).is_ok());
            assert_eq!(config.features.rbac_enabled, rbac);
        }
    }

    #[tokio::test]
    async fn test_eventually_waits_for_condition() {
        let polls = Arc::new(AtomicUsize::new(0));
        let held = eventually(|| {
            let polls = polls.clone();
            async move { polls.fetch_add(1, Ordering::SeqCst) >= 3 }
        })
        .await;
        assert!(held);
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eventually_gives_up() {
        assert!(!eventually(|| async { false }).await);
    }
}
