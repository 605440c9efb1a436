//! Lazily loaded, booted-once policy slot.

use std::sync::Arc;

use bouncer_sdk::{BouncerError, Policy, PolicyLoader};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::info;

/// Holds the loader of one registered policy and, once loaded, the booted
/// policy itself.
///
/// Uses a single-flight pattern: even under concurrent first use, the
/// loader runs and the policy boots at most once. A failed load leaves the
/// slot empty so the next evaluation retries.
pub struct PolicySlot<U> {
    name: String,
    loader: Arc<dyn PolicyLoader<U>>,
    /// Booted policy (sync lock for fast access on the happy path).
    cached: RwLock<Option<Arc<Policy<U>>>>,
    /// Mutex to ensure single-flight loading.
    resolve_lock: Mutex<()>,
}

impl<U> PolicySlot<U> {
    #[must_use]
    pub fn new(name: String, loader: Arc<dyn PolicyLoader<U>>) -> Self {
        Self {
            name,
            loader,
            cached: RwLock::new(None),
            resolve_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cached.read().is_some()
    }

    /// Returns the booted policy, loading and booting it on first use.
    ///
    /// # Errors
    ///
    /// [`BouncerError::PolicyLoad`] if the loader fails.
    pub async fn get_or_load(&self) -> Result<Arc<Policy<U>>, BouncerError> {
        // Fast path: already booted (sync lock, no await)
        if let Some(policy) = self.cached.read().as_ref() {
            return Ok(Arc::clone(policy));
        }

        // Slow path: acquire resolve lock for single-flight
        let _resolve_guard = self.resolve_lock.lock().await;

        // Re-check after acquiring resolve lock (another caller may have loaded)
        if let Some(policy) = self.cached.read().as_ref() {
            return Ok(Arc::clone(policy));
        }

        info!(policy = %self.name, "Loading policy");
        let mut policy = self
            .loader
            .load()
            .await
            .map_err(|source| BouncerError::PolicyLoad {
                policy: self.name.clone(),
                source,
            })?;
        if policy.name() != self.name {
            return Err(BouncerError::PolicyLoad {
                policy: self.name.clone(),
                source: anyhow::anyhow!(
                    "loader returned policy '{}' instead of '{}'",
                    policy.name(),
                    self.name
                ),
            });
        }
        policy.boot();
        let policy = Arc::new(policy);

        *self.cached.write() = Some(Arc::clone(&policy));

        Ok(policy)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bouncer_sdk::ActionOptions;

    use super::*;

    struct User;

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail_first: bool,
    }

    struct MislabeledLoader;

    #[async_trait]
    impl PolicyLoader<User> for MislabeledLoader {
        async fn load(&self) -> anyhow::Result<Policy<User>> {
            Ok(Policy::new("comment"))
        }
    }

    #[async_trait]
    impl PolicyLoader<User> for CountingLoader {
        async fn load(&self) -> anyhow::Result<Policy<User>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            // Small delay to increase chance of concurrent access
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
            if self.fail_first && call == 0 {
                anyhow::bail!("policy module unavailable");
            }
            Ok(Policy::new("post").define_fn_with(
                "view",
                ActionOptions::new().allow_guest(true),
                |_, _| Ok(true.into()),
            )?)
        }
    }

    fn slot(calls: &Arc<AtomicUsize>, fail_first: bool) -> PolicySlot<User> {
        PolicySlot::new(
            "post".to_owned(),
            Arc::new(CountingLoader {
                calls: Arc::clone(calls),
                fail_first,
            }),
        )
    }

    #[tokio::test]
    async fn loaded_policy_is_booted_and_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = slot(&calls, false);
        assert!(!slot.is_loaded());

        let first = slot.get_or_load().await.unwrap();
        let second = slot.get_or_load().await.unwrap();

        assert!(first.is_booted());
        assert!(first.action_options("view").allow_guest);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(slot.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(slot(&calls, false));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let slot = Arc::clone(&slot);
            handles.push(tokio::spawn(async move { slot.get_or_load().await }));
        }

        let mut policies = Vec::new();
        for handle in handles {
            policies.push(handle.await.unwrap().unwrap());
        }

        for policy in &policies {
            assert!(Arc::ptr_eq(policy, &policies[0]));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = slot(&calls, true);

        let err = slot.get_or_load().await.unwrap_err();
        match &err {
            BouncerError::PolicyLoad { policy, source } => {
                assert_eq!(policy, "post");
                assert_eq!(source.to_string(), "policy module unavailable");
            }
            other => panic!("Expected PolicyLoad, got: {other:?}"),
        }
        assert!(!slot.is_loaded());

        assert!(slot.get_or_load().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn policy_registered_under_another_name_is_rejected() {
        let slot = PolicySlot::new("post".to_owned(), Arc::new(MislabeledLoader));

        let err = slot.get_or_load().await.unwrap_err();
        match &err {
            BouncerError::PolicyLoad { policy, source } => {
                assert_eq!(policy, "post");
                assert_eq!(
                    source.to_string(),
                    "loader returned policy 'comment' instead of 'post'"
                );
            }
            other => panic!("Expected PolicyLoad, got: {other:?}"),
        }
        assert!(!slot.is_loaded());
    }
}
