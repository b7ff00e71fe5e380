use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::debug;

use crate::domain::FetchOutcome;

pub type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Registry of in-flight fetches keyed by normalized URL.
///
/// Guarantees at most one outstanding network operation per key: callers
/// arriving while a fetch is in flight join its shared future and observe
/// the identical settled outcome. Entries are removed on settlement. The
/// work itself is spawned, so it runs to completion even if every caller
/// goes away before it settles.
#[derive(Default)]
pub struct FetchRegistry {
    in_flight: Mutex<HashMap<String, SharedFetch>>,
}

impl FetchRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Join the in-flight fetch for `key`, or start `work` as the one
    /// fetch for that key. `work` is only spawned (and therefore only
    /// executed) when no fetch is already in flight.
    pub fn join_or_start<F>(self: &Arc<Self>, key: &str, work: F) -> SharedFetch
    where
        F: Future<Output = FetchOutcome> + Send + 'static,
    {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = in_flight.get(key) {
            debug!("Joining in-flight fetch for {key}");
            return existing.clone();
        }

        let cleanup = RemoveOnSettle {
            registry: Arc::clone(self),
            key: key.to_string(),
        };
        let task = tokio::spawn(async move {
            let _cleanup = cleanup;
            work.await
        });

        let shared: SharedFetch = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => FetchOutcome::failed(format!("Fetch task failed: {e}")),
            }
        }
        .boxed()
        .shared();

        in_flight.insert(key.to_string(), shared.clone());
        shared
    }

    fn remove(&self, key: &str) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Drops inside the spawned task, so the registry entry is cleared on
/// every settlement path, a panicking work item included. A stale entry
/// would otherwise pin the settled failure and block retries for its key.
struct RemoveOnSettle {
    registry: Arc<FetchRegistry>,
    key: String,
}

impl Drop for RemoveOnSettle {
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}
