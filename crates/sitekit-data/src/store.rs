//! Shared store machinery: resolution records, captured errors and change
//! notification.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use parking_lot::RwLock;
use serde::Serialize;
use sitekit_api::ApiError;
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, warn};

use crate::{
    error::{Result, StoreError},
    resolution::{ResolutionState, ResolutionTracker},
    signature::Signature,
};

/// A named store that can live in a [`Registry`](crate::Registry)
pub trait Store: Send + Sync + 'static {
    fn core(&self) -> &Arc<StoreCore>;

    fn name(&self) -> &str {
        self.core().name()
    }
}

/// State every store carries regardless of its resources.
pub struct StoreCore {
    name: String,
    resolution: ResolutionTracker,
    errors: RwLock<HashMap<Signature, ApiError>>,
    changes: watch::Sender<u64>,
}

impl StoreCore {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let (changes, _) = watch::channel(0);
        Arc::new(Self {
            name: name.into(),
            resolution: ResolutionTracker::new(),
            errors: RwLock::new(HashMap::new()),
            changes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolution(&self) -> &ResolutionTracker {
        &self.resolution
    }

    /// Tell subscribers the store changed
    pub fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Receiver that observes every state change after this call
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Claim `signature` and run `resolver` on the current tokio runtime.
    ///
    /// The record is marked in progress before this function returns, so a
    /// second call with the same signature in the same tick is a no-op.
    /// Returns `Ok(false)` when the signature was already claimed.
    pub fn schedule_resolver<F>(self: &Arc<Self>, signature: Signature, resolver: F) -> Result<bool>
    where
        F: Future<Output = std::result::Result<(), ApiError>> + Send + 'static,
    {
        let handle =
            Handle::try_current().map_err(|_| StoreError::NoRuntime(signature.to_string()))?;

        if !self.resolution.begin(&signature) {
            return Ok(false);
        }
        self.notify();
        debug!(store = %self.name, %signature, "Scheduling resolver");

        // A panicking resolver must still settle its record.
        let task = handle.spawn(resolver);
        let core = Arc::clone(self);
        handle.spawn(async move {
            match task.await {
                Ok(Ok(())) => core.resolution.finish(&signature),
                Ok(Err(error)) => {
                    warn!(store = %core.name, %signature, code = %error.code, "Resolver failed");
                    core.resolution.fail(&signature);
                }
                Err(error) => {
                    warn!(store = %core.name, %signature, %error, "Resolver did not complete");
                    core.resolution.fail(&signature);
                }
            }
            core.notify();
        });

        Ok(true)
    }

    pub fn resolution_state<A: Serialize + ?Sized>(&self, selector: &str, args: &A) -> ResolutionState {
        self.resolution.state(&Signature::new(selector, args))
    }

    pub fn has_started_resolution<A: Serialize + ?Sized>(&self, selector: &str, args: &A) -> bool {
        self.resolution
            .has_started_resolution(&Signature::new(selector, args))
    }

    pub fn has_finished_resolution<A: Serialize + ?Sized>(&self, selector: &str, args: &A) -> bool {
        self.resolution
            .has_finished_resolution(&Signature::new(selector, args))
    }

    pub fn is_resolving<A: Serialize + ?Sized>(&self, selector: &str, args: &A) -> bool {
        self.resolution.is_resolving(&Signature::new(selector, args))
    }

    pub fn invalidate_resolution<A: Serialize + ?Sized>(&self, selector: &str, args: &A) {
        self.resolution.invalidate(&Signature::new(selector, args));
        self.notify();
    }

    pub fn invalidate_resolution_for_selector(&self, selector: &str) {
        self.resolution.invalidate_selector(selector);
        self.notify();
    }

    /// Record a captured API error for `(base_name, args)`
    pub fn receive_error<A: Serialize + ?Sized>(&self, error: ApiError, base_name: &str, args: &A) {
        let signature = Signature::new(base_name, args);
        debug!(store = %self.name, %signature, code = %error.code, "Received error");
        self.errors.write().insert(signature, error);
        self.notify();
    }

    pub fn clear_error<A: Serialize + ?Sized>(&self, base_name: &str, args: &A) {
        let removed = self
            .errors
            .write()
            .remove(&Signature::new(base_name, args))
            .is_some();
        if removed {
            self.notify();
        }
    }

    /// Clear every error, or only those of `base_name`
    pub fn clear_errors(&self, base_name: Option<&str>) {
        {
            let mut errors = self.errors.write();
            match base_name {
                Some(name) => errors.retain(|sig, _| !sig.is_for(name)),
                None => errors.clear(),
            }
        }
        self.notify();
    }

    pub fn error_for_selector<A: Serialize + ?Sized>(&self, selector: &str, args: &A) -> Option<ApiError> {
        self.errors
            .read()
            .get(&Signature::new(selector, args))
            .cloned()
    }

    pub fn error_for_action<A: Serialize + ?Sized>(&self, action: &str, args: &A) -> Option<ApiError> {
        self.error_for_selector(action, args)
    }

    /// All captured errors
    pub fn errors(&self) -> Vec<ApiError> {
        self.errors.read().values().cloned().collect()
    }

    /// Drop resolution records and errors
    pub fn reset(&self) {
        self.resolution.clear();
        self.errors.write().clear();
        self.notify();
    }
}

/// Wait until `predicate` holds, re-checking after every change of `store`.
pub async fn subscribe_until<S, F>(store: &S, mut predicate: F, timeout: Duration) -> Result<()>
where
    S: Store + ?Sized,
    F: FnMut() -> bool,
{
    let mut changes = store.core().subscribe();
    let wait = async {
        loop {
            if predicate() {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| StoreError::Timeout(store.name().to_string()))
}
