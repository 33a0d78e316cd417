//! Resolver scheduling
//!
//! Every selector call with a resolver is keyed by its [`Signature`]. The
//! first call moves the record from `NotStarted` to `InProgress` under a
//! single lock acquisition, so re-entrant or concurrent calls with the same
//! signature never start a second resolution. Records only move forward
//! until explicitly invalidated.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::signature::Signature;

/// Lifecycle of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionState {
    NotStarted,
    InProgress,
    Finished,
    /// The resolver failed. Counts as finished; never retried automatically.
    Errored,
}

impl ResolutionState {
    pub fn is_finished(self) -> bool {
        matches!(self, ResolutionState::Finished | ResolutionState::Errored)
    }
}

/// Per-signature resolution bookkeeping
#[derive(Debug, Default)]
pub struct ResolutionTracker {
    records: Mutex<HashMap<Signature, ResolutionState>>,
}

impl ResolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the resolution for `signature`. Returns `true` only for the
    /// caller that moved it from `NotStarted` to `InProgress`.
    pub fn begin(&self, signature: &Signature) -> bool {
        let mut records = self.records.lock();
        match records.get(signature) {
            None | Some(ResolutionState::NotStarted) => {
                records.insert(signature.clone(), ResolutionState::InProgress);
                trace!(%signature, "Resolution started");
                true
            }
            Some(_) => false,
        }
    }

    /// Mark an in-progress resolution as finished
    pub fn finish(&self, signature: &Signature) {
        self.complete(signature, ResolutionState::Finished);
    }

    /// Mark an in-progress resolution as errored
    pub fn fail(&self, signature: &Signature) {
        self.complete(signature, ResolutionState::Errored);
    }

    fn complete(&self, signature: &Signature, outcome: ResolutionState) {
        let mut records = self.records.lock();
        // A record invalidated mid-flight stays NotStarted.
        if let Some(state) = records.get_mut(signature) {
            if *state == ResolutionState::InProgress {
                *state = outcome;
                trace!(%signature, ?outcome, "Resolution completed");
            }
        }
    }

    pub fn state(&self, signature: &Signature) -> ResolutionState {
        self.records
            .lock()
            .get(signature)
            .copied()
            .unwrap_or(ResolutionState::NotStarted)
    }

    pub fn has_started_resolution(&self, signature: &Signature) -> bool {
        self.state(signature) != ResolutionState::NotStarted
    }

    pub fn has_finished_resolution(&self, signature: &Signature) -> bool {
        self.state(signature).is_finished()
    }

    pub fn is_resolving(&self, signature: &Signature) -> bool {
        self.state(signature) == ResolutionState::InProgress
    }

    /// Reset one signature so the next selector call resolves again
    pub fn invalidate(&self, signature: &Signature) {
        self.records.lock().remove(signature);
    }

    /// Reset every signature of `selector`
    pub fn invalidate_selector(&self, selector: &str) {
        self.records.lock().retain(|sig, _| !sig.is_for(selector));
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Number of tracked signatures
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
