//! Site Kit data layer
//!
//! Named stores, resolver scheduling with per-signature de-duplication,
//! captured API errors, and two store factories:
//!
//! - [`FetchStore`] wraps a single remote resource (`fetch`, `receive`,
//!   `reset`, `get` with a default resolver, `is_fetching`)
//! - [`SettingsStore`] composes fetch stores with editable local state and a
//!   validated submit pipeline
//!
//! Stores live in a [`Registry`] created once at startup.

pub mod error;
pub mod fetch_store;
pub mod invariant;
pub mod registry;
pub mod resolution;
pub mod settings_store;
pub mod signature;
pub mod store;

pub use error::{Result, StoreError};
pub use fetch_store::{FetchOutcome, FetchResource, FetchStore};
pub use invariant::{invariant, strict, InvariantViolation};
pub use registry::Registry;
pub use resolution::{ResolutionState, ResolutionTracker};
pub use settings_store::{
    SettingsModule, SettingsStore, SubmitResult, SubmitStatus, INVARIANT_DOING_SUBMIT_CHANGES,
    INVARIANT_SETTINGS_NOT_CHANGED,
};
pub use signature::Signature;
pub use store::{subscribe_until, Store, StoreCore};
