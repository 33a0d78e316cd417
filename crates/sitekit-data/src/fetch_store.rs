//! Generic fetch-store factory
//!
//! A [`FetchResource`] describes one remote read (or write). Wrapping it in a
//! [`FetchStore`] yields the full capability set the UI relies on:
//! `fetch<X>`, `receive<X>`, `reset<X>`, `get<X>` with a default resolver,
//! and `isFetching<X>`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use sitekit_api::ApiError;
use tracing::debug;

use crate::{
    error::{Result, StoreError},
    signature::{canonical_json, Signature},
    store::StoreCore,
};

pub const RESPONSE_REQUIRED: &str = "response is required.";
pub const PARAMS_REQUIRED: &str = "params is required.";

/// Code of the error captured when a resolver's parameters are rejected
pub const ERROR_CODE_INVALID_PARAMS: &str = "invalid_params";

/// A remote resource backing a fetch store
#[async_trait]
pub trait FetchResource: Send + Sync + 'static {
    /// Positional selector arguments, serialized as an array (use a tuple)
    type Args: Serialize + Clone + Send + Sync + 'static;
    /// Request parameters derived from the arguments
    type Params: Serialize + Clone + Send + Sync + 'static;
    type Response: Clone + Send + Sync + 'static;

    /// Verb-prefixed name, e.g. `getHTMLForURL` or `saveSettings`
    fn base_name(&self) -> &'static str;

    fn args_to_params(&self, args: &Self::Args) -> Self::Params;

    /// Reject malformed parameters before anything is dispatched
    fn validate_params(&self, _params: &Self::Params) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, params: &Self::Params) -> std::result::Result<Self::Response, ApiError>;
}

/// Result of a fetch: exactly one of the two is set
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    pub response: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> FetchOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Responses and in-flight flags, both keyed by serialized params
pub struct FetchState<T> {
    data: HashMap<String, T>,
    fetching: HashMap<String, bool>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: HashMap::new(),
            fetching: HashMap::new(),
        }
    }
}

/// Actions reduced into a [`FetchState`]
pub enum FetchAction<T> {
    Start { key: String },
    Receive { key: String, response: T },
    Finish { key: String },
    Catch { key: String },
    Reset { key: String },
}

/// Pure reducer over `(state, action)`
pub fn reduce<T>(state: &mut FetchState<T>, action: FetchAction<T>) {
    match action {
        FetchAction::Start { key } => {
            state.fetching.insert(key, true);
        }
        FetchAction::Receive { key, response } => {
            state.data.insert(key, response);
        }
        FetchAction::Finish { key } | FetchAction::Catch { key } => {
            state.fetching.insert(key, false);
        }
        FetchAction::Reset { key } => {
            state.data.remove(&key);
        }
    }
}

/// Fetch store built from a [`FetchResource`]
pub struct FetchStore<R: FetchResource> {
    core: Arc<StoreCore>,
    resource: R,
    state: RwLock<FetchState<R::Response>>,
}

impl<R: FetchResource> FetchStore<R> {
    pub fn new(core: Arc<StoreCore>, resource: R) -> Arc<Self> {
        Arc::new(Self {
            core,
            resource,
            state: RwLock::new(FetchState::default()),
        })
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Selector name used for resolution and error bookkeeping
    pub fn base_name(&self) -> &'static str {
        self.resource.base_name()
    }

    /// `fetch<BaseName>`, e.g. `fetchGetHTMLForURL`
    pub fn fetch_action_name(&self) -> String {
        format!("fetch{}", ucfirst(self.base_name()))
    }

    /// `receive<BaseName>`, e.g. `receiveGetHTMLForURL`
    pub fn receive_action_name(&self) -> String {
        format!("receive{}", ucfirst(self.base_name()))
    }

    /// `reset<Name>` with any leading `get` dropped, e.g. `resetHTMLForURL`
    pub fn reset_action_name(&self) -> String {
        let name = self.base_name();
        format!("reset{}", ucfirst(name.strip_prefix("get").unwrap_or(name)))
    }

    fn key(params: &R::Params) -> String {
        canonical_json(params)
    }

    fn dispatch(&self, action: FetchAction<R::Response>) {
        reduce(&mut self.state.write(), action);
        self.core.notify();
    }

    /// Run the request for `args`: start, await, receive or capture the
    /// error, finish. Invalid parameters fail before anything is dispatched.
    pub async fn fetch(&self, args: &R::Args) -> Result<FetchOutcome<R::Response>> {
        let params = self.resource.args_to_params(args);
        self.resource.validate_params(&params)?;
        let key = Self::key(&params);

        self.core.clear_error(self.base_name(), args);
        self.dispatch(FetchAction::Start { key: key.clone() });
        debug!(action = %self.fetch_action_name(), params = %key, "Fetching");

        match self.resource.fetch(&params).await {
            Ok(response) => {
                self.dispatch(FetchAction::Receive {
                    key: key.clone(),
                    response: response.clone(),
                });
                self.dispatch(FetchAction::Finish { key });
                Ok(FetchOutcome {
                    response: Some(response),
                    error: None,
                })
            }
            Err(error) => {
                self.core
                    .receive_error(error.clone(), self.base_name(), args);
                self.dispatch(FetchAction::Catch { key });
                Ok(FetchOutcome {
                    response: None,
                    error: Some(error),
                })
            }
        }
    }

    /// Store a response for `params` without a request. Both arguments are
    /// required.
    pub fn receive(&self, response: Option<R::Response>, params: Option<R::Params>) -> Result<()> {
        let response = response.ok_or_else(|| StoreError::validation(RESPONSE_REQUIRED))?;
        let params = params.ok_or_else(|| StoreError::validation(PARAMS_REQUIRED))?;
        self.resource.validate_params(&params)?;

        self.dispatch(FetchAction::Receive {
            key: Self::key(&params),
            response,
        });
        Ok(())
    }

    /// Drop the stored response for `args` and reset its resolution so the
    /// next [`FetchStore::get`] resolves again.
    pub fn reset(&self, args: &R::Args) {
        let key = Self::key(&self.resource.args_to_params(args));
        self.dispatch(FetchAction::Reset { key });
        self.core.invalidate_resolution(self.base_name(), args);
    }

    /// Stored response for `args`, or `None`. The first call for a given
    /// `args` schedules the default resolver.
    pub fn get(self: &Arc<Self>, args: &R::Args) -> Option<R::Response> {
        let signature = Signature::new(self.base_name(), args);
        let this = Arc::clone(self);
        let resolver_args = args.clone();
        if let Err(e) = self
            .core
            .schedule_resolver(signature, async move { this.resolve(&resolver_args).await })
        {
            debug!(error = %e, "Resolver not scheduled");
        }

        self.peek(args)
    }

    /// Stored response for `args` without triggering resolution
    pub fn peek(&self, args: &R::Args) -> Option<R::Response> {
        let key = Self::key(&self.resource.args_to_params(args));
        self.state.read().data.get(&key).cloned()
    }

    /// UI-facing in-flight flag, independent of resolution bookkeeping
    pub fn is_fetching(&self, args: &R::Args) -> bool {
        let key = Self::key(&self.resource.args_to_params(args));
        self.state
            .read()
            .fetching
            .get(&key)
            .copied()
            .unwrap_or(false)
    }

    pub fn has_started_resolution(&self, args: &R::Args) -> bool {
        self.core.has_started_resolution(self.base_name(), args)
    }

    pub fn has_finished_resolution(&self, args: &R::Args) -> bool {
        self.core.has_finished_resolution(self.base_name(), args)
    }

    /// Captured error of the last fetch for `args`
    pub fn error(&self, args: &R::Args) -> Option<ApiError> {
        self.core.error_for_selector(self.base_name(), args)
    }

    /// Default resolver: fetch only when nothing is stored and no request
    /// is already in flight.
    async fn resolve(&self, args: &R::Args) -> std::result::Result<(), ApiError> {
        if self.peek(args).is_some() || self.is_fetching(args) {
            return Ok(());
        }

        match self.fetch(args).await {
            Ok(FetchOutcome { error: Some(error), .. }) => Err(error),
            Ok(_) => Ok(()),
            Err(e) => {
                // Rejected before dispatch; surface it through the error selectors
                let error = ApiError::new(ERROR_CODE_INVALID_PARAMS, e.to_string(), None);
                self.core
                    .receive_error(error.clone(), self.base_name(), args);
                Err(error)
            }
        }
    }
}

fn ucfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
