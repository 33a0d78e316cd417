//! Settings-store factory
//!
//! Composes two fetch stores (`getSettings` and `saveSettings`) with local
//! editable state and a submit pipeline:
//!
//! ```text
//! Idle -> Editing -> Submitting -> Saved
//!                       |
//!                       +-------> SubmitError
//! ```
//!
//! `saved` only changes on a successful fetch or save; `settings` only
//! changes through the actions below.

use std::{fmt::Debug, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sitekit_api::{ApiClient, ApiError, GetOptions, QueryParams, Route};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::{
    error::{Result, StoreError},
    fetch_store::{FetchOutcome, FetchResource, FetchStore},
    invariant::{invariant, strict, InvariantViolation},
    signature::Signature,
    store::{Store, StoreCore},
};

pub const INVARIANT_DOING_SUBMIT_CHANGES: &str = "cannot submit changes while submitting changes";
pub const INVARIANT_SETTINGS_NOT_CHANGED: &str = "cannot submit changes if settings have not changed";

const GET_SETTINGS: &str = "getSettings";
const SAVE_SETTINGS: &str = "saveSettings";

/// A module whose settings live at `modules/<slug>/data/settings`
#[async_trait]
pub trait SettingsModule: Sized + Send + Sync + 'static {
    type Settings: Serialize + DeserializeOwned + Clone + Default + Debug + Send + Sync + 'static;

    fn slug(&self) -> &str;

    /// Field validators run after the generic submit preconditions
    fn validate_can_submit_changes(
        &self,
        _settings: &Self::Settings,
    ) -> std::result::Result<(), InvariantViolation> {
        Ok(())
    }

    /// Submit pipeline. Override to add module-specific steps around
    /// [`SettingsStore::submit_settings`].
    async fn submit_changes(store: &Arc<SettingsStore<Self>>) -> Result<SubmitResult> {
        store.submit_settings().await
    }
}

/// Where a settings form is in its edit cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Editing,
    Submitting,
    Saved,
    SubmitError,
}

/// Outcome of `submit_changes`. Empty when the save succeeded or was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitResult {
    pub error: Option<ApiError>,
}

#[derive(Debug)]
pub struct SettingsState<S> {
    saved: Option<S>,
    settings: Option<S>,
    status: SubmitStatus,
    doing_submit: bool,
    saves_in_flight: usize,
}

impl<S> Default for SettingsState<S> {
    fn default() -> Self {
        Self {
            saved: None,
            settings: None,
            status: SubmitStatus::Idle,
            doing_submit: false,
            saves_in_flight: 0,
        }
    }
}

pub enum SettingsAction<S> {
    /// Server value arrived; local edits (if any) are kept
    ReceiveGetSettings(S),
    SetSettings(S),
    RollbackSettings,
    StartSubmitChanges,
    FinishSubmitChanges { ok: bool },
    /// Save succeeded; both copies take the server's value
    ReceiveSaveSettings(S),
    StartSaveSettings,
    FinishSaveSettings,
}

pub fn reduce<S: Clone>(state: &mut SettingsState<S>, action: SettingsAction<S>) {
    match action {
        SettingsAction::ReceiveGetSettings(value) => {
            if state.settings.is_none() {
                state.settings = Some(value.clone());
            }
            state.saved = Some(value);
        }
        SettingsAction::SetSettings(value) => {
            state.settings = Some(value);
            if state.status != SubmitStatus::Submitting {
                state.status = SubmitStatus::Editing;
            }
        }
        SettingsAction::RollbackSettings => {
            state.settings = state.saved.clone();
            if state.status != SubmitStatus::Submitting {
                state.status = SubmitStatus::Idle;
            }
        }
        SettingsAction::StartSubmitChanges => {
            state.doing_submit = true;
            state.status = SubmitStatus::Submitting;
        }
        SettingsAction::FinishSubmitChanges { ok } => {
            state.doing_submit = false;
            state.status = if ok {
                SubmitStatus::Saved
            } else {
                SubmitStatus::SubmitError
            };
        }
        SettingsAction::ReceiveSaveSettings(value) => {
            state.saved = Some(value.clone());
            state.settings = Some(value);
        }
        SettingsAction::StartSaveSettings => state.saves_in_flight += 1,
        SettingsAction::FinishSaveSettings => {
            state.saves_in_flight = state.saves_in_flight.saturating_sub(1);
        }
    }
}

/// `GET modules/<slug>/data/settings`, never served from cache
pub struct GetSettings<S> {
    client: Arc<ApiClient>,
    route: Route,
    _settings: PhantomData<fn() -> S>,
}

#[async_trait]
impl<S> FetchResource for GetSettings<S>
where
    S: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Args = ();
    type Params = ();
    type Response = S;

    fn base_name(&self) -> &'static str {
        GET_SETTINGS
    }

    fn args_to_params(&self, _args: &()) {}

    async fn fetch(&self, _params: &()) -> std::result::Result<S, ApiError> {
        self.client
            .get(&self.route, &QueryParams::new(), GetOptions::no_cache())
            .await
    }
}

/// `POST modules/<slug>/data/settings` with the full settings object
pub struct SaveSettings<S> {
    client: Arc<ApiClient>,
    route: Route,
    _settings: PhantomData<fn() -> S>,
}

#[async_trait]
impl<S> FetchResource for SaveSettings<S>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Args = (S,);
    type Params = S;
    type Response = S;

    fn base_name(&self) -> &'static str {
        SAVE_SETTINGS
    }

    fn args_to_params(&self, args: &(S,)) -> S {
        args.0.clone()
    }

    async fn fetch(&self, params: &S) -> std::result::Result<S, ApiError> {
        self.client.set(&self.route, params).await
    }
}

/// Settings store for one module
pub struct SettingsStore<M: SettingsModule> {
    core: Arc<StoreCore>,
    module: M,
    client: Arc<ApiClient>,
    state: RwLock<SettingsState<M::Settings>>,
    get_settings: Arc<FetchStore<GetSettings<M::Settings>>>,
    save_settings: Arc<FetchStore<SaveSettings<M::Settings>>>,
}

impl<M: SettingsModule> SettingsStore<M> {
    /// Build the store for `module`, named `modules/<slug>`
    pub fn new(module: M, client: Arc<ApiClient>) -> Arc<Self> {
        let slug = module.slug().to_string();
        let core = StoreCore::new(format!("modules/{slug}"));
        let route = Route::new("modules", slug, "settings");

        let get_settings = FetchStore::new(
            Arc::clone(&core),
            GetSettings {
                client: Arc::clone(&client),
                route: route.clone(),
                _settings: PhantomData,
            },
        );
        let save_settings = FetchStore::new(
            Arc::clone(&core),
            SaveSettings {
                client: Arc::clone(&client),
                route,
                _settings: PhantomData,
            },
        );

        Arc::new(Self {
            core,
            module,
            client,
            state: RwLock::new(SettingsState::default()),
            get_settings,
            save_settings,
        })
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn slug(&self) -> &str {
        self.module.slug()
    }

    fn dispatch(&self, action: SettingsAction<M::Settings>) {
        reduce(&mut self.state.write(), action);
        self.core.notify();
    }

    // Selectors

    /// Current (possibly edited) settings. The first call schedules a fetch.
    pub fn get_settings(self: &Arc<Self>) -> Option<M::Settings> {
        let this = Arc::clone(self);
        let scheduled = self.core.schedule_resolver(
            Signature::new(GET_SETTINGS, &()),
            async move { this.resolve_settings().await },
        );
        if let Err(e) = scheduled {
            debug!(store = %self.core.name(), error = %e, "Settings resolver not scheduled");
        }

        self.settings_ref()
    }

    /// Current settings without triggering resolution
    pub fn settings_ref(&self) -> Option<M::Settings> {
        self.state.read().settings.clone()
    }

    /// Last value confirmed by the server
    pub fn saved_settings(&self) -> Option<M::Settings> {
        self.state.read().saved.clone()
    }

    /// Structural comparison of the edited and saved settings
    pub fn have_settings_changed(&self) -> bool {
        let state = self.state.read();
        let settings = state.settings.as_ref().map(to_value);
        let saved = state.saved.as_ref().map(to_value);
        settings != saved
    }

    pub fn is_doing_submit_changes(&self) -> bool {
        self.state.read().doing_submit
    }

    pub fn submit_status(&self) -> SubmitStatus {
        self.state.read().status
    }

    pub fn is_fetching_get_settings(&self) -> bool {
        self.get_settings.is_fetching(&())
    }

    /// True while any save request is pending, whatever was edited since
    pub fn is_fetching_save_settings(&self) -> bool {
        self.state.read().saves_in_flight > 0
    }

    pub fn has_finished_resolution_get_settings(&self) -> bool {
        self.core.has_finished_resolution(GET_SETTINGS, &())
    }

    /// Check every submit precondition in order
    pub fn validate_can_submit_changes(&self) -> std::result::Result<(), InvariantViolation> {
        invariant(!self.is_doing_submit_changes(), INVARIANT_DOING_SUBMIT_CHANGES)?;
        let settings = strict(self.settings_ref(), GET_SETTINGS)?;
        invariant(self.have_settings_changed(), INVARIANT_SETTINGS_NOT_CHANGED)?;
        self.module.validate_can_submit_changes(&settings)
    }

    pub fn can_submit_changes(&self) -> bool {
        self.validate_can_submit_changes().is_ok()
    }

    /// Last save error, falling back to the last fetch error
    pub fn get_error(&self) -> Option<ApiError> {
        self.core
            .error_for_action(SAVE_SETTINGS, &())
            .or_else(|| self.core.error_for_selector(GET_SETTINGS, &()))
    }

    // Actions

    /// Edit the local settings. Starts from defaults if nothing was loaded.
    pub fn set_settings<F>(&self, mutate: F)
    where
        F: FnOnce(&mut M::Settings),
    {
        let mut settings = self.settings_ref().unwrap_or_default();
        mutate(&mut settings);
        self.dispatch(SettingsAction::SetSettings(settings));
    }

    /// Store a server value without a request
    pub fn receive_get_settings(&self, settings: Option<M::Settings>) -> Result<()> {
        self.get_settings.receive(settings.clone(), Some(()))?;
        if let Some(settings) = settings {
            self.dispatch(SettingsAction::ReceiveGetSettings(settings));
        }
        Ok(())
    }

    pub async fn fetch_get_settings(&self) -> Result<FetchOutcome<M::Settings>> {
        let outcome = self.get_settings.fetch(&()).await?;
        if let Some(settings) = &outcome.response {
            self.dispatch(SettingsAction::ReceiveGetSettings(settings.clone()));
        }
        Ok(outcome)
    }

    pub async fn fetch_save_settings(
        &self,
        settings: M::Settings,
    ) -> Result<FetchOutcome<M::Settings>> {
        self.dispatch(SettingsAction::StartSaveSettings);
        let _in_flight = SaveInFlight(self);

        let outcome = self.save_settings.fetch(&(settings,)).await?;
        if let Some(saved) = &outcome.response {
            self.dispatch(SettingsAction::ReceiveSaveSettings(saved.clone()));
        }
        Ok(outcome)
    }

    /// Save the current settings. A failure is also recorded under
    /// `saveSettings` with no arguments, where [`Self::get_error`] finds it.
    pub async fn save_settings(&self) -> Result<FetchOutcome<M::Settings>> {
        let settings = strict(self.settings_ref(), GET_SETTINGS)?;
        self.core.clear_error(SAVE_SETTINGS, &());

        let outcome = self.fetch_save_settings(settings).await?;
        if let Some(error) = &outcome.error {
            self.core.receive_error(error.clone(), SAVE_SETTINGS, &());
        }
        Ok(outcome)
    }

    /// Discard local edits
    pub fn rollback_settings(&self) {
        self.core.clear_errors(Some(SAVE_SETTINGS));
        self.dispatch(SettingsAction::RollbackSettings);
    }

    /// Run the module's submit pipeline
    pub async fn submit_changes(self: &Arc<Self>) -> Result<SubmitResult> {
        M::submit_changes(self).await
    }

    /// Default submit pipeline: save when something changed, then drop every
    /// cached response of the module.
    ///
    /// The work runs on its own task, so dropping the returned future does
    /// not cancel an in-flight save.
    pub async fn submit_settings(self: &Arc<Self>) -> Result<SubmitResult> {
        let handle = Handle::try_current()
            .map_err(|_| StoreError::NoRuntime(format!("{}::submitChanges", self.core.name())))?;

        {
            let mut state = self.state.write();
            invariant(!state.doing_submit, INVARIANT_DOING_SUBMIT_CHANGES)?;
            reduce(&mut state, SettingsAction::StartSubmitChanges);
        }
        self.core.notify();

        let this = Arc::clone(self);
        match handle.spawn(async move { this.run_submit().await }).await {
            Ok(result) => result,
            Err(e) => {
                warn!(module = %self.slug(), error = %e, "Settings submit task did not complete");
                self.dispatch(SettingsAction::FinishSubmitChanges { ok: false });
                Err(StoreError::Aborted(format!("{}: {e}", self.core.name())))
            }
        }
    }

    async fn run_submit(&self) -> Result<SubmitResult> {
        let result = if self.have_settings_changed() {
            self.save_settings()
                .await
                .map(|outcome| SubmitResult { error: outcome.error })
        } else {
            debug!(module = %self.slug(), "Settings unchanged, skipping save");
            Ok(SubmitResult::default())
        };

        let evicted = self
            .client
            .invalidate_cache("modules", Some(self.slug()), None)
            .await;
        debug!(module = %self.slug(), evicted, "Invalidated module cache");

        let ok = matches!(&result, Ok(SubmitResult { error: None }));
        self.dispatch(SettingsAction::FinishSubmitChanges { ok });
        if ok {
            info!(module = %self.slug(), "Settings submitted");
        } else {
            warn!(module = %self.slug(), "Settings submit failed");
        }

        result
    }

    async fn resolve_settings(&self) -> std::result::Result<(), ApiError> {
        if self.settings_ref().is_some() || self.get_settings.is_fetching(&()) {
            return Ok(());
        }

        match self.fetch_get_settings().await {
            Ok(FetchOutcome { error: Some(error), .. }) => Err(error),
            Ok(_) => Ok(()),
            Err(e) => Err(ApiError::fetch_error(e.to_string())),
        }
    }
}

/// Counts one pending save until dropped, including on cancellation
struct SaveInFlight<'a, M: SettingsModule>(&'a SettingsStore<M>);

impl<M: SettingsModule> Drop for SaveInFlight<'_, M> {
    fn drop(&mut self) {
        self.0.dispatch(SettingsAction::FinishSaveSettings);
    }
}

impl<M: SettingsModule> Store for SettingsStore<M> {
    fn core(&self) -> &Arc<StoreCore> {
        &self.core
    }
}

fn to_value<S: Serialize>(settings: &S) -> Value {
    serde_json::to_value(settings).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;
    use serde::Deserialize;
    use sitekit_api::{ApiConfig, HttpRequest, HttpResponse, Method, StatusCode, Transport};
    use tokio::sync::Notify;

    use crate::store::subscribe_until;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct DemoSettings {
        name: Option<String>,
    }

    struct Demo;

    impl SettingsModule for Demo {
        type Settings = DemoSettings;

        fn slug(&self) -> &str {
            "demo"
        }

        fn validate_can_submit_changes(
            &self,
            settings: &DemoSettings,
        ) -> std::result::Result<(), InvariantViolation> {
            invariant(
                settings.name.as_deref().is_some_and(|n| !n.is_empty()),
                "a valid name is required",
            )
        }
    }

    /// Answers GETs with `get_body` and POSTs by echoing the `data` member,
    /// or with `post_status` when that is not a success.
    struct FakeTransport {
        get_body: String,
        post_status: StatusCode,
        gate: Option<Arc<Notify>>,
        panic_on_post: AtomicBool,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn new(get_body: &str) -> Self {
            Self {
                get_body: get_body.to_string(),
                post_status: StatusCode::OK,
                gate: None,
                panic_on_post: AtomicBool::new(false),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn count(&self, method: Method) -> usize {
            self.requests
                .lock()
                .iter()
                .filter(|r| r.method == method)
                .count()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, ApiError> {
            self.requests.lock().push(request.clone());
            if request.method == Method::GET {
                return Ok(HttpResponse {
                    status: StatusCode::OK,
                    body: self.get_body.clone(),
                });
            }

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.panic_on_post.load(Ordering::SeqCst) {
                panic!("transport crashed");
            }
            if !self.post_status.is_success() {
                return Ok(HttpResponse {
                    status: self.post_status,
                    body: r#"{"code":"internal_server_error","message":"Internal server error","data":{"status":500}}"#.to_string(),
                });
            }
            let data = request
                .body
                .and_then(|body| body.get("data").cloned())
                .unwrap_or(Value::Null);
            Ok(HttpResponse {
                status: StatusCode::OK,
                body: data.to_string(),
            })
        }
    }

    fn store_with(transport: Arc<FakeTransport>) -> Arc<SettingsStore<Demo>> {
        let client = ApiClient::with_transport(ApiConfig::default(), transport).unwrap();
        SettingsStore::new(Demo, Arc::new(client))
    }

    fn named(name: &str) -> DemoSettings {
        DemoSettings {
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_reducer_keeps_local_edits_on_receive() {
        let mut state = SettingsState::default();
        reduce(&mut state, SettingsAction::SetSettings(named("local")));
        reduce(&mut state, SettingsAction::ReceiveGetSettings(named("server")));

        assert_eq!(state.settings, Some(named("local")));
        assert_eq!(state.saved, Some(named("server")));
        assert_eq!(state.status, SubmitStatus::Editing);

        reduce(&mut state, SettingsAction::RollbackSettings);
        assert_eq!(state.settings, Some(named("server")));
        assert_eq!(state.status, SubmitStatus::Idle);
    }

    #[tokio::test]
    async fn test_get_settings_resolves_once() {
        let transport = Arc::new(FakeTransport::new(r#"{"name":"alpha"}"#));
        let store = store_with(Arc::clone(&transport));

        assert_eq!(store.get_settings(), None);
        assert_eq!(store.get_settings(), None);
        let s = Arc::clone(&store);
        subscribe_until(&*store, || s.has_finished_resolution_get_settings(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.get_settings(), Some(named("alpha")));
        assert_eq!(store.saved_settings(), Some(named("alpha")));
        assert!(!store.have_settings_changed());
        assert_eq!(transport.count(Method::GET), 1);
    }

    #[test]
    fn test_validate_can_submit_changes_order() {
        let store = store_with(Arc::new(FakeTransport::new("{}")));

        let err = store.validate_can_submit_changes().unwrap_err();
        assert_eq!(err.message(), "getSettings(...) is not resolved");

        store.receive_get_settings(Some(named("alpha"))).unwrap();
        let err = store.validate_can_submit_changes().unwrap_err();
        assert_eq!(err.message(), INVARIANT_SETTINGS_NOT_CHANGED);

        store.set_settings(|s| s.name = Some(String::new()));
        let err = store.validate_can_submit_changes().unwrap_err();
        assert_eq!(err.message(), "a valid name is required");

        store.set_settings(|s| s.name = Some("beta".into()));
        assert!(store.can_submit_changes());
    }

    #[test]
    fn test_receive_get_settings_requires_response() {
        let store = store_with(Arc::new(FakeTransport::new("{}")));
        let err = store.receive_get_settings(None).unwrap_err();
        assert_eq!(err.to_string(), "response is required.");
    }

    #[tokio::test]
    async fn test_submit_saves_and_updates_saved_state() {
        let transport = Arc::new(FakeTransport::new("{}"));
        let store = store_with(Arc::clone(&transport));
        store.receive_get_settings(Some(named("alpha"))).unwrap();
        store.set_settings(|s| s.name = Some("beta".into()));

        let result = store.submit_changes().await.unwrap();

        assert_eq!(result, SubmitResult::default());
        assert_eq!(store.saved_settings(), Some(named("beta")));
        assert!(!store.have_settings_changed());
        assert_eq!(store.submit_status(), SubmitStatus::Saved);
        assert!(!store.is_doing_submit_changes());
        assert_eq!(transport.count(Method::POST), 1);
    }

    #[tokio::test]
    async fn test_unchanged_submit_skips_network() {
        let transport = Arc::new(FakeTransport::new("{}"));
        let store = store_with(Arc::clone(&transport));
        store.receive_get_settings(Some(named("alpha"))).unwrap();

        store
            .client
            .get::<Value>(&Route::new("modules", "demo", "accounts"), &QueryParams::new(), GetOptions::default())
            .await
            .unwrap();
        store
            .client
            .get::<Value>(&Route::new("modules", "other", "accounts"), &QueryParams::new(), GetOptions::default())
            .await
            .unwrap();
        assert_eq!(store.client.cache().len().await.unwrap(), 2);

        let result = store.submit_changes().await.unwrap();

        assert_eq!(result, SubmitResult::default());
        assert_eq!(transport.count(Method::POST), 0);
        assert_eq!(store.submit_status(), SubmitStatus::Saved);
        // Only the demo module's responses are evicted.
        assert_eq!(store.client.cache().len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_local_edits() {
        let mut transport = FakeTransport::new("{}");
        transport.post_status = StatusCode::INTERNAL_SERVER_ERROR;
        let store = store_with(Arc::new(transport));
        store.receive_get_settings(Some(named("alpha"))).unwrap();
        store.set_settings(|s| s.name = Some("beta".into()));

        let result = store.submit_changes().await.unwrap();

        let error = result.error.unwrap();
        assert_eq!(error.code, "internal_server_error");
        assert_eq!(store.get_error(), Some(error));
        assert_eq!(store.settings_ref(), Some(named("beta")));
        assert_eq!(store.saved_settings(), Some(named("alpha")));
        assert_eq!(store.submit_status(), SubmitStatus::SubmitError);

        store.rollback_settings();
        assert_eq!(store.get_error(), None);
        assert_eq!(store.settings_ref(), Some(named("alpha")));
    }

    #[tokio::test]
    async fn test_second_submit_while_submitting_is_rejected() {
        let gate = Arc::new(Notify::new());
        let mut transport = FakeTransport::new("{}");
        transport.gate = Some(Arc::clone(&gate));
        let store = store_with(Arc::new(transport));
        store.receive_get_settings(Some(named("alpha"))).unwrap();
        store.set_settings(|s| s.name = Some("beta".into()));

        let first = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.submit_changes().await })
        };
        let s = Arc::clone(&store);
        subscribe_until(&*store, || s.is_doing_submit_changes(), Duration::from_secs(1))
            .await
            .unwrap();

        let err = store.submit_changes().await.unwrap_err();
        assert_eq!(err.to_string(), INVARIANT_DOING_SUBMIT_CHANGES);

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), SubmitResult::default());
    }

    #[tokio::test]
    async fn test_dropped_submit_still_completes() {
        let gate = Arc::new(Notify::new());
        let mut transport = FakeTransport::new("{}");
        transport.gate = Some(Arc::clone(&gate));
        let store = store_with(Arc::new(transport));
        store.receive_get_settings(Some(named("alpha"))).unwrap();
        store.set_settings(|s| s.name = Some("beta".into()));

        let caller = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.submit_changes().await })
        };
        let s = Arc::clone(&store);
        subscribe_until(&*store, || s.is_doing_submit_changes(), Duration::from_secs(1))
            .await
            .unwrap();

        caller.abort();
        gate.notify_one();

        subscribe_until(&*store, || !s.is_doing_submit_changes(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.saved_settings(), Some(named("beta")));
    }

    #[tokio::test]
    async fn test_save_flag_survives_edits_during_save() {
        let gate = Arc::new(Notify::new());
        let mut transport = FakeTransport::new("{}");
        transport.gate = Some(Arc::clone(&gate));
        let store = store_with(Arc::new(transport));
        store.receive_get_settings(Some(named("alpha"))).unwrap();
        store.set_settings(|s| s.name = Some("beta".into()));
        assert!(!store.is_fetching_save_settings());

        let submit = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.submit_changes().await })
        };
        let s = Arc::clone(&store);
        subscribe_until(&*store, || s.is_fetching_save_settings(), Duration::from_secs(1))
            .await
            .unwrap();

        store.set_settings(|s| s.name = Some("gamma".into()));
        assert!(store.is_doing_submit_changes());
        assert!(store.is_fetching_save_settings());

        gate.notify_one();
        assert_eq!(submit.await.unwrap().unwrap(), SubmitResult::default());
        assert!(!store.is_fetching_save_settings());
        assert_eq!(store.saved_settings(), Some(named("beta")));
    }

    #[tokio::test]
    async fn test_crashed_submit_releases_submitting_state() {
        let transport = Arc::new(FakeTransport::new("{}"));
        transport.panic_on_post.store(true, Ordering::SeqCst);
        let store = store_with(Arc::clone(&transport));
        store.receive_get_settings(Some(named("alpha"))).unwrap();
        store.set_settings(|s| s.name = Some("beta".into()));

        let err = store.submit_changes().await.unwrap_err();
        assert!(matches!(err, StoreError::Aborted(_)));
        assert!(!store.is_doing_submit_changes());
        assert!(!store.is_fetching_save_settings());
        assert_eq!(store.submit_status(), SubmitStatus::SubmitError);
        assert_eq!(store.settings_ref(), Some(named("beta")));

        transport.panic_on_post.store(false, Ordering::SeqCst);
        let result = store.submit_changes().await.unwrap();
        assert_eq!(result, SubmitResult::default());
        assert_eq!(store.saved_settings(), Some(named("beta")));
    }
}
