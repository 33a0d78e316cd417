//! `core/site` store

pub mod html;

use std::sync::Arc;

use sitekit_api::{ApiClient, ApiError};
use sitekit_data::{FetchOutcome, FetchStore, Registry, Result, Store, StoreCore};

pub use html::{HtmlForUrl, HtmlParams};

pub const CORE_SITE: &str = "core/site";

pub struct SiteStore {
    core: Arc<StoreCore>,
    html: Arc<FetchStore<HtmlForUrl>>,
}

impl SiteStore {
    pub fn new(client: Arc<ApiClient>) -> Arc<Self> {
        let core = StoreCore::new(CORE_SITE);
        let html = FetchStore::new(Arc::clone(&core), HtmlForUrl::new(client));
        Arc::new(Self { core, html })
    }

    /// Create the store and register it under [`CORE_SITE`]
    pub fn register(registry: &Registry, client: Arc<ApiClient>) -> Result<Arc<Self>> {
        let store = Self::new(client);
        registry.register_store(CORE_SITE, Arc::clone(&store))?;
        Ok(store)
    }

    /// HTML of `url`, or `None` while it is being fetched
    pub fn get_html_for_url(&self, url: &str) -> Option<String> {
        self.html.get(&(url.to_string(),))
    }

    pub fn is_fetching_get_html_for_url(&self, url: &str) -> bool {
        self.html.is_fetching(&(url.to_string(),))
    }

    pub fn has_finished_resolution_get_html_for_url(&self, url: &str) -> bool {
        self.html.has_finished_resolution(&(url.to_string(),))
    }

    pub fn get_error_for_html_for_url(&self, url: &str) -> Option<ApiError> {
        self.html.error(&(url.to_string(),))
    }

    pub async fn fetch_get_html_for_url(&self, url: &str) -> Result<FetchOutcome<String>> {
        self.html.fetch(&(url.to_string(),)).await
    }

    pub fn receive_get_html_for_url(
        &self,
        html: Option<String>,
        params: Option<HtmlParams>,
    ) -> Result<()> {
        self.html.receive(html, params)
    }

    /// Forget the HTML of `url` so the next read fetches again
    pub fn reset_html_for_url(&self, url: &str) {
        self.html.reset(&(url.to_string(),));
    }
}

impl Store for SiteStore {
    fn core(&self) -> &Arc<StoreCore> {
        &self.core
    }
}
