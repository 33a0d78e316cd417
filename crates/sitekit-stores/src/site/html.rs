//! HTML for URL
//!
//! Fetches the raw markup of a front-end page, with `tagverify=1` so the
//! site emits its tag verification markers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sitekit_api::{ApiClient, ApiError, QueryParams};
use sitekit_data::{FetchResource, Result, StoreError};
use tracing::debug;
use url::Url;

pub const INVALID_URL: &str = "a valid url parameter is required.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlParams {
    pub url: String,
}

impl HtmlParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// `getHTMLForURL` resource
pub struct HtmlForUrl {
    client: Arc<ApiClient>,
}

impl HtmlForUrl {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchResource for HtmlForUrl {
    type Args = (String,);
    type Params = HtmlParams;
    type Response = String;

    fn base_name(&self) -> &'static str {
        "getHTMLForURL"
    }

    fn args_to_params(&self, args: &(String,)) -> HtmlParams {
        HtmlParams::new(args.0.clone())
    }

    fn validate_params(&self, params: &HtmlParams) -> Result<()> {
        match Url::parse(&params.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(StoreError::validation(INVALID_URL)),
        }
    }

    async fn fetch(&self, params: &HtmlParams) -> std::result::Result<String, ApiError> {
        let mut query = QueryParams::new();
        query.insert("tagverify".into(), json!("1"));
        query.insert("timestamp".into(), json!(chrono::Utc::now().timestamp()));

        debug!(url = %params.url, "Fetching HTML");
        self.client.fetch_text(&params.url, &query).await
    }
}
