//! Site Kit API client

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sitekit_cache::ResponseCache;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::ApiConfig,
    descriptor::{cache_prefix, query_value, QueryParams, RequestDescriptor, Route},
    error::{ApiError, HttpError, Result, ERROR_CODE_INVALID_JSON},
    transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport},
};

/// Per-call options for [`ApiClient::get`]
#[derive(Debug, Clone, Copy)]
pub struct GetOptions {
    /// Read from and write to the response cache (when globally enabled)
    pub use_cache: bool,
    /// Expiry for the cached response; `None` keeps it until invalidated
    pub ttl: Option<Duration>,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            ttl: None,
        }
    }
}

impl GetOptions {
    pub fn no_cache() -> Self {
        Self {
            use_cache: false,
            ttl: None,
        }
    }
}

/// Client for the Site Kit REST surface.
///
/// No retries happen here; a failed request is returned to the caller as
/// an [`ApiError`].
pub struct ApiClient {
    config: ApiConfig,
    base: Url,
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache>,
    using_cache: AtomicBool,
}

impl ApiClient {
    /// Create a client with the reqwest transport
    pub fn new(config: ApiConfig) -> std::result::Result<Self, HttpError> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create a client with a custom transport
    pub fn with_transport(
        config: ApiConfig,
        transport: Arc<dyn Transport>,
    ) -> std::result::Result<Self, HttpError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        let using_cache = AtomicBool::new(config.use_cache);

        Ok(Self {
            config,
            base,
            transport,
            cache: Arc::new(ResponseCache::default()),
            using_cache,
        })
    }

    /// Replace the response cache
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Globally enable or disable response caching
    pub fn set_using_cache(&self, enabled: bool) {
        self.using_cache.store(enabled, Ordering::SeqCst);
    }

    pub fn using_cache(&self) -> bool {
        self.using_cache.load(Ordering::SeqCst)
    }

    /// Read a datapoint. Successful responses are memoized under the route's
    /// cache key when caching is enabled.
    pub async fn get<T: DeserializeOwned>(
        &self,
        route: &Route,
        query: &QueryParams,
        options: GetOptions,
    ) -> Result<T> {
        let cacheable = options.use_cache && self.using_cache();
        let key = route.cache_key(query);

        if cacheable {
            match self.cache.get::<Value>(&key).await {
                Ok(Some(cached)) => {
                    debug!(key = %key, "Serving response from cache");
                    return decode(cached);
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Cache read failed"),
            }
        }

        let descriptor =
            RequestDescriptor::route(route, &self.config.namespace).with_query(query.clone());
        let payload = self.request(&descriptor).await?;

        if cacheable {
            if let Err(e) = self.cache.set(&key, payload.clone(), options.ttl).await {
                warn!(key = %key, error = %e, "Cache write failed");
            }
        }

        decode(payload)
    }

    /// Write a datapoint. The body is wrapped as `{"data": body}`. On success
    /// every cached read of the same datapoint is invalidated.
    pub async fn set<B: Serialize, T: DeserializeOwned>(&self, route: &Route, body: &B) -> Result<T> {
        let data = serde_json::to_value(body)
            .map_err(|e| ApiError::new(ERROR_CODE_INVALID_JSON, e.to_string(), None))?;
        let descriptor = RequestDescriptor::post(route.path(&self.config.namespace))
            .with_body(serde_json::json!({ "data": data }));

        let payload = self.request(&descriptor).await?;
        self.invalidate_cache(&route.kind, Some(&route.identifier), Some(&route.datapoint))
            .await;

        decode(payload)
    }

    /// Evict every cached response of the `(kind, identifier, datapoint)`
    /// family. Returns the number of evicted entries.
    pub async fn invalidate_cache(
        &self,
        kind: &str,
        identifier: Option<&str>,
        datapoint: Option<&str>,
    ) -> usize {
        let prefix = cache_prefix(kind, identifier, datapoint);
        match self.cache.remove_prefix(&prefix).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "Cache invalidation failed");
                0
            }
        }
    }

    /// Fetch a page and return the raw body. Never cached.
    pub async fn fetch_text(&self, url: &str, query: &QueryParams) -> Result<String> {
        let descriptor = RequestDescriptor::get(url).with_query(query.clone());
        let response = self.send(&descriptor).await?;
        Ok(response.body)
    }

    /// Issue a descriptor and decode the JSON payload
    pub async fn request(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let response = self.send(descriptor).await?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| {
            ApiError::new(
                ERROR_CODE_INVALID_JSON,
                e.to_string(),
                Some(response.status.as_u16()),
            )
        })
    }

    async fn send(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse> {
        let url = self.resolve_url(descriptor)?;
        let request = HttpRequest {
            method: descriptor.method.clone(),
            url,
            body: descriptor.body_params.clone(),
        };

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            let error = ApiError::from_response(
                response.status.as_u16(),
                response.status.canonical_reason(),
                &response.body,
            );
            debug!(
                path = %descriptor.path,
                code = %error.code,
                status = ?error.status(),
                "Request failed"
            );
            return Err(error);
        }

        Ok(response)
    }

    fn resolve_url(&self, descriptor: &RequestDescriptor) -> Result<Url> {
        let mut url = if descriptor.is_absolute() {
            Url::parse(&descriptor.path)
                .map_err(|e| ApiError::fetch_error(format!("Invalid URL: {e}")))?
        } else {
            if Route::parse(&descriptor.path, &self.config.namespace).is_none() {
                return Err(ApiError::unknown_endpoint(&descriptor.path));
            }
            let mut url = self.base.clone();
            let joined = format!(
                "{}/{}",
                url.path().trim_end_matches('/'),
                descriptor.path.trim_start_matches('/')
            );
            url.set_path(&joined);
            url
        };

        if !descriptor.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &descriptor.query_params {
                pairs.append_pair(key, &query_value(value));
            }
        }

        Ok(url)
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| ApiError::new(ERROR_CODE_INVALID_JSON, e.to_string(), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ERROR_CODE_UNKNOWN_ENDPOINT;

    fn client() -> ApiClient {
        ApiClient::new(ApiConfig::default().with_base_url("https://example.com/wp-json")).unwrap()
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = ApiClient::new(ApiConfig::default().with_base_url("not a url"));
        assert!(matches!(result, Err(HttpError::InvalidUrl(_))));
    }

    #[test]
    fn test_route_url_resolution() {
        let client = client();
        let route = Route::new("core", "site", "connection");
        let descriptor = RequestDescriptor::route(&route, "google-site-kit")
            .with_query_param("timestamp", 5);

        let url = client.resolve_url(&descriptor).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/wp-json/google-site-kit/v1/core/site/data/connection?timestamp=5"
        );
    }

    #[tokio::test]
    async fn test_unregistered_path_is_rejected_without_network() {
        let client = client();
        let error = client
            .request(&RequestDescriptor::get("/wp/v2/posts"))
            .await
            .unwrap_err();
        assert_eq!(error.code, ERROR_CODE_UNKNOWN_ENDPOINT);
    }

    #[test]
    fn test_using_cache_toggle() {
        let client = client();
        assert!(client.using_cache());
        client.set_using_cache(false);
        assert!(!client.using_cache());
    }
}
