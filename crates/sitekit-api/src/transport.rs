//! HTTP transport

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::{
    config::ApiConfig,
    error::{ApiError, HttpError},
};

/// A fully resolved HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<serde_json::Value>,
}

/// Status and raw body of an HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Mockable transport trait. Implementations perform exactly one attempt;
/// a failure that produced no response is reported as `fetch_error`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Production transport backed by reqwest
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with configuration
    pub fn new(config: &ApiConfig) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(if config.max_redirects > 0 {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            });

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Get underlying reqwest client (for advanced usage)
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!("HTTP {}: {}", request.method, request.url);

        let mut builder = self.inner.request(request.method, request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::fetch_error(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::fetch_error(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_creation_with_defaults() {
        assert!(ReqwestTransport::new(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_transport_with_proxy() {
        let config = ApiConfig::default().with_proxy("http://proxy.example.com:8080");
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn test_invalid_proxy() {
        let config = ApiConfig::default().with_proxy("invalid proxy");
        let result = ReqwestTransport::new(&config);
        assert!(matches!(result, Err(HttpError::InvalidProxy(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let config = ApiConfig::default().with_timeout(Duration::from_millis(200));
        let transport = ReqwestTransport::new(&config).unwrap();
        let request = HttpRequest {
            method: Method::GET,
            url: Url::parse("http://127.0.0.1:9/unreachable").unwrap(),
            body: None,
        };

        let error = transport.send(request).await.unwrap_err();
        assert_eq!(error.code, crate::error::ERROR_CODE_FETCH);
    }
}
