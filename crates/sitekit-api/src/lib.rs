//! Fetch client for the Site Kit REST API
//!
//! Issues requests against `/<namespace>/v1/<type>/<identifier>/data/<datapoint>`
//! routes and returns decoded JSON or a typed [`ApiError`].
//!
//! ## Features
//!
//! - **Trait-based transport**: mockable via [`Transport`]
//! - **Response caching**: successful GETs memoized by request signature
//! - **Family invalidation**: a write evicts every cached read of its datapoint
//! - **No retries**: retry policy belongs to the caller

pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod transport;

pub use client::{ApiClient, GetOptions};
pub use config::ApiConfig;
pub use descriptor::{cache_prefix, QueryParams, RequestDescriptor, Route};
pub use error::{ApiError, ApiErrorData, HttpError, Result};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Re-export commonly used types
pub use reqwest::{Method, StatusCode};
