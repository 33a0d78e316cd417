//! Request descriptors, routes and cache keys

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters. `serde_json::Map` keeps keys sorted, so two
/// structurally equal queries serialize identically.
pub type QueryParams = Map<String, Value>;

/// A REST route of the shape `/<namespace>/v1/<type>/<identifier>/data/<datapoint>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub kind: String,
    pub identifier: String,
    pub datapoint: String,
}

impl Route {
    pub fn new(
        kind: impl Into<String>,
        identifier: impl Into<String>,
        datapoint: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            identifier: identifier.into(),
            datapoint: datapoint.into(),
        }
    }

    /// Path for this route under `namespace`
    pub fn path(&self, namespace: &str) -> String {
        format!(
            "/{}/v1/{}/{}/data/{}",
            namespace, self.kind, self.identifier, self.datapoint
        )
    }

    /// Parse a path back into a route. Only paths under `namespace` with the
    /// exact registered shape are accepted.
    pub fn parse(path: &str, namespace: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [ns, "v1", kind, identifier, "data", datapoint]
                if *ns == namespace
                    && !kind.is_empty()
                    && !identifier.is_empty()
                    && !datapoint.is_empty() =>
            {
                Some(Self::new(*kind, *identifier, *datapoint))
            }
            _ => None,
        }
    }

    /// Cache key for a GET of this route with `query`
    pub fn cache_key(&self, query: &QueryParams) -> String {
        let query = serde_json::to_string(query).unwrap_or_else(|_| "{}".to_string());
        format!(
            "{}::{}::{}::{}",
            self.kind, self.identifier, self.datapoint, query
        )
    }
}

/// Prefix matching every cache key of the given resource family.
///
/// `("modules", Some("analytics"), None)` yields `modules::analytics::`, which
/// does not match `modules::analytics-4::...`.
pub fn cache_prefix(kind: &str, identifier: Option<&str>, datapoint: Option<&str>) -> String {
    let mut prefix = format!("{kind}::");
    if let Some(identifier) = identifier {
        prefix.push_str(identifier);
        prefix.push_str("::");
        if let Some(datapoint) = datapoint {
            prefix.push_str(datapoint);
            prefix.push_str("::");
        }
    }
    prefix
}

/// A single request against the API surface
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Route path or an absolute URL
    pub path: String,
    pub query_params: QueryParams,
    pub body_params: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: QueryParams::new(),
            body_params: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// GET descriptor for a route
    pub fn route(route: &Route, namespace: &str) -> Self {
        Self::get(route.path(namespace))
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query_params = query;
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body_params = Some(body);
        self
    }

    /// True when `path` is an absolute URL rather than a route
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }
}

/// Render a query value the way WordPress expects it: strings verbatim,
/// everything else as JSON.
pub(crate) fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
