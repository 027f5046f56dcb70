//! Raw request input and the request-scoped [`RequestContext`].

use crate::dependency::ProviderOutput;
use crate::ids::RequestId;
use crate::router::ParamVec;
use crate::server::request::{parse_cookies, parse_query_params, split_target};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage; names are lowercased.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Transport-neutral request as handed to [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRequest {
    pub method: String,
    /// Path plus optional query string, e.g. `/items/?q=a&q=b`
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        RawRequest {
            method: method.into(),
            target: target.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as the request body and set `content-type: application/json`.
    pub fn json_body(mut self, body: &Value) -> Self {
        self.body = body.to_string().into_bytes();
        self.header("content-type", "application/json")
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Everything one request owns while it moves through the pipeline.
///
/// Created from a [`RawRequest`] when dispatch starts and dropped once the
/// response has been built; the dependency cache lives and dies with it.
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: String,
    /// Path without the query string
    pub path: String,
    path_params: ParamVec,
    query: Vec<(String, String)>,
    headers: HeaderVec,
    cookies: Vec<(String, String)>,
    body: Option<Value>,
    body_error: Option<String>,
    pub(crate) cache: HashMap<String, ProviderOutput>,
}

impl RequestContext {
    pub fn from_raw(raw: RawRequest) -> Self {
        let (path, query_str) = split_target(&raw.target);
        let query = parse_query_params(query_str);
        let headers: HeaderVec = raw
            .headers
            .into_iter()
            .map(|(k, v)| (Arc::from(k.to_ascii_lowercase()), v))
            .collect();
        let cookies = headers
            .iter()
            .filter(|(k, _)| k.as_ref() == "cookie")
            .flat_map(|(_, v)| parse_cookies(v))
            .collect();
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.as_ref() == RequestId::HEADER)
                .map(|(_, v)| v.as_str()),
        );

        let (body, body_error) = if raw.body.iter().all(u8::is_ascii_whitespace) {
            (None, None)
        } else {
            match serde_json::from_slice::<Value>(&raw.body) {
                Ok(v) => (Some(v), None),
                Err(e) => {
                    debug!(request_id = %request_id, error = %e, "JSON body parse failed");
                    (None, Some(e.to_string()))
                }
            }
        };

        RequestContext {
            request_id,
            method: raw.method,
            path: path.to_string(),
            path_params: ParamVec::new(),
            query,
            headers,
            cookies,
            body,
            body_error,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    /// Every value of a repeated query key, in request order.
    #[must_use]
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Last value of a query key.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Header by name, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parsed JSON body, if one was sent and parsed.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Parse error of a non-empty body that was not valid JSON.
    #[must_use]
    pub fn body_error(&self) -> Option<&str> {
        self.body_error.as_deref()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("path_params", &self.path_params)
            .field("query", &self.query)
            .field("header_count", &self.headers.len())
            .field("cookie_names", &self.cookies.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("has_body", &self.body.is_some())
            .field("cached_providers", &self.cache.keys().collect::<Vec<_>>())
            .finish()
    }
}
