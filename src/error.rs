//! Error taxonomy of the request pipeline and its mapping onto HTTP responses.
//!
//! | Variant | Status | `error` |
//! |---|---|---|
//! | [`DispatchError::NotFound`] | 404 | `not_found` |
//! | [`DispatchError::MethodNotAllowed`] | 405 (+ `Allow`) | `method_not_allowed` |
//! | [`DispatchError::Validation`] | 422 | `validation_error` |
//! | [`DispatchError::Dependency`] | provider's status | `dependency_error` |
//! | [`DispatchError::Application`] | handler's status | `application_error` |
//! | [`DispatchError::ResponseValidation`] | 500 | `response_validation_error` |
//! | [`DispatchError::Internal`] | 500 | `internal_error` |

use crate::ids::RequestId;
use crate::validator::ValidationError;
use http::Method;
use serde_json::{json, Value};
use std::fmt;

/// Error raised deliberately by a handler or provider.
///
/// Carries its own status, a JSON detail and optional extra response headers
/// (e.g. `WWW-Authenticate` on a 401).
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationError {
    pub status: u16,
    pub detail: Value,
    pub headers: Vec<(String, String)>,
}

impl ApplicationError {
    pub fn new(status: u16, detail: impl Into<Value>) -> Self {
        ApplicationError {
            status,
            detail: detail.into(),
            headers: Vec::new(),
        }
    }

    pub fn bad_request(detail: impl Into<Value>) -> Self {
        Self::new(400, detail)
    }

    pub fn unauthorized(detail: impl Into<Value>) -> Self {
        Self::new(401, detail)
    }

    pub fn forbidden(detail: impl Into<Value>) -> Self {
        Self::new(403, detail)
    }

    pub fn not_found(detail: impl Into<Value>) -> Self {
        Self::new(404, detail)
    }

    pub fn internal(detail: impl Into<Value>) -> Self {
        Self::new(500, detail)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Value::String(s) => write!(f, "{} {}", self.status, s),
            other => write!(f, "{} {}", self.status, other),
        }
    }
}

impl std::error::Error for ApplicationError {}

/// Why a dispatch ended in the `Errored` stage.
#[derive(Debug, Clone)]
pub enum DispatchError {
    NotFound {
        method: String,
        path: String,
    },
    MethodNotAllowed {
        method: String,
        path: String,
        allowed: Vec<Method>,
    },
    /// Request parameters or body failed binding
    Validation(ValidationError),
    /// A provider raised an application error while being resolved
    Dependency {
        provider: String,
        source: ApplicationError,
    },
    Application(ApplicationError),
    /// The handler's result does not fit the declared output type
    ResponseValidation(ValidationError),
    Internal(String),
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::MethodNotAllowed { .. } => 405,
            DispatchError::Validation(_) => 422,
            DispatchError::Dependency { source, .. } => source.status,
            DispatchError::Application(e) => e.status,
            DispatchError::ResponseValidation(_) | DispatchError::Internal(_) => 500,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::NotFound { .. } => "not_found",
            DispatchError::MethodNotAllowed { .. } => "method_not_allowed",
            DispatchError::Validation(_) => "validation_error",
            DispatchError::Dependency { .. } => "dependency_error",
            DispatchError::Application(_) => "application_error",
            DispatchError::ResponseValidation(_) => "response_validation_error",
            DispatchError::Internal(_) => "internal_error",
        }
    }

    /// Extra headers the error response must carry.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        match self {
            DispatchError::MethodNotAllowed { allowed, .. } => {
                let list: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                vec![("Allow".to_string(), list.join(", "))]
            }
            DispatchError::Dependency { source, .. } => source.headers.clone(),
            DispatchError::Application(e) => e.headers.clone(),
            _ => Vec::new(),
        }
    }

    /// JSON error body: `{"error", "message", "detail", "request_id"}`.
    ///
    /// Response validation failures are logged in full but only summarized to the
    /// client.
    #[must_use]
    pub fn to_body(&self, request_id: &RequestId) -> Value {
        let detail = match self {
            DispatchError::Validation(err) => err.to_json(),
            DispatchError::Dependency { source, .. } => source.detail.clone(),
            DispatchError::Application(e) => e.detail.clone(),
            DispatchError::MethodNotAllowed { allowed, .. } => {
                json!(allowed.iter().map(Method::as_str).collect::<Vec<_>>())
            }
            _ => Value::Null,
        };
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "request_id": request_id,
        });
        if !detail.is_null() {
            body["detail"] = detail;
        }
        body
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound { method, path } => {
                write!(f, "No route matches {method} {path}")
            }
            DispatchError::MethodNotAllowed { method, path, .. } => {
                write!(f, "Method {method} not allowed for {path}")
            }
            DispatchError::Validation(err) => write!(f, "Request validation failed: {err}"),
            DispatchError::Dependency { provider, source } => {
                write!(f, "Dependency '{provider}' failed: {source}")
            }
            DispatchError::Application(e) => match &e.detail {
                Value::String(s) => f.write_str(s),
                _ => write!(f, "Handler returned status {}", e.status),
            },
            DispatchError::ResponseValidation(_) => {
                f.write_str("Handler response does not match the declared output")
            }
            DispatchError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Validation(err) | DispatchError::ResponseValidation(err) => Some(err),
            DispatchError::Dependency { source, .. } => Some(source),
            DispatchError::Application(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for DispatchError {
    fn from(err: ValidationError) -> Self {
        DispatchError::Validation(err)
    }
}

impl From<ApplicationError> for DispatchError {
    fn from(err: ApplicationError) -> Self {
        DispatchError::Application(err)
    }
}
