use crate::dispatcher::HandlerResponse;
use crate::router::Router;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, error};

/// Upper bound on header lines interned while serving, on top of the preloaded ones.
const MAX_DYNAMIC_HEADER_LINES: usize = 1024;

/// `may_minihttp` keeps at most this many header lines per response.
pub(crate) const MAX_RESPONSE_HEADERS: usize = 16;

const CONTENT_TYPE_JSON: &str = "content-type: application/json";
const INTERNAL_ERROR_BODY: &str = "{\"error\":\"internal_error\",\"message\":\"Internal Server Error\"}";

/// `may_minihttp` only accepts `&'static str` header lines. Lines are leaked
/// once and reused for the life of the process.
static INTERNED_HEADERS: Lazy<HeaderInterner> =
    Lazy::new(|| HeaderInterner::new(MAX_DYNAMIC_HEADER_LINES));

/// Why a response's headers could not be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HeaderWriteError {
    TooMany(usize),
    InternerFull(String),
}

impl fmt::Display for HeaderWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderWriteError::TooMany(n) => {
                write!(f, "{n} headers exceed the limit of {MAX_RESPONSE_HEADERS}")
            }
            HeaderWriteError::InternerFull(name) => {
                write!(f, "header line table is full; cannot write `{name}`")
            }
        }
    }
}

#[derive(Default)]
struct InternedLines {
    lines: HashSet<&'static str>,
    dynamic: usize,
}

pub(crate) struct HeaderInterner {
    inner: Mutex<InternedLines>,
    dynamic_capacity: usize,
}

impl HeaderInterner {
    pub(crate) fn new(dynamic_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(InternedLines::default()),
            dynamic_capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InternedLines> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Intern lines known before serving starts; they never count against the cap.
    pub(crate) fn preload<I>(&self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut interned = self.lock();
        for line in lines {
            if !interned.lines.contains(line.as_str()) {
                interned.lines.insert(Box::leak(line.into_boxed_str()));
            }
        }
    }

    /// `None` once the dynamic table is full and the line was never seen.
    pub(crate) fn intern(&self, name: &str, value: &str) -> Option<&'static str> {
        let line = format!("{name}: {value}");
        let mut interned = self.lock();
        if let Some(existing) = interned.lines.get(line.as_str()) {
            return Some(*existing);
        }
        if interned.dynamic >= self.dynamic_capacity {
            return None;
        }
        let leaked: &'static str = Box::leak(line.into_boxed_str());
        interned.lines.insert(leaked);
        interned.dynamic += 1;
        Some(leaked)
    }

    /// Every header of `response` as a static line, or the reason it cannot be sent.
    pub(crate) fn resolve(
        &self,
        response: &HandlerResponse,
    ) -> Result<SmallVec<[&'static str; MAX_RESPONSE_HEADERS]>, HeaderWriteError> {
        if response.headers.len() > MAX_RESPONSE_HEADERS {
            return Err(HeaderWriteError::TooMany(response.headers.len()));
        }
        response
            .headers
            .iter()
            .map(|(name, value)| {
                self.intern(name, value)
                    .ok_or_else(|| HeaderWriteError::InternerFull(name.to_string()))
            })
            .collect()
    }
}

/// Header lines every served app can emit: the JSON content type, the bearer
/// challenge and one `Allow` line per path template.
pub(crate) fn fixed_header_lines(router: &Router) -> Vec<String> {
    let mut templates: Vec<(&str, Vec<&str>)> = Vec::new();
    for route in router.routes() {
        let method = route.method.as_str();
        match templates.iter_mut().find(|(t, _)| *t == route.path_template) {
            Some((_, methods)) if !methods.contains(&method) => methods.push(method),
            Some(_) => {}
            None => templates.push((route.path_template.as_str(), vec![method])),
        }
    }
    let mut lines = vec![
        CONTENT_TYPE_JSON.to_string(),
        "WWW-Authenticate: Bearer".to_string(),
    ];
    lines.extend(templates.into_iter().map(|(_, methods)| format!("Allow: {}", methods.join(", "))));
    lines
}

/// Intern the content type, bearer challenge and `Allow` lines of `router`
/// in the process-wide table.
pub fn preload_header_lines(router: &Router) {
    let lines = fixed_header_lines(router);
    debug!(count = lines.len(), "Preloading response header lines");
    INTERNED_HEADERS.preload(lines);
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ if status < 300 => "OK",
        _ if status < 400 => "Redirect",
        _ if status < 500 => "Client Error",
        _ => "Server Error",
    }
}

fn write_internal_error(res: &mut Response) {
    res.status_code(500, status_reason(500));
    res.header(CONTENT_TYPE_JSON);
    res.body(INTERNAL_ERROR_BODY);
}

/// Write a dispatch result to the wire.
///
/// `null` bodies of 204 responses are sent empty; everything else is JSON.
/// A response whose headers cannot all be written is replaced by a 500.
pub fn write_handler_response(res: &mut Response, response: HandlerResponse) {
    let lines = match INTERNED_HEADERS.resolve(&response) {
        Ok(lines) => lines,
        Err(e) => {
            error!(status = response.status, error = %e, "Response headers cannot be written");
            write_internal_error(res);
            return;
        }
    };
    res.status_code(usize::from(response.status), status_reason(response.status));
    for line in lines {
        res.header(line);
    }
    if response.status == 204 && response.body == Value::Null {
        return;
    }
    match serde_json::to_vec(&response.body) {
        Ok(bytes) => res.body_vec(bytes),
        Err(e) => {
            error!(error = %e, "Response body serialization failed");
            res.status_code(500, status_reason(500));
            res.body(INTERNAL_ERROR_BODY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RouteSpec;
    use http::Method;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(422), "Unprocessable Entity");
        assert_eq!(status_reason(418), "Client Error");
    }

    fn unauthorized() -> HandlerResponse {
        let mut response = HandlerResponse::json(401, serde_json::json!({"error": "unauthorized"}));
        response.set_header("WWW-Authenticate", "Bearer".to_string());
        response
    }

    #[test]
    fn test_header_lines_are_interned_once() {
        let interner = HeaderInterner::new(4);
        let a = interner.intern("content-type", "application/json").unwrap();
        let b = interner.intern("content-type", "application/json").unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a, "content-type: application/json");
    }

    #[test]
    fn test_preloaded_challenge_survives_a_full_table() {
        let interner = HeaderInterner::new(3);
        interner.preload([CONTENT_TYPE_JSON.to_string(), "WWW-Authenticate: Bearer".to_string()]);
        for i in 0..3 {
            assert!(interner.intern("x-trace", &i.to_string()).is_some());
        }
        assert_eq!(interner.intern("x-trace", "overflow"), None);

        let lines = interner.resolve(&unauthorized()).unwrap();
        assert_eq!(lines.as_slice(), [CONTENT_TYPE_JSON, "WWW-Authenticate: Bearer"]);
    }

    #[test]
    fn test_unwritable_headers_are_reported() {
        let interner = HeaderInterner::new(0);
        let mut response = unauthorized();
        response.set_header("X-Error", "There goes my error".to_string());
        assert_eq!(
            interner.resolve(&response),
            Err(HeaderWriteError::InternerFull("content-type".to_string()))
        );

        let interner = HeaderInterner::new(64);
        let mut crowded = HandlerResponse::json(200, Value::Null);
        for i in 0..MAX_RESPONSE_HEADERS {
            crowded.set_header(&format!("x-h{i}"), "1".to_string());
        }
        assert_eq!(
            interner.resolve(&crowded),
            Err(HeaderWriteError::TooMany(MAX_RESPONSE_HEADERS + 1))
        );
    }

    #[test]
    fn test_fixed_lines_cover_allow_per_template() {
        let mut router = Router::new();
        for method in [Method::GET, Method::POST] {
            router
                .add_route(std::sync::Arc::new(
                    RouteSpec::builder(method, "/items/", "items").handler(|_| Ok(Value::Null)),
                ))
                .unwrap();
        }
        let lines = fixed_header_lines(&router);
        assert!(lines.contains(&"WWW-Authenticate: Bearer".to_string()));
        assert!(lines.contains(&"Allow: GET, POST".to_string()));
    }
}
