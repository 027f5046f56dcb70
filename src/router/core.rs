//! Router core module - hot path for request routing.

use crate::spec::{ParameterLocation, RouteSpec};
use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::radix::{parse_template, split_path, RadixRouter};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Path parameters in template order. Names are shared with the route tree.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteSpec>,
    /// Percent-decoded placeholder captures (`{file_path:path}` → `"a/b/c.txt"`)
    pub path_params: ParamVec,
}

impl RouteMatch {
    #[inline]
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.route.handler_name
    }

    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    NotFound,
    /// The path matches at least one template, none registered for the method
    MethodNotAllowed { allowed: Vec<Method> },
}

/// Rejected route registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    InvalidTemplate { template: String, reason: String },
    Duplicate { method: Method, template: String },
    /// Placeholder with no `Path` parameter declared for it
    UndeclaredPlaceholder { template: String, name: String },
    /// `Path` parameter whose name does not appear in the template
    UnboundPathParameter { template: String, name: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidTemplate { template, reason } => {
                write!(f, "invalid path template '{template}': {reason}")
            }
            RouteError::Duplicate { method, template } => {
                write!(f, "route {method} {template} is already registered")
            }
            RouteError::UndeclaredPlaceholder { template, name } => write!(
                f,
                "placeholder '{{{name}}}' in '{template}' has no path parameter declared"
            ),
            RouteError::UnboundPathParameter { template, name } => write!(
                f,
                "path parameter '{name}' does not appear in '{template}'"
            ),
        }
    }
}

impl std::error::Error for RouteError {}

/// Route registry backed by a radix tree.
///
/// Matching is deterministic: the same method and path always produce the same
/// route or the same error.
#[derive(Clone, Default)]
pub struct Router {
    radix_router: RadixRouter,
    routes: Vec<Arc<RouteSpec>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            radix_router: RadixRouter::new(),
            routes: Vec::new(),
        }
    }

    /// Register a route after checking its template against its parameter table.
    pub fn add_route(&mut self, route: Arc<RouteSpec>) -> Result<(), RouteError> {
        let template = &route.path_template;
        let segments = parse_template(template)?;

        let placeholders: Vec<&str> = segments.iter().filter_map(|s| s.param_name()).collect();
        for name in &placeholders {
            let declared = route
                .parameters_in(ParameterLocation::Path)
                .any(|p| p.name == *name);
            if !declared {
                return Err(RouteError::UndeclaredPlaceholder {
                    template: template.clone(),
                    name: (*name).to_string(),
                });
            }
        }
        if let Some(p) = route
            .parameters_in(ParameterLocation::Path)
            .find(|p| !placeholders.contains(&p.name.as_str()))
        {
            return Err(RouteError::UnboundPathParameter {
                template: template.clone(),
                name: p.name.clone(),
            });
        }

        self.radix_router
            .insert(&segments, route.method.clone(), Arc::clone(&route))?;
        debug!(
            method = %route.method,
            template = %route.path_template,
            handler_name = %route.handler_name,
            "Route registered"
        );
        self.routes.push(route);
        Ok(())
    }

    /// Match a request path (without query string) for `method`.
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch, MatchError> {
        debug!(method = %method, path = %path, "Route match attempt");
        let match_start = Instant::now();

        let decoded = decode_segments(path);
        let segments: Vec<&str> = decoded.iter().map(|s| &**s).collect();
        let search = self.radix_router.search(&segments, Some(method));
        let match_duration = match_start.elapsed();

        if let Some((route, path_params)) = search.route {
            if match_duration > Duration::from_millis(1) {
                warn!(
                    method = %method,
                    path = %path,
                    handler_name = %route.handler_name,
                    route_pattern = %route.path_template,
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            } else {
                info!(
                    method = %method,
                    path = %path,
                    handler_name = %route.handler_name,
                    route_pattern = %route.path_template,
                    path_params = ?path_params,
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
            }
            return Ok(RouteMatch { route, path_params });
        }

        if search.allowed.is_empty() {
            warn!(method = %method, path = %path, "No route matched");
            Err(MatchError::NotFound)
        } else {
            warn!(
                method = %method,
                path = %path,
                allowed = ?search.allowed,
                "Path matched but method not allowed"
            );
            Err(MatchError::MethodNotAllowed {
                allowed: search.allowed,
            })
        }
    }

    /// Every method registered on a template matching `path`.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let decoded = decode_segments(path);
        let segments: Vec<&str> = decoded.iter().map(|s| &**s).collect();
        self.radix_router.search(&segments, None).allowed
    }

    /// Registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<RouteSpec>] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// One line per route: `GET /items/{item_id} -> read_item`.
    #[must_use]
    pub fn describe_routes(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| format!("{} {} -> {}", r.method, r.path_template, r.handler_name))
            .collect()
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for line in self.describe_routes() {
            println!("[route] {line}");
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.describe_routes())
            .finish()
    }
}

fn decode_segments(path: &str) -> Vec<Cow<'_, str>> {
    split_path(path)
        .into_iter()
        .map(|seg| urlencoding::decode(seg).unwrap_or(Cow::Borrowed(seg)))
        .collect()
}
