//! Dispatcher core module - hot path for request dispatch.

use crate::binder::{bind_parameters, BoundParams};
use crate::context::{HeaderVec, RawRequest, RequestContext};
use crate::dependency::{resolve_dependencies, ProviderRegistry, ResolvedDependencies};
use crate::error::{ApplicationError, DispatchError};
use crate::ids::RequestId;
use crate::router::{MatchError, Router};
use crate::shaper::shape_response;
use crate::spec::RouteSpec;
use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Pipeline stage a request is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Matching,
    Binding,
    ResolvingDependencies,
    Invoking,
    Shaping,
    Serializing,
    Done,
    Errored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a handler sees: the matched route, its bound parameters and its
/// resolved dependencies, plus read access to the raw request.
#[derive(Clone, Copy)]
pub struct HandlerRequest<'a> {
    context: &'a RequestContext,
    route: &'a RouteSpec,
    params: &'a BoundParams,
    dependencies: &'a ResolvedDependencies,
}

impl<'a> HandlerRequest<'a> {
    pub fn new(
        context: &'a RequestContext,
        route: &'a RouteSpec,
        params: &'a BoundParams,
        dependencies: &'a ResolvedDependencies,
    ) -> Self {
        HandlerRequest {
            context,
            route,
            params,
            dependencies,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.context.request_id
    }

    #[must_use]
    pub fn method(&self) -> &'a Method {
        &self.route.method
    }

    #[must_use]
    pub fn path(&self) -> &'a str {
        &self.context.path
    }

    #[must_use]
    pub fn handler_name(&self) -> &'a str {
        &self.route.handler_name
    }

    #[must_use]
    pub fn route(&self) -> &'a RouteSpec {
        self.route
    }

    #[must_use]
    pub fn context(&self) -> &'a RequestContext {
        self.context
    }

    #[must_use]
    pub fn params(&self) -> &'a BoundParams {
        self.params
    }

    #[must_use]
    pub fn param_value(&self, name: &str) -> Option<&'a Value> {
        self.params.get_value(name)
    }

    /// Bound parameter deserialized as `T`.
    ///
    /// Parameters were validated against their declared type during binding; a
    /// mismatch here means the handler asks for a different type than it
    /// declared and is reported as a 500.
    pub fn param<T: DeserializeOwned>(&self, name: &str) -> Result<T, ApplicationError> {
        self.params.get(name).map_err(|e| {
            error!(
                handler = %self.route.handler_name,
                param = %name,
                error = %e,
                "Bound parameter does not deserialize into the requested type"
            );
            ApplicationError::internal(format!("parameter '{name}' has unexpected type"))
        })
    }

    /// Resolved dependency by provider name.
    pub fn dependency<T: Any + Send + Sync>(&self, name: &str) -> Result<&'a T, ApplicationError> {
        self.dependencies.require(name)
    }
}

impl fmt::Debug for HandlerRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRequest")
            .field("request_id", &self.context.request_id)
            .field("handler_name", &self.route.handler_name)
            .field("params", &self.params)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Final response of a dispatch, ready for a transport to write out.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with a `content-type` header.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Result of one [`Dispatcher::dispatch`] call.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub request_id: RequestId,
    pub response: HandlerResponse,
    /// Why the pipeline stopped early, if it did
    pub error: Option<DispatchError>,
    /// Every stage entered, in order, ending in `Done` or `Errored`
    pub trail: Vec<Stage>,
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn final_stage(&self) -> Stage {
        self.trail.last().copied().unwrap_or(Stage::Matching)
    }
}

/// Drives requests through the pipeline.
///
/// Immutable once built and cheap to clone; every request owns its own
/// [`RequestContext`], so one dispatcher serves any number of coroutines.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    providers: Arc<ProviderRegistry>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Router, providers: ProviderRegistry) -> Self {
        Dispatcher {
            router: Arc::new(router),
            providers: Arc::new(providers),
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Run one request through every stage and build its response.
    ///
    /// Never panics on bad input: every failure becomes a structured error response.
    pub fn dispatch(&self, raw: RawRequest) -> DispatchOutcome {
        let started = Instant::now();
        let mut ctx = RequestContext::from_raw(raw);
        let mut trail = Vec::with_capacity(7);

        let (response, error) = match self.run(&mut ctx, &mut trail) {
            Ok(response) => {
                trail.push(Stage::Done);
                (response, None)
            }
            Err(err) => {
                let failed_in = trail.last().copied().unwrap_or(Stage::Matching);
                trail.push(Stage::Errored);
                log_error(&ctx, failed_in, &err);
                let mut response = HandlerResponse::json(err.status(), err.to_body(&ctx.request_id));
                for (name, value) in err.headers() {
                    response.set_header(&name, value);
                }
                (response, Some(err))
            }
        };

        info!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            status = response.status,
            stage = %trail.last().copied().unwrap_or(Stage::Errored),
            duration_us = started.elapsed().as_micros(),
            "Request dispatched"
        );

        DispatchOutcome {
            request_id: ctx.request_id,
            response,
            error,
            trail,
        }
    }

    fn run(
        &self,
        ctx: &mut RequestContext,
        trail: &mut Vec<Stage>,
    ) -> Result<HandlerResponse, DispatchError> {
        trail.push(Stage::Matching);
        let route_match = match Method::from_bytes(ctx.method.as_bytes()) {
            Ok(method) => self.router.route(&method, &ctx.path),
            Err(_) => {
                let allowed = self.router.allowed_methods(&ctx.path);
                if allowed.is_empty() {
                    Err(MatchError::NotFound)
                } else {
                    Err(MatchError::MethodNotAllowed { allowed })
                }
            }
        }
        .map_err(|e| match e {
            MatchError::NotFound => DispatchError::NotFound {
                method: ctx.method.clone(),
                path: ctx.path.clone(),
            },
            MatchError::MethodNotAllowed { allowed } => DispatchError::MethodNotAllowed {
                method: ctx.method.clone(),
                path: ctx.path.clone(),
                allowed,
            },
        })?;
        let route = Arc::clone(&route_match.route);
        ctx.set_path_params(route_match.path_params);

        trail.push(Stage::Binding);
        let params = bind_parameters(&route.parameters, ctx)?;

        trail.push(Stage::ResolvingDependencies);
        let dependencies = resolve_dependencies(&route.dependencies, &self.providers, ctx)?;

        trail.push(Stage::Invoking);
        let invoke_start = Instant::now();
        let request = HandlerRequest::new(ctx, &route, &params, &dependencies);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            (route.handler)(&request)
        }));
        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(app)) => return Err(DispatchError::Application(app)),
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                error!(
                    request_id = %ctx.request_id,
                    handler_name = %route.handler_name,
                    panic = %msg,
                    "Handler panicked"
                );
                return Err(DispatchError::Internal(format!(
                    "handler '{}' panicked",
                    route.handler_name
                )));
            }
        };
        debug!(
            request_id = %ctx.request_id,
            handler_name = %route.handler_name,
            duration_us = invoke_start.elapsed().as_micros(),
            "Handler returned"
        );

        trail.push(Stage::Shaping);
        let shaped = shape_response(value, route.output.as_ref())
            .map_err(DispatchError::ResponseValidation)?;

        trail.push(Stage::Serializing);
        Ok(HandlerResponse::json(route.status_code, shaped))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("providers", &self.providers)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn log_error(ctx: &RequestContext, stage: Stage, err: &DispatchError) {
    let status = err.status();
    match err {
        DispatchError::ResponseValidation(issues) => error!(
            request_id = %ctx.request_id,
            stage = %stage,
            status,
            issues = %issues,
            "Handler result does not match declared output"
        ),
        _ if status >= 500 => error!(
            request_id = %ctx.request_id,
            stage = %stage,
            status,
            error = %err,
            "Request failed"
        ),
        _ => warn!(
            request_id = %ctx.request_id,
            stage = %stage,
            status,
            kind = err.kind(),
            error = %err,
            "Request rejected"
        ),
    }
}
