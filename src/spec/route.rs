use super::types::{ParameterLocation, ParameterSpec};
use crate::dispatcher::HandlerRequest;
use crate::error::ApplicationError;
use crate::schema::ValueType;
use crate::typed::{handler_fn, typed_handler, Handler};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Type-erased handler body stored on every route.
pub type HandlerFn =
    Arc<dyn Fn(&HandlerRequest<'_>) -> Result<Value, ApplicationError> + Send + Sync>;

/// A handler's complete contract: where it is mounted, what it reads,
/// what it depends on and what it may return.
#[derive(Clone)]
pub struct RouteSpec {
    pub method: Method,
    /// Path template such as `/items/{item_id}` or `/files/{file_path:path}`
    pub path_template: String,
    pub handler_name: String,
    pub parameters: Vec<ParameterSpec>,
    /// Provider names, resolved before the handler runs
    pub dependencies: Vec<String>,
    /// Declared response type; `None` passes the handler result through
    pub output: Option<ValueType>,
    pub status_code: u16,
    pub handler: HandlerFn,
}

impl RouteSpec {
    pub fn builder(
        method: Method,
        path_template: impl Into<String>,
        handler_name: impl Into<String>,
    ) -> RouteSpecBuilder {
        RouteSpecBuilder {
            method,
            path_template: path_template.into(),
            handler_name: handler_name.into(),
            parameters: Vec::new(),
            dependencies: Vec::new(),
            output: None,
            status_code: 200,
        }
    }

    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterSpec> + '_ {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path_template", &self.path_template)
            .field("handler_name", &self.handler_name)
            .field("parameters", &self.parameters)
            .field("dependencies", &self.dependencies)
            .field("output", &self.output.as_ref().map(ValueType::type_name))
            .field("status_code", &self.status_code)
            .finish_non_exhaustive()
    }
}

pub struct RouteSpecBuilder {
    method: Method,
    path_template: String,
    handler_name: String,
    parameters: Vec<ParameterSpec>,
    dependencies: Vec<String>,
    output: Option<ValueType>,
    status_code: u16,
}

impl RouteSpecBuilder {
    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn depends(mut self, provider: impl Into<String>) -> Self {
        self.dependencies.push(provider.into());
        self
    }

    pub fn output(mut self, ty: ValueType) -> Self {
        self.output = Some(ty);
        self
    }

    /// Status used for successful responses (default 200).
    pub fn status(mut self, status: u16) -> Self {
        self.status_code = status;
        self
    }

    /// Finish with a closure handler.
    pub fn handler<F, R>(self, f: F) -> RouteSpec
    where
        F: Fn(&HandlerRequest<'_>) -> Result<R, ApplicationError> + Send + Sync + 'static,
        R: Serialize,
    {
        self.finish(handler_fn(f))
    }

    /// Finish with a [`Handler`] whose request type is deserialized from the bound parameters.
    pub fn typed<H: Handler>(self, handler: H) -> RouteSpec {
        self.finish(typed_handler(handler))
    }

    fn finish(self, handler: HandlerFn) -> RouteSpec {
        RouteSpec {
            method: self.method,
            path_template: self.path_template,
            handler_name: self.handler_name,
            parameters: self.parameters,
            dependencies: self.dependencies,
            output: self.output,
            status_code: self.status_code,
            handler,
        }
    }
}
