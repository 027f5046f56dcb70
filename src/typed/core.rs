use crate::dispatcher::HandlerRequest;
use crate::error::ApplicationError;
use crate::spec::HandlerFn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

/// Trait implemented by typed handlers.
///
/// The request type is deserialized from the already-validated bound parameters
/// (`{"item_id": 5, "q": null}`), so field names follow the parameter names.
pub trait Handler: Send + Sync + 'static {
    /// Typed view of the bound parameters
    type Request: DeserializeOwned;
    /// Serialized to JSON before response shaping
    type Response: Serialize;

    fn handle(
        &self,
        req: TypedHandlerRequest<'_, Self::Request>,
    ) -> Result<Self::Response, ApplicationError>;
}

/// Bound parameters as `T`, plus the untyped request for dependencies and metadata.
pub struct TypedHandlerRequest<'r, T> {
    pub data: T,
    pub raw: &'r HandlerRequest<'r>,
}

impl<'r, T> TypedHandlerRequest<'r, T> {
    /// Look up a resolved dependency by provider name.
    pub fn dependency<D: Send + Sync + 'static>(&self, name: &str) -> Result<&'r D, ApplicationError> {
        self.raw.dependency::<D>(name)
    }
}

fn to_json<R: Serialize>(handler_name: &str, value: R) -> Result<Value, ApplicationError> {
    serde_json::to_value(value).map_err(|e| {
        error!(handler = %handler_name, error = %e, "Failed to serialize handler result");
        ApplicationError::internal("Failed to serialize response")
    })
}

/// Erase a closure handler into a [`HandlerFn`].
pub fn handler_fn<F, R>(f: F) -> HandlerFn
where
    F: Fn(&HandlerRequest<'_>) -> Result<R, ApplicationError> + Send + Sync + 'static,
    R: Serialize,
{
    Arc::new(move |req: &HandlerRequest<'_>| to_json(req.handler_name(), f(req)?))
}

/// Erase a [`Handler`] into a [`HandlerFn`].
///
/// A request type that cannot be built from the bound parameters means the
/// route declaration and the handler disagree, which is reported as a 500.
pub fn typed_handler<H: Handler>(handler: H) -> HandlerFn {
    Arc::new(move |req: &HandlerRequest<'_>| {
        let data: H::Request = serde_json::from_value(req.params().to_json()).map_err(|e| {
            error!(
                handler = %req.handler_name(),
                error = %e,
                "Bound parameters do not fit the handler request type"
            );
            ApplicationError::internal("Handler request type mismatch")
        })?;
        let response = handler.handle(TypedHandlerRequest { data, raw: req })?;
        to_json(req.handler_name(), response)
    })
}
