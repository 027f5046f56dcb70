//! Declarative handler contracts: [`RouteSpec`] and the [`ParameterSpec`]s it binds.
mod route;
mod types;

pub use route::{HandlerFn, RouteSpec, RouteSpecBuilder};
pub use types::{ParameterLocation, ParameterSpec};
