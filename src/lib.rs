//! # routebind
//!
//! **routebind** binds HTTP requests to explicitly declared handler contracts: every route states
//! where its inputs come from, what they must look like, which per-request dependencies it needs
//! and which shape its response is allowed to have. Nothing is discovered by introspection; the
//! contract is a table built once at startup.
//!
//! ## Overview
//!
//! A request moves through a fixed pipeline owned by the [`dispatcher::Dispatcher`]:
//!
//! ```text
//! Matching → Binding → ResolvingDependencies → Invoking → Shaping → Serializing → Done
//!     └──────────┴──────────────┴──────────────┴──────────┴──→ Errored
//! ```
//!
//! - **[`router`]** - radix-tree route registry with literal-over-placeholder precedence and
//!   greedy `{name:path}` captures
//! - **[`spec`]** - [`RouteSpec`] and [`ParameterSpec`] tables describing each handler's inputs
//! - **[`binder`]** - extracts path, query, header, cookie and body values and coerces them
//! - **[`schema`]** - validates structured payloads against [`Schema`] graphs
//! - **[`dependency`]** - resolves the provider graph depth-first, once per request
//! - **[`shaper`]** - filters handler results down to the declared output type
//! - **[`server`]** - `may_minihttp` adapter serving a dispatcher over HTTP
//! - **[`security`]** - bearer-token extraction exposed as an ordinary provider
//! - **[`demo`]** - the tutorial application, wired entirely through the pieces above
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use routebind::{App, ParameterSpec, RawRequest, RouteSpec, ValueType};
//! use serde_json::json;
//!
//! let mut app = App::new();
//! app.route(
//!     RouteSpec::builder(Method::GET, "/items/{item_id}", "read_item")
//!         .param(ParameterSpec::path("item_id", ValueType::Integer).ge(1.0))
//!         .handler(|req| Ok(json!({ "item_id": req.param::<i64>("item_id")? }))),
//! )
//! .expect("valid route");
//! let dispatcher = app.build().expect("valid dependency graph");
//!
//! let outcome = dispatcher.dispatch(RawRequest::new("GET", "/items/42"));
//! assert_eq!(outcome.response.status, 200);
//! assert_eq!(outcome.response.body, json!({ "item_id": 42 }));
//!
//! let rejected = dispatcher.dispatch(RawRequest::new("GET", "/items/0"));
//! assert_eq!(rejected.response.status, 422);
//! ```
//!
//! ## Runtime Considerations
//!
//! The HTTP adapter runs on the `may` coroutine runtime. Handlers and providers are plain
//! synchronous closures; blocking-style I/O inside them yields the coroutine instead of the
//! worker thread. All per-request state lives in a [`RequestContext`] owned by that request,
//! so the dispatcher itself is immutable and shared freely between coroutines.

pub mod app;
pub mod binder;
pub mod cli;
pub mod config;
pub mod context;
pub mod demo;
pub mod dependency;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod schema;
pub mod security;
pub mod server;
pub mod shaper;
pub mod spec;
pub mod typed;
pub mod validator;

pub use app::{App, AppBuildError};
pub use context::{RawRequest, RequestContext};
pub use dependency::{Injectable, Provider, ProviderInput, ProviderRegistry, ResolvedDependencies};
pub use dispatcher::{DispatchOutcome, Dispatcher, HandlerRequest, HandlerResponse, Stage};
pub use error::{ApplicationError, DispatchError};
pub use schema::{Constraints, EnumSpec, FieldSpec, Schema, StringEnum, ValueType};
pub use spec::{ParameterLocation, ParameterSpec, RouteSpec};
pub use validator::{LocItem, ValidationError, ValidationIssue};
