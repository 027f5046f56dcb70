//! # Typed Module
//!
//! Typed handlers receive their bound parameters as a deserialized struct instead of
//! reading them one by one from a [`HandlerRequest`](crate::dispatcher::HandlerRequest).
//!
//! ```rust
//! use http::Method;
//! use routebind::typed::{Handler, TypedHandlerRequest};
//! use routebind::{ApplicationError, App, ParameterSpec, RawRequest, RouteSpec, ValueType};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct ReadUser { user_id: String }
//!
//! #[derive(Serialize)]
//! struct UserOut { user_id: String }
//!
//! struct ReadUserHandler;
//!
//! impl Handler for ReadUserHandler {
//!     type Request = ReadUser;
//!     type Response = UserOut;
//!
//!     fn handle(&self, req: TypedHandlerRequest<'_, ReadUser>) -> Result<UserOut, ApplicationError> {
//!         Ok(UserOut { user_id: req.data.user_id })
//!     }
//! }
//!
//! let mut app = App::new();
//! app.route(
//!     RouteSpec::builder(Method::GET, "/users/{user_id}", "read_user")
//!         .param(ParameterSpec::path("user_id", ValueType::String))
//!         .typed(ReadUserHandler),
//! )
//! .unwrap();
//! let dispatcher = app.build().unwrap();
//! let outcome = dispatcher.dispatch(RawRequest::new("GET", "/users/alice"));
//! assert_eq!(outcome.response.body["user_id"], "alice");
//! ```
//!
//! Handlers that return `Err(ApplicationError)` produce that error's status and detail;
//! a panicking handler is caught by the dispatcher and reported as a 500.

mod core;

pub use core::*;
