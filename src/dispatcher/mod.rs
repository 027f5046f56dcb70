//! # Dispatcher Module
//!
//! The dispatcher drives one request through the whole pipeline and always produces a
//! response, successful or not.
//!
//! ## Request Flow
//!
//! 1. **Matching** - the [`Router`](crate::router::Router) picks the route; failures become 404/405
//! 2. **Binding** - declared parameters are extracted and coerced; every issue is collected (422)
//! 3. **ResolvingDependencies** - the route's providers are resolved depth-first, each at most once
//! 4. **Invoking** - the handler runs with a [`HandlerRequest`]; panics are caught and become 500
//! 5. **Shaping** - the result is filtered to the declared output type and re-validated (500 on mismatch)
//! 6. **Serializing** - status and `content-type` are attached
//!
//! Each call records the stages it entered in [`DispatchOutcome::trail`], ending in either
//! [`Stage::Done`] or [`Stage::Errored`].
//!
//! ## Concurrency
//!
//! A [`Dispatcher`] is immutable after [`App::build`](crate::App::build) and cheap to clone.
//! All mutable state (path parameters, the dependency cache) lives in the request's own
//! [`RequestContext`](crate::RequestContext), so concurrent dispatches never observe each other.

mod core;

pub use crate::context::{HeaderVec, MAX_INLINE_HEADERS};
pub use core::{DispatchOutcome, Dispatcher, HandlerRequest, HandlerResponse, Stage};
