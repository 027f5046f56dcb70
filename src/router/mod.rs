//! # Router Module
//!
//! The route registry: maps `(method, path)` to a registered [`RouteSpec`](crate::spec::RouteSpec)
//! and extracts placeholder values.
//!
//! ## Templates
//!
//! - literal segments: `/items/myitem`
//! - placeholders: `/items/{item_id}` (one non-empty segment)
//! - greedy captures: `/files/{file_path:path}` (one or more remaining segments, last only)
//!
//! A literal segment always beats a placeholder at the same position, and a placeholder
//! beats a greedy capture. The tree search backtracks, so a literal prefix that leads
//! nowhere still lets a placeholder route match. Between equally specific templates the
//! one registered first wins.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use routebind::router::{MatchError, Router};
//! use routebind::{ParameterSpec, RouteSpec, ValueType};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//! router.add_route(Arc::new(
//!     RouteSpec::builder(Method::GET, "/items/{item_id}", "read_item")
//!         .param(ParameterSpec::path("item_id", ValueType::Integer))
//!         .handler(|_| Ok(json!({}))),
//! )).unwrap();
//! router.add_route(Arc::new(
//!     RouteSpec::builder(Method::GET, "/items/myitem", "read_my_item").handler(|_| Ok(json!({}))),
//! )).unwrap();
//!
//! assert_eq!(router.route(&Method::GET, "/items/myitem").unwrap().handler_name(), "read_my_item");
//! let m = router.route(&Method::GET, "/items/7").unwrap();
//! assert_eq!(m.get_path_param("item_id"), Some("7"));
//! assert!(matches!(
//!     router.route(&Method::DELETE, "/items/7"),
//!     Err(MatchError::MethodNotAllowed { .. })
//! ));
//! ```

mod core;
mod radix;

pub use core::{MatchError, ParamVec, RouteError, RouteMatch, Router, MAX_INLINE_PARAMS};
