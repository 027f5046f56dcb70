//! # Security Module
//!
//! Authentication in routebind is not a separate layer: a security scheme is an
//! ordinary [`Provider`](crate::Provider) that routes list among their dependencies.
//! A missing credential fails dependency resolution with a 401, so the handler
//! never runs.
//!
//! - [`OAuth2PasswordBearer`] extracts `Authorization: Bearer <token>` and rejects
//!   requests without one (401, `WWW-Authenticate: Bearer`)
//! - [`SignedTokenDecoder`] turns a `header.payload.signature` token signed with a
//!   shared string into its JSON claims
//!
//! ```rust
//! use http::Method;
//! use routebind::security::{BearerToken, OAuth2PasswordBearer};
//! use routebind::{App, RawRequest, RouteSpec};
//! use serde_json::json;
//!
//! let mut app = App::new();
//! app.provider(OAuth2PasswordBearer::new("token").provider("token"));
//! app.route(
//!     RouteSpec::builder(Method::GET, "/items-secure/", "items_secure")
//!         .depends("token")
//!         .handler(|req| Ok(json!({ "token": req.dependency::<BearerToken>("token")?.as_str() }))),
//! )
//! .expect("valid route");
//! let dispatcher = app.build().expect("valid graph");
//!
//! let denied = dispatcher.dispatch(RawRequest::new("GET", "/items-secure/"));
//! assert_eq!(denied.response.status, 401);
//! assert_eq!(denied.response.get_header("www-authenticate"), Some("Bearer"));
//!
//! let allowed = dispatcher
//!     .dispatch(RawRequest::new("GET", "/items-secure/").header("Authorization", "Bearer abc"));
//! assert_eq!(allowed.response.body, json!({ "token": "abc" }));
//! ```
//!
//! Tokens are never written to logs.

mod bearer_jwt;
mod oauth2;

pub use bearer_jwt::SignedTokenDecoder;
pub use oauth2::{BearerToken, OAuth2PasswordBearer};
