//! # Demo Application
//!
//! A tutorial-style JSON service exercising every feature of the pipeline: path,
//! query, header, cookie and body parameters; nested models; response models that
//! hide fields; custom status codes; application errors; function and type
//! dependencies; and bearer authentication.
//!
//! ```rust
//! use routebind::config::AppConfig;
//! use routebind::RawRequest;
//! use serde_json::json;
//!
//! let dispatcher = routebind::demo::build_app(&AppConfig::default()).expect("demo builds");
//!
//! let outcome = dispatcher.dispatch(RawRequest::new("GET", "/items/?skip=1&limit=1"));
//! assert_eq!(outcome.response.body, json!([{ "item_name": "Bar" }]));
//!
//! let outcome = dispatcher.dispatch(
//!     RawRequest::new("POST", "/user/").json_body(&json!({
//!         "username": "john",
//!         "password": "s3cret",
//!         "email": "john@example.com"
//!     })),
//! );
//! assert_eq!(
//!     outcome.response.body,
//!     json!({ "username": "john", "email": "john@example.com", "full_name": null })
//! );
//! ```

pub mod deps;
pub mod models;
pub mod routes;
pub mod store;

pub use deps::{CommonParameters, CommonQueryParams, CurrentUser};
pub use store::ItemStore;

use crate::app::{App, AppBuildError};
use crate::config::AppConfig;
use crate::dependency::Provider;
use crate::dispatcher::Dispatcher;
use crate::security::{OAuth2PasswordBearer, SignedTokenDecoder};
use std::sync::Arc;

/// Register the demo's providers and routes and build the dispatcher.
///
/// # Errors
///
/// Only if the route or provider tables are inconsistent.
pub fn build_app(config: &AppConfig) -> Result<Dispatcher, AppBuildError> {
    let bearer = &config.security.bearer;
    let mut app = App::new();
    app.provider(Provider::shared(deps::STORE, Arc::new(ItemStore::seeded())))
        .provider(deps::common_parameters())
        .provider(Provider::injectable::<CommonQueryParams>(deps::COMMON_QUERY_PARAMS))
        .provider(OAuth2PasswordBearer::new(bearer.token_url.as_str()).provider(deps::TOKEN))
        .provider(deps::current_user(SignedTokenDecoder::new(
            bearer.signature.as_str(),
        )));
    for route in routes::routes() {
        app.route(route)?;
    }
    app.build()
}
