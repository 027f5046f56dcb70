//! Startup-time registration of providers and routes.
//!
//! [`App`] collects the route and provider tables, checks them as a whole and
//! freezes them into a [`Dispatcher`]. Every structural mistake (bad template,
//! duplicate route, unknown provider, dependency cycle) is reported here rather
//! than on the first request that would hit it.

use crate::dependency::{DependencyGraphError, Provider, ProviderRegistry};
use crate::dispatcher::Dispatcher;
use crate::router::{RouteError, Router};
use crate::spec::RouteSpec;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Registration failed; the application must not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppBuildError {
    Route(RouteError),
    Dependency {
        route: String,
        source: DependencyGraphError,
    },
}

impl fmt::Display for AppBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppBuildError::Route(e) => write!(f, "invalid route: {e}"),
            AppBuildError::Dependency { route, source } => {
                write!(f, "invalid dependencies for route '{route}': {source}")
            }
        }
    }
}

impl std::error::Error for AppBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppBuildError::Route(e) => Some(e),
            AppBuildError::Dependency { source, .. } => Some(source),
        }
    }
}

impl From<RouteError> for AppBuildError {
    fn from(e: RouteError) -> Self {
        AppBuildError::Route(e)
    }
}

/// Route and provider tables under construction.
#[derive(Debug, Default)]
pub struct App {
    router: Router,
    providers: ProviderRegistry,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. A later provider with the same name replaces the earlier one.
    pub fn provider(&mut self, provider: Provider) -> &mut Self {
        self.providers.register(provider);
        self
    }

    /// Register a route; template and placeholder errors are reported immediately.
    pub fn route(&mut self, route: RouteSpec) -> Result<&mut Self, AppBuildError> {
        self.router.add_route(Arc::new(route))?;
        Ok(self)
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Check every route's dependency graph and freeze the tables.
    ///
    /// Routes may be registered before the providers they name, so graph checks
    /// run here, once both tables are complete.
    pub fn build(self) -> Result<Dispatcher, AppBuildError> {
        for route in self.router.routes() {
            self.providers
                .check_graph(&route.handler_name, &route.dependencies)
                .map_err(|source| AppBuildError::Dependency {
                    route: format!("{} {}", route.method, route.path_template),
                    source,
                })?;
        }
        info!(
            routes = self.router.len(),
            providers = self.providers.len(),
            "Application built"
        );
        Ok(Dispatcher::new(self.router, self.providers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApplicationError;
    use http::Method;
    use serde_json::json;

    fn ok_route(method: Method, template: &str, name: &str) -> RouteSpec {
        RouteSpec::builder(method, template, name).handler(|_| Ok(json!({})))
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut app = App::new();
        app.route(ok_route(Method::GET, "/items/", "a")).unwrap();
        let err = app.route(ok_route(Method::GET, "/items/", "b")).unwrap_err();
        assert!(matches!(err, AppBuildError::Route(RouteError::Duplicate { .. })));
    }

    #[test]
    fn test_unknown_provider_rejected_at_build() {
        let mut app = App::new();
        app.route(
            RouteSpec::builder(Method::GET, "/me", "read_me")
                .depends("current_user")
                .handler(|_| Ok(json!({}))),
        )
        .unwrap();
        let err = app.build().unwrap_err();
        match err {
            AppBuildError::Dependency { route, source } => {
                assert_eq!(route, "GET /me");
                assert!(matches!(source, DependencyGraphError::Unknown { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_rejected_at_build() {
        let mut app = App::new();
        app.provider(
            Provider::function("a", |_| -> Result<(), ApplicationError> { Ok(()) }).depends("b"),
        )
        .provider(
            Provider::function("b", |_| -> Result<(), ApplicationError> { Ok(()) }).depends("a"),
        );
        app.route(
            RouteSpec::builder(Method::GET, "/loop", "loop")
                .depends("a")
                .handler(|_| Ok(json!({}))),
        )
        .unwrap();
        assert!(matches!(
            app.build(),
            Err(AppBuildError::Dependency {
                source: DependencyGraphError::Cycle { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_providers_may_follow_routes() {
        let mut app = App::new();
        app.route(
            RouteSpec::builder(Method::GET, "/later", "later")
                .depends("value")
                .handler(|req| Ok(json!({ "v": *req.dependency::<i64>("value")? }))),
        )
        .unwrap();
        app.provider(Provider::function("value", |_| -> Result<i64, ApplicationError> {
            Ok(7)
        }));
        let dispatcher = app.build().unwrap();
        let outcome = dispatcher.dispatch(crate::RawRequest::new("GET", "/later"));
        assert_eq!(outcome.response.body, json!({"v": 7}));
    }
}
