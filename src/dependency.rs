//! # Dependency Resolver
//!
//! Routes declare the providers they need by name; providers live in an explicit
//! [`ProviderRegistry`]. Before a handler runs, its providers are resolved
//! depth-first: a provider's own sub-dependencies first, then its own parameters
//! (bound with the same [`bind_parameters`] the handler uses), then the provider
//! itself. Each result is cached in the [`RequestContext`], so a provider reached
//! several times within one request (directly or through other providers) runs once.
//!
//! A provider is either a closure ([`Provider::function`]) or a type implementing
//! [`Injectable`] ([`Provider::injectable`]).
//!
//! ```rust
//! use routebind::dependency::{resolve_dependencies, Provider, ProviderRegistry};
//! use routebind::{ParameterSpec, RawRequest, RequestContext, ValueType};
//!
//! #[derive(Debug)]
//! struct Pagination { skip: i64, limit: i64 }
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(
//!     Provider::function("pagination", |input| {
//!         Ok(Pagination { skip: input.param("skip")?, limit: input.param("limit")? })
//!     })
//!     .param(ParameterSpec::query("skip", ValueType::Integer).with_default(0.into()))
//!     .param(ParameterSpec::query("limit", ValueType::Integer).with_default(100.into())),
//! );
//!
//! let mut ctx = RequestContext::from_raw(RawRequest::new("GET", "/items/?skip=20"));
//! let deps = resolve_dependencies(&["pagination".to_string()], &registry, &mut ctx).unwrap();
//! let page = deps.get::<Pagination>("pagination").unwrap();
//! assert_eq!((page.skip, page.limit), (20, 100));
//! ```

use crate::binder::{bind_parameters, BoundParams};
use crate::context::RequestContext;
use crate::error::{ApplicationError, DispatchError};
use crate::spec::ParameterSpec;
use serde::de::DeserializeOwned;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Type-erased, shareable provider result.
pub type ProviderOutput = Arc<dyn Any + Send + Sync>;

type Factory =
    Arc<dyn Fn(&ProviderInput<'_>) -> Result<ProviderOutput, ApplicationError> + Send + Sync>;

/// What a provider factory sees: its bound parameters, its resolved
/// sub-dependencies and the request itself.
pub struct ProviderInput<'a> {
    pub params: &'a BoundParams,
    pub dependencies: &'a ResolvedDependencies,
    pub request: &'a RequestContext,
}

impl<'a> ProviderInput<'a> {
    /// Deserialize one of the provider's bound parameters.
    pub fn param<T: DeserializeOwned>(&self, name: &str) -> Result<T, ApplicationError> {
        self.params.get(name).map_err(|e| {
            ApplicationError::internal(format!("parameter '{name}' has unexpected type: {e}"))
        })
    }

    pub fn dependency<T: Any + Send + Sync>(&self, name: &str) -> Result<&'a T, ApplicationError> {
        self.dependencies.require(name)
    }
}

/// A type that can be constructed per request from its own declared inputs.
///
/// ```rust
/// use routebind::dependency::{Injectable, ProviderInput};
/// use routebind::{ApplicationError, ParameterSpec, ValueType};
///
/// struct CommonQueryParams { q: Option<String> }
///
/// impl Injectable for CommonQueryParams {
///     fn parameters() -> Vec<ParameterSpec> {
///         vec![ParameterSpec::query("q", ValueType::String).optional()]
///     }
///
///     fn construct(input: &ProviderInput<'_>) -> Result<Self, ApplicationError> {
///         Ok(CommonQueryParams { q: input.param("q")? })
///     }
/// }
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
    fn parameters() -> Vec<ParameterSpec> {
        Vec::new()
    }

    fn dependencies() -> Vec<String> {
        Vec::new()
    }

    fn construct(input: &ProviderInput<'_>) -> Result<Self, ApplicationError>;
}

/// A named node of the dependency graph.
pub struct Provider {
    name: String,
    parameters: Vec<ParameterSpec>,
    dependencies: Vec<String>,
    factory: Factory,
}

impl Provider {
    /// Provider backed by a closure.
    pub fn function<T, F>(name: impl Into<String>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&ProviderInput<'_>) -> Result<T, ApplicationError> + Send + Sync + 'static,
    {
        Provider {
            name: name.into(),
            parameters: Vec::new(),
            dependencies: Vec::new(),
            factory: Arc::new(move |input: &ProviderInput<'_>| {
                f(input).map(|v| Arc::new(v) as ProviderOutput)
            }),
        }
    }

    /// Provider constructing `T` through [`Injectable`].
    pub fn injectable<T: Injectable>(name: impl Into<String>) -> Self {
        Provider {
            name: name.into(),
            parameters: T::parameters(),
            dependencies: T::dependencies(),
            factory: Arc::new(|input: &ProviderInput<'_>| {
                T::construct(input).map(|v| Arc::new(v) as ProviderOutput)
            }),
        }
    }

    /// Provider handing out the same shared instance to every request.
    pub fn shared<T: Any + Send + Sync>(name: impl Into<String>, value: Arc<T>) -> Self {
        Provider {
            name: name.into(),
            parameters: Vec::new(),
            dependencies: Vec::new(),
            factory: Arc::new(move |_: &ProviderInput<'_>| {
                Ok(Arc::clone(&value) as ProviderOutput)
            }),
        }
    }

    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn depends(mut self, provider: impl Into<String>) -> Self {
        self.dependencies.push(provider.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Provider results for one consumer, by provider name.
#[derive(Default, Clone)]
pub struct ResolvedDependencies {
    entries: Vec<(String, ProviderOutput)>,
}

impl ResolvedDependencies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, value: ProviderOutput) {
        self.entries.push((name.to_string(), value));
    }

    /// Result of `name`, if resolved and of type `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| (**v).downcast_ref::<T>())
    }

    /// Like [`get`](Self::get), reporting a misdeclared dependency as a 500.
    pub fn require<T: Any + Send + Sync>(&self, name: &str) -> Result<&T, ApplicationError> {
        self.get::<T>(name).ok_or_else(|| {
            ApplicationError::internal(format!(
                "dependency '{name}' is not declared or is not a {}",
                type_name::<T>()
            ))
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResolvedDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Structural problem in the provider graph, found at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    Unknown { provider: String, required_by: String },
    Cycle { path: Vec<String> },
}

impl fmt::Display for DependencyGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyGraphError::Unknown {
                provider,
                required_by,
            } => write!(f, "unknown provider '{provider}' required by '{required_by}'"),
            DependencyGraphError::Cycle { path } => {
                write!(f, "dependency cycle: {}", path.join(" -> "))
            }
        }
    }
}

impl std::error::Error for DependencyGraphError {}

/// Providers by name.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<Provider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any provider of the same name.
    pub fn register(&mut self, provider: Provider) {
        let name = provider.name.clone();
        if self.providers.insert(name.clone(), Arc::new(provider)).is_some() {
            warn!(provider = %name, "Replaced existing provider");
        } else {
            debug!(provider = %name, total = self.providers.len(), "Provider registered");
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Provider>> {
        self.providers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Check that everything reachable from `roots` exists and is acyclic.
    pub fn check_graph(&self, consumer: &str, roots: &[String]) -> Result<(), DependencyGraphError> {
        let mut done: Vec<&str> = Vec::new();
        let mut path: Vec<&str> = vec![consumer];
        for root in roots {
            self.visit(root, &mut path, &mut done)?;
        }
        Ok(())
    }

    fn visit<'s>(
        &'s self,
        name: &'s str,
        path: &mut Vec<&'s str>,
        done: &mut Vec<&'s str>,
    ) -> Result<(), DependencyGraphError> {
        if done.contains(&name) {
            return Ok(());
        }
        if let Some(start) = path.iter().skip(1).position(|p| *p == name) {
            let mut cycle: Vec<String> = path[start + 1..].iter().map(|s| (*s).to_string()).collect();
            cycle.push(name.to_string());
            return Err(DependencyGraphError::Cycle { path: cycle });
        }
        let Some(provider) = self.providers.get(name) else {
            return Err(DependencyGraphError::Unknown {
                provider: name.to_string(),
                required_by: path.last().map(|s| (*s).to_string()).unwrap_or_default(),
            });
        };
        path.push(name);
        for dep in &provider.dependencies {
            self.visit(dep, path, done)?;
        }
        path.pop();
        done.push(name);
        Ok(())
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}

/// Resolve `names` for one consumer, reusing anything already cached in `ctx`.
pub fn resolve_dependencies(
    names: &[String],
    registry: &ProviderRegistry,
    ctx: &mut RequestContext,
) -> Result<ResolvedDependencies, DispatchError> {
    let mut resolved = ResolvedDependencies::new();
    let mut stack = Vec::new();
    for name in names {
        let value = resolve_one(name, registry, ctx, &mut stack)?;
        resolved.push(name, value);
    }
    Ok(resolved)
}

fn resolve_one(
    name: &str,
    registry: &ProviderRegistry,
    ctx: &mut RequestContext,
    stack: &mut Vec<String>,
) -> Result<ProviderOutput, DispatchError> {
    if let Some(hit) = ctx.cache.get(name) {
        trace!(request_id = %ctx.request_id, provider = %name, "Provider cache hit");
        return Ok(Arc::clone(hit));
    }
    if stack.iter().any(|s| s == name) {
        let mut cycle = stack.clone();
        cycle.push(name.to_string());
        return Err(DispatchError::Internal(format!(
            "dependency cycle: {}",
            cycle.join(" -> ")
        )));
    }
    let provider = registry
        .get(name)
        .ok_or_else(|| DispatchError::Internal(format!("unknown provider '{name}'")))?;

    stack.push(name.to_string());
    let mut sub = ResolvedDependencies::new();
    for dep in &provider.dependencies {
        let value = resolve_one(dep, registry, ctx, stack)?;
        sub.push(dep, value);
    }
    let params = bind_parameters(&provider.parameters, ctx)?;

    let started = Instant::now();
    let input = ProviderInput {
        params: &params,
        dependencies: &sub,
        request: ctx,
    };
    let output = (provider.factory)(&input).map_err(|source| {
        debug!(
            request_id = %ctx.request_id,
            provider = %name,
            status = source.status,
            "Provider failed"
        );
        DispatchError::Dependency {
            provider: name.to_string(),
            source,
        }
    })?;
    debug!(
        request_id = %ctx.request_id,
        provider = %name,
        duration_us = started.elapsed().as_micros(),
        "Provider resolved"
    );
    stack.pop();
    ctx.cache.insert(name.to_string(), Arc::clone(&output));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RawRequest;
    use crate::schema::ValueType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(target: &str) -> RequestContext {
        RequestContext::from_raw(RawRequest::new("GET", target))
    }

    #[test]
    fn test_shared_sub_dependency_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = ProviderRegistry::new();
        registry.register(Provider::function("db", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42_i64)
        }));
        registry.register(
            Provider::function("a", |i| Ok(*i.dependency::<i64>("db")? + 1)).depends("db"),
        );
        registry.register(
            Provider::function("b", |i| Ok(*i.dependency::<i64>("db")? + 2)).depends("db"),
        );

        let mut c = ctx("/");
        let names = vec!["a".to_string(), "b".to_string(), "db".to_string()];
        let deps = resolve_dependencies(&names, &registry, &mut c).unwrap();
        assert_eq!(deps.get::<i64>("a"), Some(&43));
        assert_eq!(deps.get::<i64>("b"), Some(&44));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_provider_parameter_failure_is_validation() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            Provider::function("paging", |i| i.param::<i64>("limit"))
                .param(ParameterSpec::query("limit", ValueType::Integer)),
        );
        let err = resolve_dependencies(&["paging".to_string()], &registry, &mut ctx("/?limit=x"))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn test_provider_error_is_wrapped() {
        let mut registry = ProviderRegistry::new();
        registry.register(Provider::function("guard", |_| -> Result<(), ApplicationError> {
            Err(ApplicationError::forbidden("nope"))
        }));
        let err = resolve_dependencies(&["guard".to_string()], &registry, &mut ctx("/")).unwrap_err();
        match err {
            DispatchError::Dependency { provider, source } => {
                assert_eq!(provider, "guard");
                assert_eq!(source.status, 403);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_graph_reports_cycles_and_unknowns() {
        let mut registry = ProviderRegistry::new();
        registry.register(Provider::function("a", |_| Ok(())).depends("b"));
        registry.register(Provider::function("b", |_| Ok(())).depends("a"));
        registry.register(Provider::function("c", |_| Ok(())).depends("missing"));

        let err = registry.check_graph("route", &["a".to_string()]).unwrap_err();
        assert_eq!(
            err,
            DependencyGraphError::Cycle {
                path: vec!["a".into(), "b".into(), "a".into()]
            }
        );
        let err = registry.check_graph("route", &["c".to_string()]).unwrap_err();
        assert_eq!(
            err,
            DependencyGraphError::Unknown {
                provider: "missing".into(),
                required_by: "c".into()
            }
        );
    }

    #[test]
    fn test_cycle_guard_at_resolution() {
        let mut registry = ProviderRegistry::new();
        registry.register(Provider::function("a", |_| Ok(())).depends("a"));
        let err = resolve_dependencies(&["a".to_string()], &registry, &mut ctx("/")).unwrap_err();
        assert!(matches!(err, DispatchError::Internal(_)));
    }
}
