//! Radix tree for route matching.
//!
//! Each node is one path segment. Static children are tried before placeholder
//! children, and placeholder children before greedy `{name:path}` captures. The
//! search backtracks, so `/items/myitem` (literal) and `/items/{item_id}` can both
//! be registered and the literal wins for exactly that path. Among siblings of the
//! same kind, insertion order decides.
//!
//! Routes are stored on terminal nodes per HTTP method. When a terminal node
//! matches the path but not the method, its methods are collected so the caller
//! can answer 405 instead of 404.

use http::Method;
use std::sync::Arc;

use super::core::{ParamVec, RouteError};
use crate::spec::RouteSpec;

/// Parsed form of one template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplateSegment {
    Static(String),
    Param(Arc<str>),
    /// `{name:path}`: every remaining segment joined with `/`, possibly none
    CatchAll(Arc<str>),
}

impl TemplateSegment {
    pub(crate) fn param_name(&self) -> Option<&str> {
        match self {
            TemplateSegment::Static(_) => None,
            TemplateSegment::Param(name) | TemplateSegment::CatchAll(name) => Some(name),
        }
    }
}

/// Split a request path or template into segments.
///
/// A single leading and a single trailing slash are insignificant; inner empty
/// segments (`/a//b`) are kept.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn parse_template(template: &str) -> Result<Vec<TemplateSegment>, RouteError> {
    let invalid = |reason: String| RouteError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };
    if !template.starts_with('/') {
        return Err(invalid("template must start with '/'".to_string()));
    }
    let raw = split_path(template);
    let mut segments = Vec::with_capacity(raw.len());
    let mut seen: Vec<&str> = Vec::new();
    for (idx, seg) in raw.iter().enumerate() {
        if seg.is_empty() {
            return Err(invalid("empty path segment".to_string()));
        }
        let Some(inner) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
            if seg.contains('{') || seg.contains('}') {
                return Err(invalid(format!("placeholder must span the whole segment: '{seg}'")));
            }
            segments.push(TemplateSegment::Static((*seg).to_string()));
            continue;
        };
        let (name, converter) = match inner.split_once(':') {
            Some((name, conv)) => (name, Some(conv)),
            None => (inner, None),
        };
        if !valid_identifier(name) {
            return Err(invalid(format!("invalid placeholder name '{name}'")));
        }
        if seen.contains(&name) {
            return Err(invalid(format!("placeholder '{name}' appears twice")));
        }
        seen.push(name);
        match converter {
            None => segments.push(TemplateSegment::Param(Arc::from(name))),
            Some("path") if idx + 1 == raw.len() => {
                segments.push(TemplateSegment::CatchAll(Arc::from(name)))
            }
            Some("path") => {
                return Err(invalid(format!(
                    "'{{{name}:path}}' must be the last segment"
                )))
            }
            Some(other) => return Err(invalid(format!("unknown converter '{other}'"))),
        }
    }
    Ok(segments)
}

type MethodRoutes = Vec<(Method, Arc<RouteSpec>)>;

#[derive(Clone, Default)]
struct RadixNode {
    segment: String,
    param_name: Option<Arc<str>>,
    routes: MethodRoutes,
    children: Vec<RadixNode>,
    param_children: Vec<RadixNode>,
    catch_all_children: Vec<RadixNode>,
}

impl RadixNode {
    fn with_segment(segment: &str) -> Self {
        RadixNode {
            segment: segment.to_string(),
            ..Default::default()
        }
    }

    fn with_param(name: &Arc<str>) -> Self {
        RadixNode {
            param_name: Some(Arc::clone(name)),
            ..Default::default()
        }
    }

    fn child_for<'n>(
        siblings: &'n mut Vec<RadixNode>,
        matches: impl Fn(&RadixNode) -> bool,
        make: impl FnOnce() -> RadixNode,
    ) -> &'n mut RadixNode {
        match siblings.iter().position(matches) {
            Some(idx) => &mut siblings[idx],
            None => {
                siblings.push(make());
                let last = siblings.len() - 1;
                &mut siblings[last]
            }
        }
    }

    fn insert(
        &mut self,
        segments: &[TemplateSegment],
        method: Method,
        route: Arc<RouteSpec>,
    ) -> Result<(), RouteError> {
        let Some((first, remaining)) = segments.split_first() else {
            if self.routes.iter().any(|(m, _)| *m == method) {
                return Err(RouteError::Duplicate {
                    method,
                    template: route.path_template.clone(),
                });
            }
            self.routes.push((method, route));
            return Ok(());
        };
        let child = match first {
            TemplateSegment::Static(seg) => Self::child_for(
                &mut self.children,
                |c| c.segment == *seg,
                || RadixNode::with_segment(seg),
            ),
            TemplateSegment::Param(name) => Self::child_for(
                &mut self.param_children,
                |c| c.param_name.as_deref() == Some(name.as_ref()),
                || RadixNode::with_param(name),
            ),
            TemplateSegment::CatchAll(name) => Self::child_for(
                &mut self.catch_all_children,
                |c| c.param_name.as_deref() == Some(name.as_ref()),
                || RadixNode::with_param(name),
            ),
        };
        child.insert(remaining, method, route)
    }

    fn search(
        &self,
        segments: &[&str],
        method: Option<&Method>,
        params: &mut ParamVec,
        allowed: &mut Vec<Method>,
    ) -> Option<Arc<RouteSpec>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self
                .terminal(method, allowed)
                .or_else(|| self.catch_all(String::new(), method, params, allowed));
        };

        for child in &self.children {
            if child.segment == *segment {
                if let Some(route) = child.search(remaining, method, params, allowed) {
                    return Some(route);
                }
            }
        }

        if !segment.is_empty() {
            for child in &self.param_children {
                if let Some(name) = &child.param_name {
                    params.push((Arc::clone(name), (*segment).to_string()));
                    if let Some(route) = child.search(remaining, method, params, allowed) {
                        return Some(route);
                    }
                    params.pop();
                }
            }
        }

        self.catch_all(segments.join("/"), method, params, allowed)
    }

    fn catch_all(
        &self,
        captured: String,
        method: Option<&Method>,
        params: &mut ParamVec,
        allowed: &mut Vec<Method>,
    ) -> Option<Arc<RouteSpec>> {
        for child in &self.catch_all_children {
            if let Some(name) = &child.param_name {
                params.push((Arc::clone(name), captured.clone()));
                if let Some(route) = child.terminal(method, allowed) {
                    return Some(route);
                }
                params.pop();
            }
        }
        None
    }

    fn terminal(
        &self,
        method: Option<&Method>,
        allowed: &mut Vec<Method>,
    ) -> Option<Arc<RouteSpec>> {
        if let Some(method) = method {
            if let Some((_, route)) = self.routes.iter().find(|(m, _)| m == method) {
                return Some(Arc::clone(route));
            }
        }
        for (m, _) in &self.routes {
            if !allowed.contains(m) {
                allowed.push(m.clone());
            }
        }
        None
    }
}

/// Outcome of a tree search.
pub(crate) struct RadixSearch {
    pub(crate) route: Option<(Arc<RouteSpec>, ParamVec)>,
    /// Methods registered on templates matching the path but not the method
    pub(crate) allowed: Vec<Method>,
}

#[derive(Clone, Default)]
pub(crate) struct RadixRouter {
    root: RadixNode,
}

impl RadixRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        segments: &[TemplateSegment],
        method: Method,
        route: Arc<RouteSpec>,
    ) -> Result<(), RouteError> {
        self.root.insert(segments, method, route)
    }

    /// Search decoded path segments; `method = None` only collects allowed methods.
    pub(crate) fn search(&self, segments: &[&str], method: Option<&Method>) -> RadixSearch {
        let mut params = ParamVec::new();
        let mut allowed = Vec::new();
        let route = self
            .root
            .search(segments, method, &mut params, &mut allowed)
            .map(|r| (r, params));
        RadixSearch { route, allowed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_ignores_outer_slashes_only() {
        assert!(split_path("/").is_empty());
        assert_eq!(split_path("/items/"), vec!["items"]);
        assert_eq!(split_path("/a//b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_template_segments() {
        let segs = parse_template("/files/{file_path:path}").unwrap();
        assert_eq!(segs[0], TemplateSegment::Static("files".into()));
        assert_eq!(segs[1], TemplateSegment::CatchAll(Arc::from("file_path")));
        let segs = parse_template("/users/{user_id}/items/{item_id}").unwrap();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[3].param_name(), Some("item_id"));
    }

    #[test]
    fn test_parse_template_rejections() {
        for bad in [
            "items",
            "/a//b",
            "/{id}/{id}",
            "/{1abc}",
            "/{rest:path}/tail",
            "/{id:uuid}",
            "/x{id}",
        ] {
            assert!(
                matches!(parse_template(bad), Err(RouteError::InvalidTemplate { .. })),
                "expected '{bad}' to be rejected"
            );
        }
    }
}
