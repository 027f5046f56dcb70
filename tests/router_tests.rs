use http::Method;
use routebind::router::{MatchError, RouteError, Router};
use routebind::{ParameterSpec, RouteSpec, ValueType};
use serde_json::json;
use std::sync::Arc;

fn route(method: Method, template: &str, name: &str, params: &[&str]) -> Arc<RouteSpec> {
    let builder = params.iter().fold(
        RouteSpec::builder(method, template, name),
        |b, p| b.param(ParameterSpec::path(*p, ValueType::String)),
    );
    Arc::new(builder.handler(|_| Ok(json!(null))))
}

fn router(routes: Vec<Arc<RouteSpec>>) -> Router {
    let mut router = Router::new();
    for r in routes {
        router.add_route(r).unwrap();
    }
    router
}

fn handler_for(router: &Router, method: Method, path: &str) -> Option<String> {
    router
        .route(&method, path)
        .ok()
        .map(|m| m.handler_name().to_string())
}

#[test]
fn test_literal_beats_placeholder_regardless_of_order() {
    for literal_first in [true, false] {
        let literal = route(Method::GET, "/items/myitem", "my_item", &[]);
        let param = route(Method::GET, "/items/{item_id}", "read_item", &["item_id"]);
        let routes = if literal_first {
            vec![literal, param]
        } else {
            vec![param, literal]
        };
        let router = router(routes);
        assert_eq!(handler_for(&router, Method::GET, "/items/myitem").as_deref(), Some("my_item"));
        assert_eq!(handler_for(&router, Method::GET, "/items/other").as_deref(), Some("read_item"));
    }
}

#[test]
fn test_backtracks_from_literal_branch() {
    let router = router(vec![
        route(Method::GET, "/users/me", "me", &[]),
        route(Method::GET, "/users/{user_id}/items", "user_items", &["user_id"]),
    ]);
    let m = router.route(&Method::GET, "/users/me/items").unwrap();
    assert_eq!(m.handler_name(), "user_items");
    assert_eq!(m.get_path_param("user_id"), Some("me"));
}

#[test]
fn test_path_converter_captures_rest() {
    let router = router(vec![route(
        Method::GET,
        "/files/{file_path:path}",
        "read_file",
        &["file_path"],
    )]);
    let m = router.route(&Method::GET, "/files/a/b/c.txt").unwrap();
    assert_eq!(m.get_path_param("file_path"), Some("a/b/c.txt"));
    for empty in ["/files/", "/files"] {
        let m = router.route(&Method::GET, empty).unwrap();
        assert_eq!(m.get_path_param("file_path"), Some(""), "{empty}");
    }
    assert!(router.route(&Method::GET, "/other").is_err());
}

#[test]
fn test_empty_capture_yields_to_exact_route() {
    let router = router(vec![
        route(Method::GET, "/files/", "list_files", &[]),
        route(Method::GET, "/files/{file_path:path}", "read_file", &["file_path"]),
    ]);
    assert_eq!(router.route(&Method::GET, "/files/").unwrap().handler_name(), "list_files");
    let m = router.route(&Method::GET, "/files/x").unwrap();
    assert_eq!(m.handler_name(), "read_file");
}

#[test]
fn test_method_not_allowed_lists_methods() {
    let router = router(vec![
        route(Method::GET, "/items/", "read", &[]),
        route(Method::POST, "/items/", "create", &[]),
    ]);
    assert_eq!(
        router.route(&Method::DELETE, "/items/").unwrap_err(),
        MatchError::MethodNotAllowed {
            allowed: vec![Method::GET, Method::POST]
        }
    );
    assert_eq!(router.allowed_methods("/items"), vec![Method::GET, Method::POST]);
    assert_eq!(router.route(&Method::GET, "/other").unwrap_err(), MatchError::NotFound);
}

#[test]
fn test_trailing_slash_is_insignificant() {
    let router = router(vec![route(Method::GET, "/items/", "read", &[])]);
    assert!(router.route(&Method::GET, "/items").is_ok());
    assert!(router.route(&Method::GET, "/items/").is_ok());
}

#[test]
fn test_segments_are_percent_decoded() {
    let router = router(vec![route(Method::GET, "/items/{item_id}", "read", &["item_id"])]);
    let m = router.route(&Method::GET, "/items/hello%20world").unwrap();
    assert_eq!(m.get_path_param("item_id"), Some("hello world"));
}

#[test]
fn test_empty_segment_never_binds_placeholder() {
    let router = router(vec![route(
        Method::GET,
        "/users/{user_id}/items",
        "user_items",
        &["user_id"],
    )]);
    assert_eq!(
        router.route(&Method::GET, "/users//items").unwrap_err(),
        MatchError::NotFound
    );
}

#[test]
fn test_registration_errors() {
    let mut router = Router::new();
    router
        .add_route(route(Method::GET, "/items/{item_id}", "a", &["item_id"]))
        .unwrap();
    assert!(matches!(
        router.add_route(route(Method::GET, "/items/{item_id}", "b", &["item_id"])),
        Err(RouteError::Duplicate { .. })
    ));
    assert!(matches!(
        router.add_route(route(Method::GET, "/broken/{id", "c", &[])),
        Err(RouteError::InvalidTemplate { .. })
    ));
    assert!(matches!(
        router.add_route(route(Method::GET, "/things/{thing_id}", "d", &[])),
        Err(RouteError::UndeclaredPlaceholder { .. })
    ));
    assert!(matches!(
        router.add_route(route(Method::GET, "/things/", "e", &["thing_id"])),
        Err(RouteError::UnboundPathParameter { .. })
    ));
    assert_eq!(router.len(), 1);
}

#[test]
fn test_describe_routes_in_registration_order() {
    let router = router(vec![
        route(Method::GET, "/b", "b", &[]),
        route(Method::POST, "/a", "a", &[]),
    ]);
    let lines = router.describe_routes();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("/b") && lines[0].contains('b'));
    assert!(lines[1].contains("POST"));
}
