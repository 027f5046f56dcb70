use http::Method;
use routebind::ids::RequestId;
use routebind::{
    ApplicationError, DispatchError, ParameterSpec, Provider, RawRequest, RouteSpec, Stage,
    ValueType,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod common;
use common::{dispatcher, get};

#[test]
fn test_successful_trail() {
    let app = dispatcher(|app| {
        app.route(
            RouteSpec::builder(Method::GET, "/ping", "ping").handler(|_| Ok(json!({"pong": true}))),
        )
        .unwrap();
    });
    let outcome = get(&app, "/ping");
    assert!(outcome.is_success());
    assert_eq!(
        outcome.trail,
        vec![
            Stage::Matching,
            Stage::Binding,
            Stage::ResolvingDependencies,
            Stage::Invoking,
            Stage::Shaping,
            Stage::Serializing,
            Stage::Done,
        ]
    );
    assert_eq!(outcome.final_stage(), Stage::Done);
    assert_eq!(
        outcome.response.get_header("content-type"),
        Some("application/json")
    );
}

#[test]
fn test_binding_failure_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = dispatcher(move |app| {
        app.route(
            RouteSpec::builder(Method::GET, "/n/{n}", "n")
                .param(ParameterSpec::path("n", ValueType::Integer).ge(1.0))
                .handler(move |req| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    req.param::<i64>("n")
                }),
        )
        .unwrap();
    });
    let outcome = get(&app, "/n/0");
    assert_eq!(outcome.response.status, 422);
    assert_eq!(
        outcome.trail,
        vec![Stage::Matching, Stage::Binding, Stage::Errored]
    );
    assert!(matches!(outcome.error, Some(DispatchError::Validation(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(get(&app, "/n/3").response.body, json!(3));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_error_body_carries_request_id() {
    let app = dispatcher(|_| {});
    let id = RequestId::new();
    let outcome =
        app.dispatch(RawRequest::new("GET", "/missing").header("X-Request-ID", id.to_string()));
    assert_eq!(outcome.request_id, id);
    assert_eq!(outcome.response.body["request_id"], json!(id.to_string()));
    assert_eq!(outcome.response.get_header("x-request-id"), None);
    assert_eq!(outcome.trail, vec![Stage::Matching, Stage::Errored]);
}

#[test]
fn test_unknown_method_token() {
    let app = dispatcher(|app| {
        app.route(RouteSpec::builder(Method::GET, "/x", "x").handler(|_| Ok(json!(1))))
            .unwrap();
    });
    let outcome = app.dispatch(RawRequest::new("BREW", "/x"));
    assert_eq!(outcome.response.status, 405);
    assert_eq!(app.dispatch(RawRequest::new("BREW", "/y")).response.status, 404);
}

#[test]
fn test_panicking_handler_becomes_internal_error() {
    let app = dispatcher(|app| {
        app.route(
            RouteSpec::builder(Method::GET, "/boom", "boom")
                .handler(|_| -> Result<Value, ApplicationError> { panic!("kaboom") }),
        )
        .unwrap();
    });
    let outcome = get(&app, "/boom");
    assert_eq!(outcome.response.status, 500);
    assert_eq!(outcome.response.body["error"], "internal_error");
    assert!(!outcome.response.body.to_string().contains("kaboom"));
}

#[test]
fn test_response_validation_failure_is_server_error() {
    let app = dispatcher(|app| {
        app.route(
            RouteSpec::builder(Method::GET, "/count", "count")
                .output(ValueType::Integer)
                .handler(|_| Ok(json!("many"))),
        )
        .unwrap();
    });
    let outcome = get(&app, "/count");
    assert_eq!(outcome.response.status, 500);
    assert_eq!(outcome.response.body["error"], "response_validation_error");
    assert!(outcome.trail.contains(&Stage::Shaping));
    assert!(!outcome.trail.contains(&Stage::Serializing));
}

#[test]
fn test_application_error_headers_and_detail() {
    let app = dispatcher(|app| {
        app.route(
            RouteSpec::builder(Method::GET, "/teapot", "teapot").handler(|_| -> Result<Value, _> {
                Err(ApplicationError::new(418, json!({"reason": "short and stout"}))
                    .with_header("X-Error", "There goes my error"))
            }),
        )
        .unwrap();
    });
    let outcome = get(&app, "/teapot");
    assert_eq!(outcome.response.status, 418);
    assert_eq!(outcome.response.body["detail"], json!({"reason": "short and stout"}));
    assert_eq!(outcome.response.get_header("x-error"), Some("There goes my error"));
    assert_eq!(outcome.final_stage(), Stage::Errored);
}

#[test]
fn test_shared_provider_runs_once_per_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = dispatcher(move |app| {
        app.provider(Provider::function("db", move |_| {
            Ok(counter.fetch_add(1, Ordering::SeqCst))
        }))
        .provider(Provider::function("left", |i| Ok(*i.dependency::<usize>("db")?)).depends("db"))
        .provider(Provider::function("right", |i| Ok(*i.dependency::<usize>("db")?)).depends("db"));
        app.route(
            RouteSpec::builder(Method::GET, "/both", "both")
                .depends("left")
                .depends("right")
                .handler(|req| {
                    Ok(json!([
                        req.dependency::<usize>("left")?,
                        req.dependency::<usize>("right")?
                    ]))
                }),
        )
        .unwrap();
    });
    assert_eq!(get(&app, "/both").response.body, json!([0, 0]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(get(&app, "/both").response.body, json!([1, 1]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_provider_error_stops_pipeline() {
    let app = dispatcher(|app| {
        app.provider(Provider::function("gate", |_| -> Result<(), ApplicationError> {
            Err(ApplicationError::forbidden("closed"))
        }));
        app.route(
            RouteSpec::builder(Method::GET, "/gated", "gated")
                .depends("gate")
                .handler(|_| Ok(json!("open"))),
        )
        .unwrap();
    });
    let outcome = get(&app, "/gated");
    assert_eq!(outcome.response.status, 403);
    assert_eq!(outcome.response.body["error"], "dependency_error");
    assert_eq!(
        outcome.trail,
        vec![
            Stage::Matching,
            Stage::Binding,
            Stage::ResolvingDependencies,
            Stage::Errored
        ]
    );
}

#[test]
fn test_provider_parameters_are_validated() {
    let app = dispatcher(|app| {
        app.provider(
            Provider::function("page", |i| i.param::<i64>("page"))
                .param(ParameterSpec::query("page", ValueType::Integer).ge(1.0)),
        );
        app.route(
            RouteSpec::builder(Method::GET, "/list", "list")
                .depends("page")
                .handler(|req| Ok(*req.dependency::<i64>("page")?)),
        )
        .unwrap();
    });
    assert_eq!(get(&app, "/list?page=2").response.body, json!(2));
    let outcome = get(&app, "/list?page=0");
    assert_eq!(outcome.response.status, 422);
    assert_eq!(outcome.response.body["detail"][0]["loc"], json!(["query", "page"]));
}

#[test]
fn test_handlers_run_concurrently() {
    let app = dispatcher(|app| {
        app.route(
            RouteSpec::builder(Method::GET, "/echo/{v}", "echo")
                .param(ParameterSpec::path("v", ValueType::Integer))
                .handler(|req| req.param::<i64>("v")),
        )
        .unwrap();
    });
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            std::thread::spawn(move || get(&app, &format!("/echo/{i}")).response.body)
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap(), json!(i));
    }
}
