//! Route table of the demo application.

use super::deps::{
    CommonParameters, CommonQueryParams, CurrentUser, COMMONS, COMMON_QUERY_PARAMS, CURRENT_USER,
    STORE, TOKEN,
};
use super::models::{self, ModelName};
use super::store::ItemStore;
use crate::error::ApplicationError;
use crate::schema::{EnumSpec, ValueType};
use crate::security::BearerToken;
use crate::spec::{ParameterSpec, RouteSpec};
use crate::typed::{Handler, TypedHandlerRequest};
use http::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Every route of the demo, in registration order.
#[must_use]
pub fn routes() -> Vec<RouteSpec> {
    let mut routes = Vec::with_capacity(28);
    routes.extend(path_routes());
    routes.extend(query_routes());
    routes.extend(body_routes());
    routes.extend(cookie_and_header_routes());
    routes.extend(response_routes());
    routes.extend(dependency_routes());
    routes.extend(security_routes());
    routes
}

fn path_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::builder(Method::GET, "/", "root").handler(|_| Ok(json!({"message": "Hello"}))),
        RouteSpec::builder(Method::GET, "/items/myitem", "my_item")
            .handler(|_| Ok(json!({"item": "This is my item"}))),
        RouteSpec::builder(Method::GET, "/items/{item_id}", "read_item")
            .param(ParameterSpec::path("item_id", ValueType::Integer))
            .handler(|req| Ok(json!({"item_id": req.param::<i64>("item_id")?}))),
        RouteSpec::builder(Method::GET, "/models/{model_name}", "get_model")
            .param(ParameterSpec::path(
                "model_name",
                ValueType::enumeration(EnumSpec::of::<ModelName>()),
            ))
            .handler(|req| {
                let model_name: String = req.param("model_name")?;
                let message = match model_name.as_str() {
                    "alexnet" => "Deep Learning FTW!",
                    "lenet" => "LeCNN all the images",
                    _ => "Have some residuals",
                };
                Ok(json!({"model_name": model_name, "message": message}))
            }),
        RouteSpec::builder(Method::GET, "/files/{file_path:path}", "read_file")
            .param(ParameterSpec::path("file_path", ValueType::String))
            .handler(|req| Ok(json!({"file_path": req.param::<String>("file_path")?}))),
    ]
}

#[derive(Debug, Deserialize)]
pub struct ReadUserItem {
    pub user_id: i64,
    pub item_id: String,
    pub q: Option<String>,
    pub short: bool,
}

struct ReadUserItemHandler;

impl Handler for ReadUserItemHandler {
    type Request = ReadUserItem;
    type Response = Value;

    fn handle(&self, req: TypedHandlerRequest<'_, ReadUserItem>) -> Result<Value, ApplicationError> {
        let ReadUserItem {
            user_id,
            item_id,
            q,
            short,
        } = req.data;
        let mut item = Map::new();
        item.insert("item_id".into(), json!(item_id));
        item.insert("owner_id".into(), json!(user_id));
        if let Some(q) = q.filter(|q| !q.is_empty()) {
            item.insert("q".into(), json!(q));
        }
        if !short {
            item.insert(
                "description".into(),
                json!("This is an amazing item that has a long description"),
            );
        }
        Ok(Value::Object(item))
    }
}

fn query_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::builder(Method::GET, "/items/", "read_db")
            .param(
                ParameterSpec::query("skip", ValueType::Integer)
                    .with_default(json!(0))
                    .ge(0.0),
            )
            .param(
                ParameterSpec::query("limit", ValueType::Integer)
                    .with_default(json!(10))
                    .ge(0.0),
            )
            .depends(STORE)
            .handler(|req| {
                let store = req.dependency::<ItemStore>(STORE)?;
                Ok(store.page(req.param("skip")?, req.param("limit")?))
            }),
        RouteSpec::builder(Method::GET, "/users/{user_id}/items/{item_id}", "read_user_item")
            .param(ParameterSpec::path("user_id", ValueType::Integer))
            .param(ParameterSpec::path("item_id", ValueType::String))
            .param(ParameterSpec::query("q", ValueType::String).optional())
            .param(ParameterSpec::query("short", ValueType::Boolean).with_default(json!(false)))
            .typed(ReadUserItemHandler),
        RouteSpec::builder(Method::GET, "/items-validation/", "read_items_validation")
            .param(
                ParameterSpec::query("q", ValueType::String)
                    .optional()
                    .max_length(50),
            )
            .handler(|req| {
                let mut results = json!({"items": [{"item_id": "Foo"}, {"item_id": "Bar"}]});
                with_query(&mut results, req.param("q")?);
                Ok(results)
            }),
        RouteSpec::builder(
            Method::GET,
            "/items-multiple-query-params/",
            "read_items_multiple_query_params",
        )
        .param(
            ParameterSpec::query("q", ValueType::list(ValueType::String))
                .with_default(json!(["Foo", "Bar"])),
        )
        .handler(|req| Ok(json!({"q": req.param::<Vec<String>>("q")?}))),
        RouteSpec::builder(
            Method::GET,
            "/items-path-validation/{item_id}",
            "read_items_path_validation",
        )
        .param(ParameterSpec::path("item_id", ValueType::Integer).ge(1.0))
        .param(
            ParameterSpec::query("q", ValueType::String)
                .optional()
                .alias("item-query"),
        )
        .handler(|req| {
            let mut results = json!({"item_id": req.param::<i64>("item_id")?});
            with_query(&mut results, req.param("q")?);
            Ok(results)
        }),
    ]
}

/// Add `"q"` to an object result when a non-empty query was given.
fn with_query(result: &mut Value, q: Option<String>) {
    if let (Value::Object(map), Some(q)) = (result, q.filter(|q| !q.is_empty())) {
        map.insert("q".into(), Value::String(q));
    }
}

fn body_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::builder(Method::POST, "/items/", "create_item")
            .param(ParameterSpec::body("item", ValueType::object(models::item())))
            .handler(|req| {
                let mut item: Map<String, Value> = req.param("item")?;
                let price = item.get("price").and_then(Value::as_f64);
                let tax = item.get("tax").and_then(Value::as_f64);
                if let (Some(price), Some(tax)) = (price, tax.filter(|t| *t != 0.0)) {
                    item.insert("price_with_tax".into(), json!(price + tax));
                }
                Ok(Value::Object(item))
            }),
        RouteSpec::builder(Method::PUT, "/items/{item_id}", "update_item")
            .param(ParameterSpec::path("item_id", ValueType::Integer))
            .param(ParameterSpec::body("item", ValueType::object(models::item())))
            .param(ParameterSpec::query("q", ValueType::String).optional())
            .handler(|req| {
                let mut result = Map::new();
                result.insert("item_id".into(), json!(req.param::<i64>("item_id")?));
                result.extend(req.param::<Map<String, Value>>("item")?);
                let mut result = Value::Object(result);
                with_query(&mut result, req.param("q")?);
                Ok(result)
            }),
        RouteSpec::builder(
            Method::PUT,
            "/items-multiple-body-params/{item_id}",
            "update_item_multiple_body_params",
        )
        .param(ParameterSpec::path("item_id", ValueType::Integer))
        .param(ParameterSpec::body("item", ValueType::object(models::item())).embed())
        .param(ParameterSpec::body("user", ValueType::object(models::user())))
        .param(ParameterSpec::body("importance", ValueType::Integer))
        .param(ParameterSpec::query("q", ValueType::String).optional())
        .handler(|req| {
            let mut results = json!({
                "item_id": req.param::<i64>("item_id")?,
                "item": req.param::<Value>("item")?,
                "user": req.param::<Value>("user")?,
                "importance": req.param::<i64>("importance")?,
            });
            with_query(&mut results, req.param("q")?);
            Ok(results)
        }),
        RouteSpec::builder(Method::POST, "/offers/", "create_offer")
            .param(ParameterSpec::body("offer", ValueType::object(models::offer())))
            .handler(|req| req.param::<Value>("offer")),
        RouteSpec::builder(Method::POST, "/images/multiple/", "create_multiple_images")
            .param(ParameterSpec::body(
                "images",
                ValueType::list(ValueType::object(models::image())),
            ))
            .handler(|req| req.param::<Value>("images")),
    ]
}

fn cookie_and_header_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::builder(Method::GET, "/items-with-cookie/", "read_items_with_cookie")
            .param(ParameterSpec::cookie("ads_id", ValueType::String).optional())
            .handler(|req| Ok(json!({"ads_id": req.param::<Option<String>>("ads_id")?}))),
        RouteSpec::builder(Method::GET, "/items-with-header/", "read_items_with_header")
            .param(ParameterSpec::header("user_agent", ValueType::String).optional())
            .handler(|req| Ok(json!({"User-Agent": req.param::<Option<String>>("user_agent")?}))),
    ]
}

#[derive(Debug, Deserialize)]
pub struct ItemId {
    pub item_id: String,
}

struct ItemsErrorHandling;

impl Handler for ItemsErrorHandling {
    type Request = ItemId;
    type Response = Value;

    fn handle(&self, req: TypedHandlerRequest<'_, ItemId>) -> Result<Value, ApplicationError> {
        let store = req.dependency::<ItemStore>(STORE)?;
        match store.named(&req.data.item_id) {
            Some(item) => Ok(json!({"item": item})),
            None => Err(ApplicationError::not_found("Item not found")),
        }
    }
}

fn response_routes() -> Vec<RouteSpec> {
    let items = || ValueType::list(ValueType::object(models::item()));
    vec![
        RouteSpec::builder(Method::GET, "/items-with-return-type", "items_with_return_type")
            .output(items())
            .handler(|_| {
                Ok(json!([
                    {"name": "item1", "price": 1.4},
                    {"name": "item2", "price": 1.6},
                ]))
            }),
        RouteSpec::builder(
            Method::GET,
            "/items-with-response-model",
            "read_items_with_response_model",
        )
        .output(items())
        .handler(|_| {
            Ok(json!([
                {"name": "Portal Gun", "price": 42.0},
                {"name": "Plumbus", "price": 32.0},
            ]))
        }),
        RouteSpec::builder(Method::POST, "/user/", "create_user")
            .param(ParameterSpec::body("user", ValueType::object(models::user_in())))
            .output(ValueType::object(models::user_out()))
            .handler(|req| req.param::<Value>("user")),
        RouteSpec::builder(Method::POST, "/user-base-model/", "create_user_base_model")
            .param(ParameterSpec::body(
                "user",
                ValueType::object(models::user_in_from_base()),
            ))
            .output(ValueType::object(models::base_user()))
            .handler(|req| req.param::<Value>("user")),
        RouteSpec::builder(Method::POST, "/items-status-code/", "create_item_with_status_code")
            .param(ParameterSpec::query("name", ValueType::String))
            .status(201)
            .handler(|req| Ok(json!({"name": req.param::<String>("name")?}))),
        RouteSpec::builder(Method::GET, "/items-error-handling/{item_id}", "items_error_handling")
            .param(ParameterSpec::path("item_id", ValueType::String))
            .depends(STORE)
            .output(ValueType::map(ValueType::String))
            .typed(ItemsErrorHandling),
    ]
}

fn dependency_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::builder(Method::GET, "/items-common/", "read_items")
            .depends(COMMONS)
            .handler(|req| req.dependency::<CommonParameters>(COMMONS).cloned()),
        RouteSpec::builder(Method::GET, "/users-common/", "read_users")
            .depends(COMMONS)
            .handler(|req| req.dependency::<CommonParameters>(COMMONS).cloned()),
        RouteSpec::builder(
            Method::GET,
            "/items-class-dependencies/",
            "read_items_class_dependency",
        )
        .depends(COMMON_QUERY_PARAMS)
        .depends(STORE)
        .handler(|req| {
            let commons = req.dependency::<CommonQueryParams>(COMMON_QUERY_PARAMS)?;
            let store = req.dependency::<ItemStore>(STORE)?;
            let mut response = Map::new();
            if let Some(q) = commons.q.as_ref().filter(|q| !q.is_empty()) {
                response.insert("q".into(), json!(q));
            }
            response.insert("items".into(), json!(store.page(commons.skip, commons.limit)));
            Ok(Value::Object(response))
        }),
    ]
}

fn security_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::builder(Method::GET, "/items-secure/", "items_secure")
            .depends(TOKEN)
            .output(ValueType::map(ValueType::String))
            .handler(|req| {
                let token = req.dependency::<BearerToken>(TOKEN)?;
                Ok(json!({"token": token.as_str()}))
            }),
        RouteSpec::builder(Method::GET, "/users/me", "read_users_me")
            .depends(CURRENT_USER)
            .output(ValueType::object(models::user()))
            .handler(|req| req.dependency::<CurrentUser>(CURRENT_USER).cloned()),
    ]
}
