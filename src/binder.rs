//! Parameter binding: raw request data in, validated values out.
//!
//! Each [`ParameterSpec`] is bound independently in declaration order. For one
//! parameter the checks run as required-presence, then coercion, then value
//! constraints, and the first failure is recorded. Binding then moves on to the
//! next parameter so a single response can report every offending input.

use crate::context::RequestContext;
use crate::schema::validate_value;
use crate::spec::{ParameterLocation, ParameterSpec};
use crate::validator::{LocItem, ValidationError, ValidationIssue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// Validated parameter values keyed by parameter name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    values: Vec<(String, Value)>,
}

impl BoundParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: &str, value: Value) {
        match self.values.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Deserialize a bound value into `T`.
    ///
    /// A parameter that was never declared deserializes from `null`, so
    /// `Option<T>` reads as `None`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, serde_json::Error> {
        match self.get_value(name) {
            Some(v) => T::deserialize(v),
            None => T::deserialize(&Value::Null),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values as one JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

/// Bind every parameter in `specs` from `ctx`.
///
/// Returns the complete bound set, or every issue found across all parameters.
pub fn bind_parameters(
    specs: &[ParameterSpec],
    ctx: &RequestContext,
) -> Result<BoundParams, ValidationError> {
    let mut bound = BoundParams::new();
    let mut issues: Vec<ValidationIssue> = Vec::new();

    let body_params: Vec<&ParameterSpec> = specs
        .iter()
        .filter(|p| p.location == ParameterLocation::Body)
        .collect();
    let whole_body = body_params.len() == 1 && !body_params[0].embed;
    let body_usable = !body_params.is_empty() && check_body(ctx, whole_body, &mut issues);

    for spec in specs {
        if spec.location == ParameterLocation::Body {
            if body_usable {
                bind_body_param(spec, ctx, whole_body, &mut bound, &mut issues);
            }
            continue;
        }
        let key = spec.lookup_key();
        let loc = vec![LocItem::from(spec.location.as_str()), LocItem::from(&*key)];
        match extract(spec, &key, ctx) {
            Some(raw) => bind_one(spec, &raw, loc, &mut bound, &mut issues),
            None if spec.required => issues.push(ValidationIssue::missing(loc)),
            None => bound.insert(&spec.name, spec.default_value()),
        }
    }

    if issues.is_empty() {
        debug!(request_id = %ctx.request_id, bound = bound.len(), "Parameters bound");
        Ok(bound)
    } else {
        debug!(
            request_id = %ctx.request_id,
            issues = issues.len(),
            "Parameter binding failed"
        );
        Err(ValidationError::new(issues))
    }
}

fn bind_one(
    spec: &ParameterSpec,
    raw: &Value,
    loc: Vec<LocItem>,
    bound: &mut BoundParams,
    issues: &mut Vec<ValidationIssue>,
) {
    match validate_value(&spec.ty, &spec.constraints, raw, &loc) {
        Ok(v) => bound.insert(&spec.name, v),
        Err(mut errs) => issues.append(&mut errs),
    }
}

/// Raw value for a non-body parameter, wrapped as JSON.
///
/// Collection-typed query and header parameters gather every repeated value.
fn extract(spec: &ParameterSpec, key: &str, ctx: &RequestContext) -> Option<Value> {
    let text = |s: &str| Value::String(s.to_string());
    match spec.location {
        ParameterLocation::Path => ctx.path_param(key).map(text),
        ParameterLocation::Cookie => ctx.cookie(key).map(text),
        ParameterLocation::Query if spec.ty.is_collection() => {
            let values = ctx.query_values(key);
            (!values.is_empty()).then(|| Value::Array(values.into_iter().map(text).collect()))
        }
        ParameterLocation::Query => ctx.query(key).map(text),
        ParameterLocation::Header if spec.ty.is_collection() => {
            let values: Vec<Value> = ctx
                .headers()
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| text(v.as_str()))
                .collect();
            (!values.is_empty()).then_some(Value::Array(values))
        }
        ParameterLocation::Header => ctx.header(key).map(text),
        ParameterLocation::Body => None,
    }
}

/// Whether the body can be read at all; records a single issue when not.
fn check_body(ctx: &RequestContext, whole_body: bool, issues: &mut Vec<ValidationIssue>) -> bool {
    if let Some(err) = ctx.body_error() {
        issues.push(ValidationIssue::new(
            vec![LocItem::from("body")],
            "json_invalid",
            format!("JSON decode error: {err}"),
        ));
        return false;
    }
    if !whole_body {
        if let Some(body) = ctx.body() {
            if !body.is_object() {
                issues.push(ValidationIssue::new(
                    vec![LocItem::from("body")],
                    "model_attributes_type",
                    "Input should be a valid dictionary or object to extract fields from",
                ));
                return false;
            }
        }
    }
    true
}

fn bind_body_param(
    spec: &ParameterSpec,
    ctx: &RequestContext,
    whole_body: bool,
    bound: &mut BoundParams,
    issues: &mut Vec<ValidationIssue>,
) {
    let (raw, loc) = if whole_body {
        (ctx.body(), vec![LocItem::from("body")])
    } else {
        let key = spec.lookup_key();
        (
            ctx.body().and_then(|b| b.get(&*key)),
            vec![LocItem::from("body"), LocItem::from(&*key)],
        )
    };
    match raw {
        Some(raw) => bind_one(spec, raw, loc, bound, issues),
        None if spec.required => issues.push(ValidationIssue::missing(loc)),
        None => bound.insert(&spec.name, spec.default_value()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RawRequest;
    use crate::schema::ValueType;
    use serde_json::json;

    fn ctx(raw: RawRequest) -> RequestContext {
        RequestContext::from_raw(raw)
    }

    #[test]
    fn test_defaults_fill_missing_optionals() {
        let specs = vec![
            ParameterSpec::query("skip", ValueType::Integer).with_default(json!(0)),
            ParameterSpec::query("q", ValueType::String).optional(),
        ];
        let bound = bind_parameters(&specs, &ctx(RawRequest::new("GET", "/items/"))).unwrap();
        assert_eq!(bound.to_json(), json!({"skip": 0, "q": null}));
        assert_eq!(bound.get::<Option<String>>("q").unwrap(), None);
    }

    #[test]
    fn test_every_failing_parameter_is_reported() {
        let specs = vec![
            ParameterSpec::query("needy", ValueType::String),
            ParameterSpec::query("skip", ValueType::Integer),
            ParameterSpec::query("limit", ValueType::Integer).le(100.0),
        ];
        let err = bind_parameters(
            &specs,
            &ctx(RawRequest::new("GET", "/?skip=abc&limit=500")),
        )
        .unwrap_err();
        let kinds: Vec<&str> = err.issues().iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["missing", "int_parsing", "less_than_equal"]);
    }

    #[test]
    fn test_repeated_query_keys_bind_to_list() {
        let specs = vec![ParameterSpec::query("q", ValueType::list(ValueType::String)).optional()];
        let bound = bind_parameters(&specs, &ctx(RawRequest::new("GET", "/items/?q=foo&q=bar"))).unwrap();
        assert_eq!(bound.get_value("q"), Some(&json!(["foo", "bar"])));
    }

    #[test]
    fn test_header_and_cookie_lookup() {
        let specs = vec![
            ParameterSpec::header("user_agent", ValueType::String).optional(),
            ParameterSpec::cookie("ads_id", ValueType::String).optional(),
        ];
        let raw = RawRequest::new("GET", "/items/")
            .header("User-Agent", "curl/8")
            .header("cookie", "ads_id=abc");
        let bound = bind_parameters(&specs, &ctx(raw)).unwrap();
        assert_eq!(bound.get::<String>("user_agent").unwrap(), "curl/8");
        assert_eq!(bound.get::<String>("ads_id").unwrap(), "abc");
    }

    #[test]
    fn test_alias_appears_in_location() {
        let specs = vec![ParameterSpec::query("q", ValueType::String).alias("item-query").min_length(3)];
        let err = bind_parameters(&specs, &ctx(RawRequest::new("GET", "/?item-query=ab"))).unwrap_err();
        assert_eq!(err.issues()[0].loc, vec![LocItem::from("query"), LocItem::from("item-query")]);
    }

    #[test]
    fn test_invalid_json_body_single_issue() {
        let specs = vec![
            ParameterSpec::body("item", ValueType::Any),
            ParameterSpec::body("user", ValueType::Any),
        ];
        let err = bind_parameters(&specs, &ctx(RawRequest::new("PUT", "/").body("{oops"))).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.issues()[0].kind, "json_invalid");
    }

    #[test]
    fn test_multiple_body_params_read_keys() {
        let specs = vec![
            ParameterSpec::body("importance", ValueType::Integer),
            ParameterSpec::body("note", ValueType::String).optional(),
        ];
        let raw = RawRequest::new("PUT", "/").json_body(&json!({"importance": "5"}));
        let bound = bind_parameters(&specs, &ctx(raw)).unwrap();
        assert_eq!(bound.to_json(), json!({"importance": 5, "note": null}));

        let err = bind_parameters(&specs, &ctx(RawRequest::new("PUT", "/"))).unwrap_err();
        assert_eq!(err.field_paths(), vec!["importance"]);
    }
}
