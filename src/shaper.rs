//! Response shaping: reduce a handler result to its declared output type.
//!
//! Shaping is driven by the declared type, not by whatever the handler returned:
//! an object is rebuilt with exactly the schema's fields, taken from same-named
//! fields of the result, so fields the schema does not list (a password, an
//! internal flag) never reach the client. Shaping an already shaped value yields
//! the same value.

use crate::schema::{validate_value, Constraints, ValueType};
use crate::validator::{LocItem, ValidationError};
use serde_json::{Map, Value};

/// Rebuild `value` to the structure of `ty`.
///
/// Missing object fields are filled with their default (or `null`). Values that
/// do not have the expected JSON shape are left as they are for validation to
/// report.
#[must_use]
pub fn shape(value: &Value, ty: &ValueType) -> Value {
    match (ty, value) {
        (ValueType::Optional(inner), v) if !v.is_null() => shape(v, inner),
        (ValueType::Object(schema), Value::Object(fields)) => {
            let mut out = Map::new();
            for field in schema.fields() {
                let shaped = match fields.get(&field.name) {
                    Some(v) => shape(v, &field.ty),
                    None => field.default_value(),
                };
                out.insert(field.name.clone(), shaped);
            }
            Value::Object(out)
        }
        (ValueType::List(inner) | ValueType::Set(inner), Value::Array(items)) => {
            Value::Array(items.iter().map(|v| shape(v, inner)).collect())
        }
        (ValueType::Map(inner), Value::Object(entries)) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), shape(v, inner)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Shape `value` against `output` and validate the result.
///
/// With no declared output the value passes through untouched. Validation
/// issues are located under `response`.
pub fn shape_response(value: Value, output: Option<&ValueType>) -> Result<Value, ValidationError> {
    let Some(ty) = output else {
        return Ok(value);
    };
    let shaped = shape(&value, ty);
    validate_value(ty, &Constraints::default(), &shaped, &[LocItem::from("response")])
        .map_err(ValidationError::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, Schema};
    use serde_json::json;

    fn user_out() -> ValueType {
        ValueType::Object(
            Schema::builder("UserOut")
                .field(FieldSpec::required("username", ValueType::String))
                .field(FieldSpec::required("email", ValueType::Email))
                .field(FieldSpec::optional("full_name", ValueType::String))
                .build(),
        )
    }

    #[test]
    fn test_secret_fields_are_dropped() {
        let returned = json!({"username": "john", "email": "john@example.com", "password": "s3cret"});
        let shaped = shape_response(returned, Some(&user_out())).unwrap();
        assert_eq!(
            shaped,
            json!({"username": "john", "email": "john@example.com", "full_name": null})
        );
    }

    #[test]
    fn test_shape_is_idempotent() {
        let ty = ValueType::list(user_out());
        let v = json!([{"username": "a", "email": "a@x.io", "extra": 1}, {"username": "b"}]);
        let once = shape(&v, &ty);
        assert_eq!(shape(&once, &ty), once);
    }

    #[test]
    fn test_passthrough_without_output() {
        let v = json!({"anything": [1, 2, 3]});
        assert_eq!(shape_response(v.clone(), None).unwrap(), v);
    }

    #[test]
    fn test_missing_required_output_field_fails_validation() {
        let err = shape_response(json!({"email": "a@x.io"}), Some(&user_out())).unwrap_err();
        assert_eq!(err.issues()[0].loc, vec![LocItem::from("response"), LocItem::from("username")]);
    }
}
