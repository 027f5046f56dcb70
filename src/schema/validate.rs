use super::types::{Constraints, Schema, ValueType};
use crate::validator::{child_loc, LocItem, ValidationError, ValidationIssue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tracing::trace;

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").ok()
});

type Issues = Vec<ValidationIssue>;

/// Coerce and check `value` against `ty`, then apply `constraints`.
///
/// Coercion is lax: numeric strings satisfy numeric types and `"yes"`/`"off"`
/// style strings satisfy booleans, so raw path and query text can be fed in
/// directly. On success the returned value is normalized (integers as `i64`,
/// numbers as `f64`, objects reduced to their declared fields in declaration
/// order with defaults filled in). Every failure below `loc` is collected.
pub fn validate_value(
    ty: &ValueType,
    constraints: &Constraints,
    value: &Value,
    loc: &[LocItem],
) -> Result<Value, Issues> {
    let coerced = coerce(ty, value, loc)?;
    if coerced.is_null() || constraints.is_empty() {
        return Ok(coerced);
    }
    let issues = check_constraints(constraints, &coerced, loc);
    if issues.is_empty() {
        Ok(coerced)
    } else {
        Err(issues)
    }
}

impl Schema {
    /// Validate a body-like payload against this schema.
    ///
    /// Issues are located under `body`.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        validate_object(self, value, &[LocItem::from("body")]).map_err(ValidationError::new)
    }
}

fn coerce(ty: &ValueType, value: &Value, loc: &[LocItem]) -> Result<Value, Issues> {
    match ty {
        ValueType::Any => Ok(value.clone()),
        ValueType::Optional(inner) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                coerce(inner, value, loc)
            }
        }
        ValueType::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(one(loc, "string_type", "Input should be a valid string")),
        },
        ValueType::Integer => coerce_integer(value, loc),
        ValueType::Number => coerce_number(value, loc),
        ValueType::Boolean => coerce_bool(value, loc),
        ValueType::Email => match value {
            Value::String(s) => {
                let valid = EMAIL_RE.as_ref().is_some_and(|re| re.is_match(s));
                if valid {
                    Ok(value.clone())
                } else {
                    Err(one(
                        loc,
                        "value_error",
                        "value is not a valid email address: An email address must have an @-sign and a valid domain",
                    ))
                }
            }
            _ => Err(one(loc, "string_type", "Input should be a valid string")),
        },
        ValueType::Url => match value {
            Value::String(s) => match url::Url::parse(s) {
                Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Ok(value.clone()),
                Ok(_) => Err(one(loc, "url_scheme", "URL scheme should be 'http' or 'https'")),
                Err(e) => Err(one(
                    loc,
                    "url_parsing",
                    format!("Input should be a valid URL, {e}"),
                )),
            },
            _ => Err(one(loc, "url_type", "URL input should be a string or URL")),
        },
        ValueType::Enum(spec) => match value {
            Value::String(s) if spec.contains(s) => Ok(value.clone()),
            _ => Err(one(
                loc,
                "enum",
                format!("Input should be {}", spec.describe()),
            )),
        },
        ValueType::Object(schema) => validate_object(schema, value, loc),
        ValueType::List(inner) => match value {
            Value::Array(items) => coerce_items(inner, items, loc).map(Value::Array),
            _ => Err(one(loc, "list_type", "Input should be a valid list")),
        },
        ValueType::Set(inner) => match value {
            Value::Array(items) => {
                let coerced = coerce_items(inner, items, loc)?;
                let mut seen = HashSet::new();
                let unique = coerced
                    .into_iter()
                    .filter(|v| seen.insert(v.to_string()))
                    .collect();
                Ok(Value::Array(unique))
            }
            _ => Err(one(loc, "set_type", "Input should be a valid set")),
        },
        ValueType::Map(inner) => match value {
            Value::Object(entries) => {
                let mut out = Map::new();
                let mut issues = Vec::new();
                for (key, v) in entries {
                    match coerce(inner, v, &child_loc(loc, key.as_str())) {
                        Ok(c) => {
                            out.insert(key.clone(), c);
                        }
                        Err(mut errs) => issues.append(&mut errs),
                    }
                }
                if issues.is_empty() {
                    Ok(Value::Object(out))
                } else {
                    Err(issues)
                }
            }
            _ => Err(one(loc, "dict_type", "Input should be a valid dictionary")),
        },
    }
}

fn validate_object(schema: &Schema, value: &Value, loc: &[LocItem]) -> Result<Value, Issues> {
    let Value::Object(input) = value else {
        return Err(one(
            loc,
            "model_type",
            format!(
                "Input should be a valid dictionary or instance of {}",
                schema.name()
            ),
        ));
    };
    let mut out = Map::new();
    let mut issues = Vec::new();
    for field in schema.fields() {
        let field_loc = child_loc(loc, field.name.as_str());
        match input.get(&field.name) {
            Some(raw) => match validate_value(&field.ty, &field.constraints, raw, &field_loc) {
                Ok(v) => {
                    out.insert(field.name.clone(), v);
                }
                Err(mut errs) => issues.append(&mut errs),
            },
            None if field.required => issues.push(ValidationIssue::missing(field_loc)),
            None => {
                out.insert(field.name.clone(), field.default_value());
            }
        }
    }
    if issues.is_empty() {
        trace!(schema = %schema.name(), fields = out.len(), "Object validated");
        Ok(Value::Object(out))
    } else {
        Err(issues)
    }
}

fn coerce_items(inner: &ValueType, items: &[Value], loc: &[LocItem]) -> Result<Vec<Value>, Issues> {
    let mut out = Vec::with_capacity(items.len());
    let mut issues = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        match coerce(inner, item, &child_loc(loc, idx)) {
            Ok(v) => out.push(v),
            Err(mut errs) => issues.append(&mut errs),
        }
    }
    if issues.is_empty() {
        Ok(out)
    } else {
        Err(issues)
    }
}

/// Signed decimal digits, optionally followed by a fraction of zeros (`"7.0"`).
/// Exponents, other fractions and values outside `i64` are rejected.
fn parse_integer_str(s: &str) -> Option<i64> {
    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (s, None),
    };
    let digits = whole.strip_prefix(['+', '-']).unwrap_or(whole);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b == b'0') {
            return None;
        }
    }
    whole.parse::<i64>().ok()
}

fn coerce_integer(value: &Value, loc: &[LocItem]) -> Result<Value, Issues> {
    const FRACTIONAL: &str = "Input should be a valid integer, got a number with a fractional part";
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(one(loc, "int_from_float", FRACTIONAL)),
            }
        }
        Value::String(s) => parse_integer_str(s.trim()).map(Value::from).ok_or_else(|| {
            one(
                loc,
                "int_parsing",
                "Input should be a valid integer, unable to parse string as an integer",
            )
        }),
        _ => Err(one(loc, "int_type", "Input should be a valid integer")),
    }
}

fn coerce_number(value: &Value, loc: &[LocItem]) -> Result<Value, Issues> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => Some(f),
            Err(_) => {
                return Err(one(
                    loc,
                    "float_parsing",
                    "Input should be a valid number, unable to parse string as a number",
                ))
            }
        },
        _ => return Err(one(loc, "float_type", "Input should be a valid number")),
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| one(loc, "finite_number", "Input should be a finite number"))
}

fn coerce_bool(value: &Value, loc: &[LocItem]) -> Result<Value, Issues> {
    const UNINTERPRETABLE: &str = "Input should be a valid boolean, unable to interpret input";
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(one(loc, "bool_parsing", UNINTERPRETABLE)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "t" | "y" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" | "f" | "n" => Ok(Value::Bool(false)),
            _ => Err(one(loc, "bool_parsing", UNINTERPRETABLE)),
        },
        _ => Err(one(loc, "bool_type", "Input should be a valid boolean")),
    }
}

fn check_constraints(c: &Constraints, value: &Value, loc: &[LocItem]) -> Issues {
    let mut issues = Vec::new();
    if let Some(n) = value.as_f64() {
        if let Some(bound) = c.gt {
            if n <= bound {
                issues.push(issue(loc, "greater_than", format!("Input should be greater than {}", fmt_bound(bound))));
            }
        }
        if let Some(bound) = c.ge {
            if n < bound {
                issues.push(issue(
                    loc,
                    "greater_than_equal",
                    format!("Input should be greater than or equal to {}", fmt_bound(bound)),
                ));
            }
        }
        if let Some(bound) = c.lt {
            if n >= bound {
                issues.push(issue(loc, "less_than", format!("Input should be less than {}", fmt_bound(bound))));
            }
        }
        if let Some(bound) = c.le {
            if n > bound {
                issues.push(issue(
                    loc,
                    "less_than_equal",
                    format!("Input should be less than or equal to {}", fmt_bound(bound)),
                ));
            }
        }
    }

    let (len, is_string) = match value {
        Value::String(s) => (Some(s.chars().count()), true),
        Value::Array(items) => (Some(items.len()), false),
        Value::Object(entries) => (Some(entries.len()), false),
        _ => (None, false),
    };
    if let Some(len) = len {
        let (unit, short_kind, long_kind, noun) = if is_string {
            ("character", "string_too_short", "string_too_long", "String")
        } else {
            ("item", "too_short", "too_long", "Value")
        };
        if let Some(min) = c.min_length {
            if len < min {
                issues.push(issue(
                    loc,
                    short_kind,
                    format!("{noun} should have at least {min} {}", plural(unit, min)),
                ));
            }
        }
        if let Some(max) = c.max_length {
            if len > max {
                issues.push(issue(
                    loc,
                    long_kind,
                    format!("{noun} should have at most {max} {}", plural(unit, max)),
                ));
            }
        }
    }

    if let (Some(re), Value::String(s)) = (&c.pattern, value) {
        if !re.is_match(s) {
            issues.push(issue(
                loc,
                "string_pattern_mismatch",
                format!("String should match pattern '{}'", re.as_str()),
            ));
        }
    }
    issues
}

fn plural(unit: &str, n: usize) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

fn fmt_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

fn issue(loc: &[LocItem], kind: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::new(loc.to_vec(), kind, message)
}

fn one(loc: &[LocItem], kind: &str, message: impl Into<String>) -> Issues {
    vec![issue(loc, kind, message)]
}
