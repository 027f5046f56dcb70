use crate::schema::{Constraints, ValueType};
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

/// Where a parameter's raw value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    /// Lowercase name used as the first element of validation locations.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one handler input.
///
/// Parameters are required unless [`optional`](Self::optional) or
/// [`with_default`](Self::with_default) is applied.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub ty: ValueType,
    pub required: bool,
    pub default: Option<Value>,
    pub constraints: Constraints,
    /// External name to read instead of `name`
    pub alias: Option<String>,
    /// Body only: read `body[name]` even when this is the sole body parameter
    pub embed: bool,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, location: ParameterLocation, ty: ValueType) -> Self {
        ParameterSpec {
            name: name.into(),
            location,
            ty,
            required: true,
            default: None,
            constraints: Constraints::default(),
            alias: None,
            embed: false,
        }
    }

    pub fn path(name: impl Into<String>, ty: ValueType) -> Self {
        Self::new(name, ParameterLocation::Path, ty)
    }

    pub fn query(name: impl Into<String>, ty: ValueType) -> Self {
        Self::new(name, ParameterLocation::Query, ty)
    }

    pub fn header(name: impl Into<String>, ty: ValueType) -> Self {
        Self::new(name, ParameterLocation::Header, ty)
    }

    pub fn cookie(name: impl Into<String>, ty: ValueType) -> Self {
        Self::new(name, ParameterLocation::Cookie, ty)
    }

    pub fn body(name: impl Into<String>, ty: ValueType) -> Self {
        Self::new(name, ParameterLocation::Body, ty)
    }

    /// Not required; binds `null` when absent.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self.ty = ValueType::optional(self.ty);
        self
    }

    /// Not required; binds `value` when absent.
    pub fn with_default(mut self, value: Value) -> Self {
        self.required = false;
        self.default = Some(value);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn embed(mut self) -> Self {
        self.embed = true;
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.constraints.gt = Some(bound);
        self
    }

    pub fn ge(mut self, bound: f64) -> Self {
        self.constraints.ge = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.constraints.lt = Some(bound);
        self
    }

    pub fn le(mut self, bound: f64) -> Self {
        self.constraints.le = Some(bound);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, re: Regex) -> Self {
        self.constraints.pattern = Some(re);
        self
    }

    /// Name the raw value is looked up by.
    ///
    /// The alias wins; otherwise header parameters translate `_` to `-`
    /// (`user_agent` reads `user-agent`).
    #[must_use]
    pub fn lookup_key(&self) -> Cow<'_, str> {
        match (&self.alias, self.location) {
            (Some(alias), _) => Cow::Borrowed(alias.as_str()),
            (None, ParameterLocation::Header) => Cow::Owned(self.name.replace('_', "-")),
            (None, _) => Cow::Borrowed(self.name.as_str()),
        }
    }

    /// Value bound when the parameter is absent and not required.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_translates_underscores() {
        let p = ParameterSpec::header("user_agent", ValueType::String);
        assert_eq!(p.lookup_key(), "user-agent");
        let aliased = ParameterSpec::query("q", ValueType::String).alias("item-query");
        assert_eq!(aliased.lookup_key(), "item-query");
    }

    #[test]
    fn test_optional_relaxes_requirement() {
        let p = ParameterSpec::query("q", ValueType::String).optional().max_length(50);
        assert!(!p.required);
        assert!(p.ty.is_optional());
        assert_eq!(p.constraints.max_length, Some(50));
        assert_eq!(p.default_value(), Value::Null);
    }
}
