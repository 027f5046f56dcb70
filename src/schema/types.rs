use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// Rust enums usable as closed string sets (path and query parameters, model fields).
///
/// ```rust
/// use routebind::schema::{EnumSpec, StringEnum};
///
/// enum Colour { Red, Green }
/// impl StringEnum for Colour {
///     const NAME: &'static str = "Colour";
///     const VARIANTS: &'static [&'static str] = &["red", "green"];
/// }
///
/// let spec = EnumSpec::of::<Colour>();
/// assert!(spec.contains("red"));
/// assert!(!spec.contains("blue"));
/// ```
pub trait StringEnum {
    const NAME: &'static str;
    const VARIANTS: &'static [&'static str];
}

/// A named, closed set of accepted string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumSpec {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumSpec {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn of<E: StringEnum>() -> Self {
        Self::new(E::NAME, E::VARIANTS.iter().copied())
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.members.iter().any(|m| m == value)
    }

    /// `'a', 'b' or 'c'`
    pub(crate) fn describe(&self) -> String {
        let quoted: Vec<String> = self.members.iter().map(|m| format!("'{m}'")).collect();
        match quoted.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        }
    }
}

/// Declared type of a parameter, field or response.
#[derive(Debug, Clone)]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    /// String holding a syntactically valid e-mail address
    Email,
    /// Absolute `http`/`https` URL
    Url,
    Enum(Arc<EnumSpec>),
    Object(Arc<Schema>),
    List(Box<ValueType>),
    /// List with duplicates removed, first occurrence wins
    Set(Box<ValueType>),
    /// Object with string keys and uniformly typed values
    Map(Box<ValueType>),
    /// Accepts `null` in addition to the inner type
    Optional(Box<ValueType>),
    Any,
}

impl ValueType {
    pub fn list(inner: ValueType) -> Self {
        ValueType::List(Box::new(inner))
    }

    pub fn set(inner: ValueType) -> Self {
        ValueType::Set(Box::new(inner))
    }

    pub fn map(inner: ValueType) -> Self {
        ValueType::Map(Box::new(inner))
    }

    pub fn optional(inner: ValueType) -> Self {
        match inner {
            ValueType::Optional(_) => inner,
            other => ValueType::Optional(Box::new(other)),
        }
    }

    pub fn object(schema: Arc<Schema>) -> Self {
        ValueType::Object(schema)
    }

    pub fn enumeration(spec: EnumSpec) -> Self {
        ValueType::Enum(Arc::new(spec))
    }

    /// Whether values of this type are bound from repeated query keys.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        match self {
            ValueType::List(_) | ValueType::Set(_) => true,
            ValueType::Optional(inner) => inner.is_collection(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, ValueType::Optional(_) | ValueType::Any)
    }

    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            ValueType::String => "string".to_string(),
            ValueType::Integer => "integer".to_string(),
            ValueType::Number => "number".to_string(),
            ValueType::Boolean => "boolean".to_string(),
            ValueType::Email => "email".to_string(),
            ValueType::Url => "url".to_string(),
            ValueType::Enum(spec) => spec.name.clone(),
            ValueType::Object(schema) => schema.name().to_string(),
            ValueType::List(inner) => format!("list[{}]", inner.type_name()),
            ValueType::Set(inner) => format!("set[{}]", inner.type_name()),
            ValueType::Map(inner) => format!("dict[str, {}]", inner.type_name()),
            ValueType::Optional(inner) => format!("{} | null", inner.type_name()),
            ValueType::Any => "any".to_string(),
        }
    }
}

/// Numeric bounds, length limits and a pattern applied after type coercion.
///
/// Lengths count characters for strings and items for lists, sets and maps.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub gt: Option<f64>,
    pub ge: Option<f64>,
    pub lt: Option<f64>,
    pub le: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    pub fn ge(mut self, bound: f64) -> Self {
        self.ge = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.lt = Some(bound);
        self
    }

    pub fn le(mut self, bound: f64) -> Self {
        self.le = Some(bound);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, re: Regex) -> Self {
        self.pattern = Some(re);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gt.is_none()
            && self.ge.is_none()
            && self.lt.is_none()
            && self.le.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }
}

/// A single named field of a [`Schema`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub ty: ValueType,
    pub required: bool,
    /// Value used when the field is absent; `None` means `null`
    pub default: Option<Value>,
    pub constraints: Constraints,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, ty: ValueType) -> Self {
        FieldSpec {
            name: name.into(),
            ty,
            required: true,
            default: None,
            constraints: Constraints::default(),
        }
    }

    /// Nullable field defaulting to `null`.
    pub fn optional(name: impl Into<String>, ty: ValueType) -> Self {
        FieldSpec {
            name: name.into(),
            ty: ValueType::optional(ty),
            required: false,
            default: None,
            constraints: Constraints::default(),
        }
    }

    pub fn with_default(name: impl Into<String>, ty: ValueType, default: Value) -> Self {
        FieldSpec {
            name: name.into(),
            ty,
            required: false,
            default: Some(default),
            constraints: Constraints::default(),
        }
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Value filled in when the field is absent from the input.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }
}

/// Named structured type: an ordered list of fields.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Start a new schema from the fields of `base`.
    pub fn extend(name: impl Into<String>, base: &Schema) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: base.fields.clone(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// Add a field; a field with the same name is replaced in place.
    pub fn field(mut self, field: FieldSpec) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
        self
    }

    pub fn build(self) -> Arc<Schema> {
        Arc::new(Schema {
            name: self.name,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_describe() {
        let spec = EnumSpec::new("ModelName", ["alexnet", "resnet", "lenet"]);
        assert_eq!(spec.describe(), "'alexnet', 'resnet' or 'lenet'");
        assert_eq!(EnumSpec::new("One", ["a"]).describe(), "'a'");
    }

    #[test]
    fn test_extend_replaces_same_named_field() {
        let base = Schema::builder("BaseUser")
            .field(FieldSpec::required("username", ValueType::String))
            .field(FieldSpec::optional("full_name", ValueType::String))
            .build();
        let derived = Schema::extend("UserIn", &base)
            .field(FieldSpec::required("password", ValueType::String))
            .field(FieldSpec::required("full_name", ValueType::String))
            .build();
        let names: Vec<&str> = derived.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["username", "full_name", "password"]);
        assert!(derived.field("full_name").is_some_and(|f| f.required));
        assert_eq!(base.fields().len(), 2);
    }

    #[test]
    fn test_optional_does_not_double_wrap() {
        let ty = ValueType::optional(ValueType::optional(ValueType::String));
        assert_eq!(ty.type_name(), "string | null");
    }

    #[test]
    fn test_collection_detection() {
        assert!(ValueType::list(ValueType::String).is_collection());
        assert!(ValueType::optional(ValueType::set(ValueType::Integer)).is_collection());
        assert!(!ValueType::map(ValueType::Integer).is_collection());
    }
}
