//! Field-level validation issues and the aggregate [`ValidationError`].
//!
//! Every failure found while binding parameters, validating bodies or checking a
//! shaped response is recorded as a [`ValidationIssue`] carrying its location
//! (`["body", "item", "tags", 2]`), a machine-readable kind and a human message.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// One step of an issue location: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocItem {
    Field(String),
    Index(usize),
}

impl From<&str> for LocItem {
    fn from(value: &str) -> Self {
        LocItem::Field(value.to_string())
    }
}

impl From<String> for LocItem {
    fn from(value: String) -> Self {
        LocItem::Field(value)
    }
}

impl From<usize> for LocItem {
    fn from(value: usize) -> Self {
        LocItem::Index(value)
    }
}

/// Append `item` to a copy of `loc`.
pub(crate) fn child_loc(loc: &[LocItem], item: impl Into<LocItem>) -> Vec<LocItem> {
    let mut next = Vec::with_capacity(loc.len() + 1);
    next.extend_from_slice(loc);
    next.push(item.into());
    next
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Full location, starting with the source (`path`, `query`, `header`, `cookie`, `body`, `response`)
    pub loc: Vec<LocItem>,
    /// Machine-readable failure kind (e.g. `missing`, `greater_than_equal`)
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(loc: Vec<LocItem>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            loc,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn missing(loc: Vec<LocItem>) -> Self {
        Self::new(loc, "missing", "Field required")
    }

    /// Dotted field path without the source prefix, e.g. `item.tags[2]`.
    ///
    /// A location that only names its source (`["body"]`) renders as that source.
    #[must_use]
    pub fn field_path(&self) -> String {
        let rest = if self.loc.len() > 1 {
            &self.loc[1..]
        } else {
            &self.loc[..]
        };
        let mut out = String::new();
        for item in rest {
            match item {
                LocItem::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                LocItem::Index(idx) => {
                    out.push('[');
                    out.push_str(&idx.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "loc": self.loc,
            "field": self.field_path(),
            "type": self.kind,
            "msg": self.message,
        })
    }
}

/// One or more field-level failures reported together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        ValidationError { issues }
    }

    pub fn single(issue: ValidationIssue) -> Self {
        ValidationError {
            issues: vec![issue],
        }
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Dotted paths of every offending field, in report order.
    #[must_use]
    pub fn field_paths(&self) -> Vec<String> {
        self.issues.iter().map(ValidationIssue::field_path).collect()
    }

    /// Whether any issue sits exactly at `loc`.
    #[must_use]
    pub fn has_issue_at(&self, loc: &[LocItem]) -> bool {
        self.issues.iter().any(|i| i.loc == loc)
    }

    pub fn extend(&mut self, other: ValidationError) {
        self.issues.extend(other.issues);
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.issues.iter().map(ValidationIssue::to_json).collect())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "; {}: {}", issue.field_path(), issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<Vec<ValidationIssue>> for ValidationError {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        ValidationError::new(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_skips_source_and_indexes_arrays() {
        let issue = ValidationIssue::new(
            vec!["body".into(), "item".into(), "tags".into(), 2usize.into()],
            "string_type",
            "Input should be a valid string",
        );
        assert_eq!(issue.field_path(), "item.tags[2]");
    }

    #[test]
    fn test_field_path_of_bare_source() {
        let issue = ValidationIssue::new(vec!["body".into()], "json_invalid", "JSON decode error");
        assert_eq!(issue.field_path(), "body");
    }

    #[test]
    fn test_issue_json_shape() {
        let issue = ValidationIssue::missing(vec!["query".into(), "q".into()]);
        let v = issue.to_json();
        assert_eq!(v["loc"], json!(["query", "q"]));
        assert_eq!(v["field"], "q");
        assert_eq!(v["type"], "missing");
        assert_eq!(v["msg"], "Field required");
    }

    #[test]
    fn test_display_lists_every_issue() {
        let err = ValidationError::new(vec![
            ValidationIssue::missing(vec!["body".into(), "name".into()]),
            ValidationIssue::new(
                vec!["body".into(), "price".into()],
                "greater_than",
                "Input should be greater than 0",
            ),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 validation error(s)"));
        assert!(text.contains("name: Field required"));
        assert!(text.contains("price: Input should be greater than 0"));
    }
}
