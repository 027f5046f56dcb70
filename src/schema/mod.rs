//! # Schema Module
//!
//! Declared value types and the validator that checks raw JSON (or raw request text
//! wrapped as JSON strings) against them.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s. Schemas nest through
//! [`ValueType::Object`], and a derived schema can start from the fields of a base one
//! with [`Schema::extend`]:
//!
//! ```rust
//! use routebind::schema::{Constraints, FieldSpec, Schema, ValueType};
//! use serde_json::json;
//!
//! let item = Schema::builder("Item")
//!     .field(FieldSpec::required("name", ValueType::String))
//!     .field(FieldSpec::required("price", ValueType::Number).constraints(Constraints::new().gt(0.0)))
//!     .field(FieldSpec::optional("description", ValueType::String))
//!     .build();
//!
//! let ok = item.validate(&json!({"name": "Foo", "price": "3.5"})).unwrap();
//! assert_eq!(ok, json!({"name": "Foo", "price": 3.5, "description": null}));
//!
//! let err = item.validate(&json!({"price": 0})).unwrap_err();
//! assert_eq!(err.field_paths(), vec!["name", "price"]);
//! ```

mod types;
mod validate;

pub use types::{Constraints, EnumSpec, FieldSpec, Schema, SchemaBuilder, StringEnum, ValueType};
pub use validate::validate_value;
