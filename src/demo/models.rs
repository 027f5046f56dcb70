//! Schemas of the demo application.
//!
//! Each constructor builds a fresh `Arc<Schema>`; nested schemas are built
//! first and shared by reference.

use crate::schema::{Constraints, FieldSpec, Schema, StringEnum, ValueType};
use serde_json::json;
use std::sync::Arc;

/// Closed set of model names accepted by `/models/{model_name}`.
pub struct ModelName;

impl StringEnum for ModelName {
    const NAME: &'static str = "ModelName";
    const VARIANTS: &'static [&'static str] = &["alexnet", "resnet", "lenet"];
}

pub fn image() -> Arc<Schema> {
    Schema::builder("Image")
        .field(FieldSpec::required("url", ValueType::Url))
        .field(FieldSpec::required("name", ValueType::String))
        .build()
}

pub fn item() -> Arc<Schema> {
    Schema::builder("Item")
        .field(FieldSpec::required("name", ValueType::String))
        .field(
            FieldSpec::optional("description", ValueType::String)
                .constraints(Constraints::new().max_length(300)),
        )
        .field(
            FieldSpec::required("price", ValueType::Number)
                .constraints(Constraints::new().gt(0.0)),
        )
        .field(FieldSpec::optional("tax", ValueType::Number))
        .field(FieldSpec::with_default(
            "tags",
            ValueType::set(ValueType::String),
            json!([]),
        ))
        .field(FieldSpec::optional("image", ValueType::object(image())))
        .build()
}

pub fn user() -> Arc<Schema> {
    Schema::builder("User")
        .field(FieldSpec::required("username", ValueType::String))
        .field(FieldSpec::optional("email", ValueType::String))
        .field(FieldSpec::optional("full_name", ValueType::String))
        .field(FieldSpec::optional("disabled", ValueType::String))
        .build()
}

pub fn offer() -> Arc<Schema> {
    Schema::builder("Offer")
        .field(FieldSpec::required("name", ValueType::String))
        .field(FieldSpec::optional("description", ValueType::String))
        .field(FieldSpec::required("price", ValueType::Number))
        .field(FieldSpec::required(
            "items",
            ValueType::list(ValueType::object(item())),
        ))
        .build()
}

pub fn user_in() -> Arc<Schema> {
    Schema::builder("UserIn")
        .field(FieldSpec::required("username", ValueType::String))
        .field(FieldSpec::required("password", ValueType::String))
        .field(FieldSpec::required("email", ValueType::Email))
        .field(FieldSpec::optional("full_name", ValueType::String))
        .build()
}

pub fn user_out() -> Arc<Schema> {
    Schema::builder("UserOut")
        .field(FieldSpec::required("username", ValueType::String))
        .field(FieldSpec::required("email", ValueType::Email))
        .field(FieldSpec::optional("full_name", ValueType::String))
        .build()
}

pub fn base_user() -> Arc<Schema> {
    Schema::builder("BaseUser")
        .field(FieldSpec::required("username", ValueType::String))
        .field(FieldSpec::required("email", ValueType::Email))
        .field(FieldSpec::optional("full_name", ValueType::String))
        .build()
}

/// `BaseUser` plus a password.
pub fn user_in_from_base() -> Arc<Schema> {
    Schema::extend("UserInFromBase", &base_user())
        .field(FieldSpec::required("password", ValueType::String))
        .build()
}
