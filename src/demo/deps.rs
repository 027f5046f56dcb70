//! Providers of the demo application.

use crate::dependency::{Injectable, Provider, ProviderInput};
use crate::error::ApplicationError;
use crate::schema::ValueType;
use crate::security::{BearerToken, SignedTokenDecoder};
use crate::spec::ParameterSpec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const STORE: &str = "store";
pub const COMMONS: &str = "commons";
pub const COMMON_QUERY_PARAMS: &str = "common_query_params";
pub const TOKEN: &str = "token";
pub const CURRENT_USER: &str = "current_user";

fn paging_parameters(default_limit: i64) -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::query("q", ValueType::String).optional(),
        ParameterSpec::query("skip", ValueType::Integer)
            .with_default(json!(0))
            .ge(0.0),
        ParameterSpec::query("limit", ValueType::Integer)
            .with_default(json!(default_limit))
            .ge(0.0),
    ]
}

/// `q`, `skip` and `limit` shared by several listing routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonParameters {
    pub q: Option<String>,
    pub skip: usize,
    pub limit: usize,
}

/// Function-style provider of [`CommonParameters`].
#[must_use]
pub fn common_parameters() -> Provider {
    paging_parameters(100).into_iter().fold(
        Provider::function(COMMONS, |input: &ProviderInput<'_>| {
            Ok(CommonParameters {
                q: input.param("q")?,
                skip: input.param("skip")?,
                limit: input.param("limit")?,
            })
        }),
        Provider::param,
    )
}

/// Type-style provider: the same inputs, constructed through [`Injectable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonQueryParams {
    pub q: Option<String>,
    pub skip: usize,
    pub limit: usize,
}

impl Injectable for CommonQueryParams {
    fn parameters() -> Vec<ParameterSpec> {
        paging_parameters(100)
    }

    fn construct(input: &ProviderInput<'_>) -> Result<Self, ApplicationError> {
        Ok(CommonQueryParams {
            q: input.param("q")?,
            skip: input.param("skip")?,
            limit: input.param("limit")?,
        })
    }
}

/// The authenticated user, as decoded from the bearer token's claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: Option<String>,
}

impl CurrentUser {
    /// `sub` becomes the username; `email`, `full_name` and `disabled` are optional claims.
    pub fn from_claims(claims: &Value) -> Result<Self, ApplicationError> {
        let text = |key: &str| claims.get(key).and_then(Value::as_str).map(str::to_string);
        let Some(username) = text("sub") else {
            debug!("Token claims carry no subject");
            return Err(ApplicationError::unauthorized("Could not validate credentials")
                .with_header("WWW-Authenticate", "Bearer"));
        };
        Ok(CurrentUser {
            username,
            email: text("email"),
            full_name: text("full_name"),
            disabled: text("disabled"),
        })
    }
}

/// Decodes the request's bearer token into a [`CurrentUser`].
#[must_use]
pub fn current_user(decoder: SignedTokenDecoder) -> Provider {
    Provider::function(CURRENT_USER, move |input: &ProviderInput<'_>| {
        let token = input.dependency::<BearerToken>(TOKEN)?;
        let claims = decoder.decode(token.as_str())?;
        CurrentUser::from_claims(&claims)
    })
    .depends(TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_from_claims() {
        let user = CurrentUser::from_claims(&json!({"sub": "john", "email": "john@example.com"})).unwrap();
        assert_eq!(user.username, "john");
        assert_eq!(user.email.as_deref(), Some("john@example.com"));
        assert_eq!(user.full_name, None);
    }

    #[test]
    fn test_claims_without_subject_rejected() {
        let err = CurrentUser::from_claims(&json!({"email": "x@y.z"})).unwrap_err();
        assert_eq!(err.status, 401);
    }

    #[test]
    fn test_common_parameters_declares_paging_inputs() {
        let provider = common_parameters();
        let names: Vec<&str> = provider.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["q", "skip", "limit"]);
        assert_eq!(provider.name(), COMMONS);
    }
}
