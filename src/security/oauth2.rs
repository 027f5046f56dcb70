use crate::dependency::Provider;
use crate::error::ApplicationError;
use crate::schema::ValueType;
use crate::spec::ParameterSpec;
use std::fmt;
use tracing::debug;

/// Bearer token taken from an `Authorization` header.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(<{} bytes>)", self.0.len())
    }
}

/// Reads `Authorization: Bearer <token>` for the OAuth2 password flow.
///
/// The scheme only extracts the token; whether it is valid is the business of
/// whatever provider depends on it. `token_url` names the endpoint clients
/// obtain tokens from.
#[derive(Debug, Clone)]
pub struct OAuth2PasswordBearer {
    token_url: String,
}

impl OAuth2PasswordBearer {
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
        }
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Token from a raw `Authorization` header value.
    ///
    /// A missing header, a scheme other than `Bearer` (case-insensitive) or an
    /// empty token all yield 401 `Not authenticated` with `WWW-Authenticate: Bearer`.
    pub fn extract(&self, authorization: Option<&str>) -> Result<BearerToken, ApplicationError> {
        let Some(header) = authorization else {
            debug!("OAuth2 bearer extraction failed: missing Authorization header");
            return Err(not_authenticated());
        };
        let (scheme, token) = header.trim().split_once(' ').unwrap_or((header.trim(), ""));
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            debug!(scheme = %scheme, "OAuth2 bearer extraction failed: not a bearer credential");
            return Err(not_authenticated());
        }
        Ok(BearerToken::new(token))
    }

    /// Provider named `name` producing a [`BearerToken`].
    ///
    /// Declares the `authorization` header as an optional parameter so that a
    /// missing header reaches [`extract`](Self::extract) and yields 401 rather
    /// than a 422 validation error.
    #[must_use]
    pub fn provider(&self, name: impl Into<String>) -> Provider {
        let scheme = self.clone();
        Provider::function(name, move |input| {
            let header: Option<String> = input.param("authorization")?;
            scheme.extract(header.as_deref())
        })
        .param(ParameterSpec::header("authorization", ValueType::String).optional())
    }
}

pub(crate) fn not_authenticated() -> ApplicationError {
    ApplicationError::unauthorized("Not authenticated").with_header("WWW-Authenticate", "Bearer")
}
