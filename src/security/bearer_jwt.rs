use crate::error::ApplicationError;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

/// Decodes `header.payload.signature` tokens signed with a shared string.
///
/// The signature part must equal the configured signature and the payload must
/// be base64-encoded JSON (URL-safe without padding, or standard). There is no
/// cryptography involved: anyone who knows the signature can mint tokens.
///
/// # Security
///
/// Suitable for tests, demos and internal tooling only. Never use it to protect
/// anything reachable by untrusted clients.
#[derive(Clone)]
pub struct SignedTokenDecoder {
    signature: String,
}

impl SignedTokenDecoder {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }

    /// Claims of `token`, or 401 `Could not validate credentials`.
    pub fn decode(&self, token: &str) -> Result<Value, ApplicationError> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            debug!("Token rejected: not of the form header.payload.signature");
            return Err(invalid_credentials());
        };
        if sig != self.signature {
            debug!("Token rejected: signature mismatch");
            return Err(invalid_credentials());
        }
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .or_else(|_| general_purpose::STANDARD.decode(payload))
            .map_err(|e| {
                debug!(error = %e, "Token rejected: payload is not base64");
                invalid_credentials()
            })?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(claims @ Value::Object(_)) => Ok(claims),
            Ok(_) => {
                debug!("Token rejected: payload is not a JSON object");
                Err(invalid_credentials())
            }
            Err(e) => {
                debug!(error = %e, "Token rejected: payload is not JSON");
                Err(invalid_credentials())
            }
        }
    }

    /// Mint a token carrying `claims` that [`decode`](Self::decode) accepts.
    #[must_use]
    pub fn encode(&self, claims: &Value) -> String {
        let header = json!({"alg": "shared", "typ": "JWT"});
        format!(
            "{}.{}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode(header.to_string()),
            general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string()),
            self.signature
        )
    }
}

impl fmt::Debug for SignedTokenDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedTokenDecoder")
            .field("signature", &"<redacted>")
            .finish()
    }
}

fn invalid_credentials() -> ApplicationError {
    ApplicationError::unauthorized("Could not validate credentials")
        .with_header("WWW-Authenticate", "Bearer")
}
