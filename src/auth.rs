//! Credentials written into package-manager config files.
//!
//! Artifact Registry accepts two kinds of secret over basic auth: an OAuth
//! access token (login `oauth2accesstoken`) or a base64-encoded service
//! account key (login `_json_key_base64`).

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fmt;
use std::path::Path;

/// Login paired with an OAuth access token.
pub const TOKEN_LOGIN: &str = "oauth2accesstoken";

/// Login paired with a base64-encoded service account key.
pub const JSON_KEY_LOGIN: &str = "_json_key_base64";

/// A secret to write for a set of registries.
///
/// # Security Notes
///
/// - The `Debug` implementation redacts the secret to prevent accidental
///   credential leakage in logs or error messages.
/// - `PartialEq` is intentionally not implemented to prevent timing attacks
///   when comparing credentials.
#[derive(Clone)]
pub enum Credential {
    /// Short-lived OAuth access token.
    Token(String),

    /// Service account key file contents, base64-encoded.
    JsonKey(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
            Credential::JsonKey(_) => f.debug_tuple("JsonKey").field(&"[REDACTED]").finish(),
        }
    }
}

impl Credential {
    /// Login (username) that goes with this kind of secret.
    pub fn login(&self) -> &'static str {
        match self {
            Credential::Token(_) => TOKEN_LOGIN,
            Credential::JsonKey(_) => JSON_KEY_LOGIN,
        }
    }
}

/// Read a service account JSON key file and base64-encode its contents.
pub fn encode_json_key(path: &Path) -> Result<String> {
    let data = std::fs::read(path).map_err(|e| Error::JsonKey {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(BASE64.encode(data))
}

/// Encode `user:secret` for an npm `_authToken` value.
pub fn basic_auth_token(user: &str, secret: &str) -> String {
    let auth = format!("{}:{}", user, secret);
    BASE64.encode(auth.as_bytes())
}
