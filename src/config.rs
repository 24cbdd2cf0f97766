//! The contract shared by every config file updater.

use crate::auth::Credential;
use crate::error::Result;
use std::path::Path;

/// A credential-bearing config document loaded in memory.
///
/// Implementations are opened from disk (or start empty when the file does
/// not exist yet), mutated by `set_token` / `set_json_key`, and written back
/// with [`AuthConfig::save`]. `targets` are whatever key the format uses:
/// hosts for netrc and apt, repository URLs for npm, repo IDs for Maven.
pub trait AuthConfig {
    /// Store an OAuth access token for every target.
    fn set_token(&mut self, targets: &[String], token: &str);

    /// Store a base64-encoded service account key for every target.
    fn set_json_key(&mut self, targets: &[String], key: &str);

    /// Persist the document, creating parent directories as needed.
    fn save(&self) -> Result<()>;

    /// Where the document is saved.
    fn path(&self) -> &Path;

    /// Store whichever kind of secret `credential` holds.
    fn apply(&mut self, targets: &[String], credential: &Credential) {
        match credential {
            Credential::Token(token) => self.set_token(targets, token),
            Credential::JsonKey(key) => self.set_json_key(targets, key),
        }
    }
}
