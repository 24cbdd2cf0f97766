//! Credential helper for Google Artifact Registry.
//!
//! Package managers that cannot talk to Google auth themselves are given
//! credentials through the config files they already read:
//!
//! - `.netrc` for Go, pip and other netrc-aware clients
//! - Maven `settings.xml` `<server>` entries
//! - `.npmrc` registry auth lines
//! - apt `auth.conf.d` files
//!
//! The secret is either an OAuth access token (login `oauth2accesstoken`)
//! or a base64-encoded service account key (login `_json_key_base64`).
//! Access tokens expire, so the `set-*` commands can keep rewriting their
//! file on an interval.
//!
//! # Quick Start
//!
//! ```
//! use ar_cred_helper::{parse_repo_urls, repo_hosts, AuthConfig, NetRc};
//!
//! let urls = parse_repo_urls(&["us-go.pkg.dev/my-project/repo1"]).unwrap();
//! let hosts = repo_hosts(&urls);
//!
//! let mut netrc = NetRc::from_content("/tmp/.netrc", "");
//! netrc.set_token(&hosts, "ya29.token");
//! assert_eq!(
//!     netrc.content(),
//!     "\nmachine us-go.pkg.dev\nlogin oauth2accesstoken\npassword ya29.token\n"
//! );
//! ```
//!
//! # Registry keys in `.npmrc`
//!
//! npm scopes credentials to a registry by its "nerf-darted" URL, the URL
//! with the scheme removed:
//!
//! ```ini
//! registry=https://us-npm.pkg.dev/my-project/repo1/
//! //us-npm.pkg.dev/my-project/repo1/:always-auth=true
//! //us-npm.pkg.dev/my-project/repo1/:_authToken=ya29.token
//! ```

mod adc;
mod apt;
mod auth;
pub mod commands;
mod config;
pub mod duration;
mod error;
mod maven;
mod netrc;
mod npmrc;
mod parser;
pub mod paths;
pub mod refresh;
pub mod registry;
mod repo;
mod store;
pub mod token;
pub mod xml;

// Re-export main types
pub use apt::AptAuthConfig;
pub use auth::{basic_auth_token, encode_json_key, Credential, JSON_KEY_LOGIN, TOKEN_LOGIN};
pub use config::AuthConfig;
pub use error::{Error, Result};
pub use maven::MavenSettings;
pub use netrc::{entry as netrc_entry, NetRc, WriteMode};
pub use npmrc::{Npmrc, PLACEHOLDER_EMAIL};
pub use parser::{parse_line, Line};
pub use refresh::RefreshPolicy;
pub use repo::{
    host_from_uri, parse_repo_urls, repo_hosts, validate_hosts, RepoUrl, REGISTRY_DOMAIN,
    REPO_ID_PREFIX,
};
pub use store::{read_optional, write_atomic};
pub use token::{ApplicationDefault, EnvTokenSource, GcloudCli, GoogleTokenSource, TokenSource};
