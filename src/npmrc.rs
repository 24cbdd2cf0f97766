//! Editing Artifact Registry entries in an .npmrc file.
//!
//! Each repository needs four lines:
//!
//! ```ini
//! @scope:registry=https://us-npm.pkg.dev/my-project/repo1/
//! //us-npm.pkg.dev/my-project/repo1/:always-auth=true
//! //us-npm.pkg.dev/my-project/repo1/:email=not.valid@email.com
//! //us-npm.pkg.dev/my-project/repo1/:_authToken=<base64 of login:secret>
//! ```
//!
//! Existing lines are rewritten in place where their value matters
//! (`always-auth`, `_authToken`) and missing ones are appended, so applying
//! the same update twice yields the same file.

use crate::auth::{basic_auth_token, JSON_KEY_LOGIN, TOKEN_LOGIN};
use crate::config::AuthConfig;
use crate::error::Result;
use crate::parser::{parse_line, Line};
use crate::registry::{nerf_dart, normalize_registry_url, scope_registry_key};
use crate::store::{read_optional, write_atomic};
use std::path::{Path, PathBuf};

/// npm insists on an email for always-auth registries; any value works.
pub const PLACEHOLDER_EMAIL: &str = "not.valid@email.com";

/// An .npmrc file loaded in memory.
#[derive(Debug, Clone)]
pub struct Npmrc {
    path: PathBuf,
    scope: Option<String>,
    lines: Vec<String>,
}

/// Which of the four lines a repository already has.
#[derive(Debug, Default)]
struct Found {
    registry: bool,
    always_auth: bool,
    email: bool,
    auth_token: bool,
}

#[derive(Debug)]
struct Target {
    url: String,
    nerfed: String,
    found: Found,
}

impl Npmrc {
    /// Load the .npmrc at `path`. A missing file starts empty.
    ///
    /// `scope` only changes the registry line (`@scope:registry=...`).
    pub fn open(path: impl Into<PathBuf>, scope: Option<&str>) -> Result<Self> {
        let path = path.into();
        let content = read_optional(&path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), "opened npmrc");
        Ok(Self::from_content(path, scope, &content))
    }

    /// Build a document from text without touching the filesystem.
    pub fn from_content(path: impl Into<PathBuf>, scope: Option<&str>, content: &str) -> Self {
        Npmrc {
            path: path.into(),
            scope: scope.map(str::to_string),
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    /// Render the document as it will be saved.
    pub fn content(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Point every repository in `repos` at `user:secret`.
    pub fn update(&mut self, repos: &[String], user: &str, secret: &str) {
        let registry_key = scope_registry_key(self.scope.as_deref());
        let auth_token = basic_auth_token(user, secret);

        let mut targets: Vec<Target> = Vec::with_capacity(repos.len());
        for repo in repos {
            let url = normalize_registry_url(repo);
            if targets.iter().any(|t| t.url == url) {
                continue;
            }
            targets.push(Target {
                nerfed: nerf_dart(&url).to_string(),
                url,
                found: Found::default(),
            });
        }

        let mut lines = Vec::with_capacity(self.lines.len() + 4 * targets.len());
        for raw in &self.lines {
            let line = raw.trim();
            let Line::Entry { key, value } = parse_line(line) else {
                lines.push(line.to_string());
                continue;
            };

            let mut new_line = line.to_string();
            for target in targets.iter_mut() {
                if key == registry_key && normalize_registry_url(value) == target.url {
                    target.found.registry = true;
                }

                let field = key
                    .strip_prefix(target.nerfed.as_str())
                    .and_then(|rest| rest.strip_prefix(':'));
                match field {
                    Some("always-auth") => {
                        new_line = format!("{}:always-auth=true", target.nerfed);
                        target.found.always_auth = true;
                    }
                    Some("email") => target.found.email = true,
                    Some("_authToken") => {
                        new_line = format!("{}:_authToken={}", target.nerfed, auth_token);
                        target.found.auth_token = true;
                    }
                    _ => {}
                }
            }
            lines.push(new_line);
        }

        for target in &targets {
            let nerfed = &target.nerfed;
            if !target.found.registry {
                lines.push(format!("{}={}", registry_key, target.url));
            }
            if !target.found.always_auth {
                lines.push(format!("{}:always-auth=true", nerfed));
            }
            if !target.found.email {
                lines.push(format!("{}:email={}", nerfed, PLACEHOLDER_EMAIL));
            }
            if !target.found.auth_token {
                lines.push(format!("{}:_authToken={}", nerfed, auth_token));
            }
        }

        self.lines = lines;
    }
}

impl AuthConfig for Npmrc {
    fn set_token(&mut self, repos: &[String], token: &str) {
        self.update(repos, TOKEN_LOGIN, token);
    }

    fn set_json_key(&mut self, repos: &[String], key: &str) {
        self.update(repos, JSON_KEY_LOGIN, key);
    }

    fn save(&self) -> Result<()> {
        write_atomic(&self.path, self.content().as_bytes())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
