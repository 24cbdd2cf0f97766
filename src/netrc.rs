//! Editing Artifact Registry entries in a netrc file.
//!
//! Entries are written as three-line stanzas, each preceded by a newline:
//!
//! ```text
//!
//! machine us-go.pkg.dev
//! login oauth2accesstoken
//! password ya29.a0Af...
//! ```
//!
//! Only stanzas in exactly this shape are recognized when replacing or
//! refreshing; everything else in the file is left alone.

use crate::auth::{JSON_KEY_LOGIN, TOKEN_LOGIN};
use crate::config::AuthConfig;
use crate::error::Result;
use crate::store::{read_optional, write_atomic};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Any Artifact Registry stanza, token or JSON key.
static REGISTRY_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\nmachine (.*\.pkg\.dev)\nlogin (oauth2accesstoken|_json_key_base64)\npassword (.*)\n")
        .unwrap()
});

/// Artifact Registry stanzas holding an access token.
static TOKEN_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\nmachine (.*\.pkg\.dev)\nlogin oauth2accesstoken\npassword (.*)\n").unwrap()
});

/// How new stanzas relate to the ones already in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Drop every existing Artifact Registry stanza, then add the new ones.
    #[default]
    Replace,
    /// Add the new stanzas after the existing content. Hosts that already
    /// have a stanza end up with two.
    Append,
}

/// Format one netrc stanza.
pub fn entry(host: &str, login: &str, password: &str) -> String {
    format!("\nmachine {host}\nlogin {login}\npassword {password}\n")
}

/// A netrc file loaded in memory.
#[derive(Debug, Clone)]
pub struct NetRc {
    path: PathBuf,
    content: String,
}

impl NetRc {
    /// Load the netrc file at `path`.
    ///
    /// A missing file is not an error: the document starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = read_optional(&path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), "opened netrc");
        Ok(NetRc { path, content })
    }

    /// Build a document from text without touching the filesystem.
    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        NetRc {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Current text of the document.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Write an access token stanza for every host.
    pub fn set_token_with(&mut self, hosts: &[String], token: &str, mode: WriteMode) {
        self.update(hosts, TOKEN_LOGIN, token, mode);
    }

    /// Write a JSON key stanza for every host.
    pub fn set_json_key_with(&mut self, hosts: &[String], key: &str, mode: WriteMode) {
        self.update(hosts, JSON_KEY_LOGIN, key, mode);
    }

    /// Replace the password of every existing access token stanza.
    ///
    /// JSON key stanzas and all other content are untouched, and no stanza
    /// is added or removed.
    pub fn refresh(&mut self, token: &str) {
        self.content = TOKEN_ENTRY
            .replace_all(&self.content, |caps: &regex::Captures| {
                entry(&caps[1], TOKEN_LOGIN, token)
            })
            .into_owned();
    }

    fn update(&mut self, hosts: &[String], login: &str, password: &str, mode: WriteMode) {
        let mut content = match mode {
            WriteMode::Replace => REGISTRY_ENTRY.replace_all(&self.content, "").into_owned(),
            WriteMode::Append => std::mem::take(&mut self.content),
        };
        for host in hosts {
            content.push_str(&entry(host, login, password));
        }
        self.content = content;
    }
}

impl AuthConfig for NetRc {
    fn set_token(&mut self, hosts: &[String], token: &str) {
        self.set_token_with(hosts, token, WriteMode::Replace);
    }

    fn set_json_key(&mut self, hosts: &[String], key: &str) {
        self.set_json_key_with(hosts, key, WriteMode::Replace);
    }

    fn save(&self) -> Result<()> {
        write_atomic(&self.path, self.content.as_bytes())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
