//! apt auth config files.
//!
//! apt reads credentials from `/etc/apt/auth.conf.d/*.conf` in netrc format,
//! so this is a thin wrapper over [`NetRc`] that keeps every Artifact
//! Registry entry in a single file. Writing there usually needs root.

use crate::config::AuthConfig;
use crate::error::Result;
use crate::netrc::{NetRc, WriteMode};
use crate::paths::{apt_config_path, APT_AUTH_CONFIG_DIR};
use std::path::Path;

/// An apt auth config file loaded in memory.
#[derive(Debug, Clone)]
pub struct AptAuthConfig {
    config: NetRc,
}

impl AptAuthConfig {
    /// Open `/etc/apt/auth.conf.d/<name>` (`artifact-registry.conf` by default).
    pub fn open(name: Option<&str>) -> Result<Self> {
        Self::open_in(Path::new(APT_AUTH_CONFIG_DIR), name)
    }

    /// Open `<dir>/<name>`.
    pub fn open_in(dir: &Path, name: Option<&str>) -> Result<Self> {
        let config = NetRc::open(apt_config_path(dir, name))?;
        Ok(AptAuthConfig { config })
    }

    /// Current text of the document.
    pub fn content(&self) -> &str {
        self.config.content()
    }
}

impl AuthConfig for AptAuthConfig {
    fn set_token(&mut self, hosts: &[String], token: &str) {
        self.config.set_token_with(hosts, token, WriteMode::Replace);
    }

    fn set_json_key(&mut self, hosts: &[String], key: &str) {
        self.config.set_json_key_with(hosts, key, WriteMode::Replace);
    }

    fn save(&self) -> Result<()> {
        self.config.save()
    }

    fn path(&self) -> &Path {
        self.config.path()
    }
}
