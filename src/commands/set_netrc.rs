use crate::auth::Credential;
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::netrc::{NetRc, WriteMode};
use crate::paths::netrc_path;
use crate::refresh;
use crate::repo::repo_hosts;
use async_trait::async_trait;
use clap::Args;
use std::path::{Path, PathBuf};

use super::common::{log_update, CommonArgs};
use super::{CommandContext, CredCommand};

#[derive(Debug, Clone, Default, Args)]
pub struct SetNetrcCmd {
    #[command(flatten)]
    pub common: CommonArgs,

    /// The .netrc file, or the directory holding it. Defaults to ~/.netrc.
    #[arg(long, env = "AR_CRED_HELPER_NETRC", value_name = "PATH")]
    pub netrc: Option<PathBuf>,

    /// Keep existing Artifact Registry entries and add new ones after them.
    #[arg(long, conflicts_with = "refresh")]
    pub append: bool,

    /// Only swap the access token of entries already in the file.
    #[arg(long)]
    pub refresh: bool,
}

impl SetNetrcCmd {
    fn mode(&self) -> WriteMode {
        if self.append {
            WriteMode::Append
        } else {
            WriteMode::Replace
        }
    }

    async fn update(&self, ctx: &CommandContext, path: &Path, hosts: &[String]) -> Result<()> {
        let credential = ctx
            .credential(self.common.json_key(), self.common.token_env())
            .await?;
        let mut netrc = NetRc::open(path)?;

        match &credential {
            Credential::Token(token) if self.refresh => netrc.refresh(token),
            Credential::JsonKey(_) if self.refresh => {
                return Err(Error::invalid("--refresh only works with access tokens"))
            }
            Credential::Token(token) => netrc.set_token_with(hosts, token, self.mode()),
            Credential::JsonKey(key) => netrc.set_json_key_with(hosts, key, self.mode()),
        }

        netrc.save()?;
        log_update(netrc.path(), hosts, &credential);
        Ok(())
    }
}

#[async_trait]
impl CredCommand for SetNetrcCmd {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut problems = Vec::new();
        if self.refresh && self.common.json_key().is_some() {
            problems.push("--refresh cannot be used with --json-key".to_string());
        }
        let validated = self.common.validate(!self.refresh, problems)?;

        let path = netrc_path(self.netrc.as_deref())?;
        let hosts = repo_hosts(&validated.urls);

        let (this, path, hosts) = (&self, &path, &hosts);
        refresh::run(validated.policy, tokio::signal::ctrl_c(), move || {
            this.update(ctx, path, hosts)
        })
        .await
    }
}
