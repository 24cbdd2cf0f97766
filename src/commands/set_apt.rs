use crate::apt::AptAuthConfig;
use crate::error::Result;
use crate::paths::APT_AUTH_CONFIG_DIR;
use crate::refresh;
use crate::repo::repo_hosts;
use async_trait::async_trait;
use clap::Args;
use std::path::PathBuf;

use super::common::{update_once, CommonArgs};
use super::{CommandContext, CredCommand};

#[derive(Debug, Clone, Args)]
pub struct SetAptCmd {
    #[command(flatten)]
    pub common: CommonArgs,

    /// File name under the apt auth.conf.d directory.
    #[arg(
        long,
        env = "AR_CRED_HELPER_APT_AUTH_CONFIG",
        default_value = crate::paths::DEFAULT_APT_CONFIG_NAME,
        value_name = "NAME"
    )]
    pub config_name: String,

    /// Directory apt reads credential files from.
    #[arg(long, hide = true, default_value = APT_AUTH_CONFIG_DIR, value_name = "DIR")]
    pub config_dir: PathBuf,
}

#[async_trait]
impl CredCommand for SetAptCmd {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let validated = self.common.validate(true, Vec::new())?;
        let hosts = repo_hosts(&validated.urls);

        let name = Some(self.config_name.as_str()).filter(|n| !n.is_empty());
        let (common, dir, hosts) = (&self.common, self.config_dir.as_path(), &hosts);
        refresh::run(validated.policy, tokio::signal::ctrl_c(), move || {
            update_once(ctx, common, hosts, move || AptAuthConfig::open_in(dir, name))
        })
        .await
    }
}
