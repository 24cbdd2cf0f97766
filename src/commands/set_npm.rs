use crate::error::Result;
use crate::npmrc::Npmrc;
use crate::paths::npmrc_path;
use crate::refresh;
use async_trait::async_trait;
use clap::Args;
use std::path::PathBuf;

use super::common::{update_once, CommonArgs};
use super::{CommandContext, CredCommand};

#[derive(Debug, Clone, Default, Args)]
pub struct SetNpmCmd {
    #[command(flatten)]
    pub common: CommonArgs,

    /// The .npmrc file. Defaults to ~/.npmrc.
    #[arg(long, env = "AR_CRED_HELPER_NPMRC", value_name = "PATH")]
    pub npmrc: Option<PathBuf>,

    /// Package scope the repositories serve, with or without the leading '@'.
    #[arg(long, env = "AR_CRED_HELPER_SCOPE", value_name = "SCOPE")]
    pub scope: Option<String>,
}

#[async_trait]
impl CredCommand for SetNpmCmd {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let validated = self.common.validate(true, Vec::new())?;
        let path = npmrc_path(self.npmrc.as_deref())?;

        // npm keys credentials by registry URL, not by host.
        let repos: Vec<String> = validated.urls.iter().map(ToString::to_string).collect();

        let scope = self.scope.as_deref();
        let (common, path, repos) = (&self.common, &path, &repos);
        refresh::run(validated.policy, tokio::signal::ctrl_c(), move || {
            update_once(ctx, common, repos, move || Npmrc::open(path, scope))
        })
        .await
    }
}
