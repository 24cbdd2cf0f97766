use crate::error::Result;
use crate::maven::MavenSettings;
use crate::paths::maven_settings_path;
use crate::refresh;
use crate::repo::RepoUrl;
use async_trait::async_trait;
use clap::Args;
use std::path::PathBuf;

use super::common::{update_once, CommonArgs};
use super::{CommandContext, CredCommand};

#[derive(Debug, Clone, Default, Args)]
pub struct SetMavenCmd {
    #[command(flatten)]
    pub common: CommonArgs,

    /// The settings.xml file, or the directory holding it. Defaults to
    /// ~/.m2/settings.xml.
    #[arg(long, env = "AR_CRED_HELPER_MAVEN_SETTINGS", value_name = "PATH")]
    pub maven_settings: Option<PathBuf>,

    /// Server IDs to write instead of the ones derived from --repo-urls.
    #[arg(
        long,
        env = "AR_CRED_HELPER_MAVEN_REPO_IDS_OVERRIDE",
        value_delimiter = ',',
        value_name = "IDS"
    )]
    pub repo_ids_override: Vec<String>,
}

impl SetMavenCmd {
    /// The `<server>` IDs to write, `artifactregistry-<project>-<repo>` unless
    /// overridden.
    pub fn repo_ids(&self, urls: &[RepoUrl]) -> Vec<String> {
        if self.repo_ids_override.is_empty() {
            urls.iter().map(RepoUrl::default_repo_id).collect()
        } else {
            self.repo_ids_override
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect()
        }
    }
}

#[async_trait]
impl CredCommand for SetMavenCmd {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let validated = self
            .common
            .validate(self.repo_ids_override.is_empty(), Vec::new())?;

        let path = maven_settings_path(self.maven_settings.as_deref())?;
        let repo_ids = self.repo_ids(&validated.urls);

        let (common, path, repo_ids) = (&self.common, &path, &repo_ids);
        refresh::run(validated.policy, tokio::signal::ctrl_c(), move || {
            update_once(ctx, common, repo_ids, move || MavenSettings::open(path))
        })
        .await
    }
}
