use crate::auth::Credential;
use crate::config::AuthConfig;
use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::refresh::{RefreshPolicy, DEFAULT_DURATION};
use crate::repo::{parse_repo_urls, RepoUrl};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::CommandContext;

/// Flags shared by every `set-*` command.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Repositories to write credentials for, in format '*.pkg.dev/[project]/[repo]'.
    #[arg(
        long = "repo-urls",
        env = "AR_CRED_HELPER_HOSTS",
        value_delimiter = ',',
        value_name = "URLS"
    )]
    pub repo_urls: Vec<String>,

    /// Read the access token from this environment variable instead of
    /// Application Default Credentials or gcloud.
    #[arg(long, env = "AR_CRED_HELPER_ACCESS_TOKEN_FROM_ENV", value_name = "VAR")]
    pub access_token_from_env: Option<String>,

    /// Write this service account key file instead of an access token.
    #[arg(long, env = "AR_CRED_HELPER_JSON_KEY", value_name = "PATH")]
    pub json_key: Option<PathBuf>,

    /// Keep refreshing on this interval (at least 2m). 0 disables refreshing.
    #[arg(
        long,
        env = "AR_CRED_HELPER_BACKGROUND_REFRESH_INTERVAL",
        value_parser = parse_duration,
        value_name = "DURATION"
    )]
    pub background_refresh_interval: Option<Duration>,

    /// Stop refreshing after this long.
    #[arg(
        long,
        env = "AR_CRED_HELPER_BACKGROUND_REFRESH_DURATION",
        value_parser = parse_duration,
        default_value = "12h",
        value_name = "DURATION"
    )]
    pub background_refresh_duration: Duration,
}

impl Default for CommonArgs {
    fn default() -> Self {
        CommonArgs {
            repo_urls: Vec::new(),
            access_token_from_env: None,
            json_key: None,
            background_refresh_interval: None,
            background_refresh_duration: DEFAULT_DURATION,
        }
    }
}

/// Arguments that passed validation.
#[derive(Debug, Clone)]
pub struct Validated {
    pub urls: Vec<RepoUrl>,
    pub policy: RefreshPolicy,
}

impl CommonArgs {
    pub fn json_key(&self) -> Option<&Path> {
        self.json_key
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn token_env(&self) -> Option<&str> {
        self.access_token_from_env
            .as_deref()
            .filter(|v| !v.is_empty())
    }

    /// Check every flag, adding to the command's own `problems`.
    ///
    /// Fails with a single [`Error::Invalid`] listing everything wrong, so
    /// nothing is read or written unless all arguments are usable. Repo URLs
    /// are skipped entirely when `require_urls` is false.
    pub fn validate(&self, require_urls: bool, mut problems: Vec<String>) -> Result<Validated> {
        let policy = match RefreshPolicy::from_flags(
            self.background_refresh_interval,
            self.background_refresh_duration,
        ) {
            Ok(policy) => Some(policy),
            Err(e) => {
                problems.extend(e.into_problems());
                None
            }
        };

        if self.json_key().is_some() && self.token_env().is_some() {
            problems.push("only one of --json-key or --access-token-from-env can be set".to_string());
        }

        let mut urls = Vec::new();
        if require_urls {
            if self.repo_urls.is_empty() {
                problems.push("no host specified".to_string());
            } else {
                match parse_repo_urls(&self.repo_urls) {
                    Ok(parsed) => urls = parsed,
                    Err(e) => problems.extend(e.into_problems()),
                }
            }
        }

        match policy {
            Some(policy) if problems.is_empty() => Ok(Validated { urls, policy }),
            _ => Err(Error::Invalid(problems)),
        }
    }
}

/// Fetch a credential, then open, update and save one config document.
pub(crate) async fn update_once<C, O>(
    ctx: &CommandContext,
    args: &CommonArgs,
    targets: &[String],
    open: O,
) -> Result<()>
where
    C: AuthConfig,
    O: FnOnce() -> Result<C>,
{
    let credential = ctx.credential(args.json_key(), args.token_env()).await?;
    let mut config = open()?;
    config.apply(targets, &credential);
    config.save()?;
    log_update(config.path(), targets, &credential);
    Ok(())
}

pub(crate) fn log_update(path: &Path, targets: &[String], credential: &Credential) {
    tracing::info!(
        path = %path.display(),
        targets = %targets.join(","),
        login = credential.login(),
        "updated credentials"
    );
}
