//! Command line surface.
//!
//! Each subcommand validates all of its arguments up front, performs one
//! update, and then optionally keeps refreshing in the background.

use crate::auth::{encode_json_key, Credential};
use crate::error::Result;
use crate::token::{EnvTokenSource, GoogleTokenSource, TokenSource};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

mod common;
mod get;
mod set_apt;
mod set_maven;
mod set_netrc;
mod set_npm;

pub use common::{CommonArgs, Validated};
pub use get::{GetCmd, GetCredentialsRequest, GetCredentialsResponse};
pub use set_apt::SetAptCmd;
pub use set_maven::SetMavenCmd;
pub use set_netrc::SetNetrcCmd;
pub use set_npm::SetNpmCmd;

/// Reads a service account key file and returns it base64-encoded.
pub type JsonKeyEncoder = fn(&Path) -> Result<String>;

/// Credential helper for Artifact Registry.
#[derive(Debug, Parser)]
#[command(name = "ar-cred-helper", version)]
pub struct Cli {
    /// Log more (-v for info, -vv for debug). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print an Authorization header for a registry host as JSON.
    Get(GetCmd),
    /// Write credentials to a .netrc file.
    SetNetrc(SetNetrcCmd),
    /// Write credentials to a Maven settings.xml file.
    SetMaven(SetMavenCmd),
    /// Write credentials to an apt auth.conf.d file.
    SetApt(SetAptCmd),
    /// Write credentials to an .npmrc file.
    SetNpm(SetNpmCmd),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get(_) => "get",
            Command::SetNetrc(_) => "set-netrc",
            Command::SetMaven(_) => "set-maven",
            Command::SetApt(_) => "set-apt",
            Command::SetNpm(_) => "set-npm",
        }
    }

    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        match self {
            Command::Get(cmd) => cmd.execute(ctx).await,
            Command::SetNetrc(cmd) => cmd.execute(ctx).await,
            Command::SetMaven(cmd) => cmd.execute(ctx).await,
            Command::SetApt(cmd) => cmd.execute(ctx).await,
            Command::SetNpm(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[async_trait]
pub trait CredCommand {
    async fn execute(self, ctx: &CommandContext) -> Result<()>;
}

/// Where commands get their secrets from.
#[derive(Clone)]
pub struct CommandContext {
    token_source: Arc<dyn TokenSource>,
    encode_json_key: JsonKeyEncoder,
}

impl Default for CommandContext {
    fn default() -> Self {
        CommandContext::new(Arc::new(GoogleTokenSource::default()), encode_json_key)
    }
}

impl CommandContext {
    pub fn new(token_source: Arc<dyn TokenSource>, encode_json_key: JsonKeyEncoder) -> Self {
        CommandContext {
            token_source,
            encode_json_key,
        }
    }

    /// Use `source` for tokens and the regular key file encoder.
    pub fn with_token_source(source: impl TokenSource + 'static) -> Self {
        CommandContext::new(Arc::new(source), encode_json_key)
    }

    /// An access token, read from `token_env` when given.
    pub async fn token(&self, token_env: Option<&str>) -> Result<String> {
        match token_env {
            Some(var) => EnvTokenSource::new(var).token().await,
            None => self.token_source.token().await,
        }
    }

    /// The secret to write: the key file when one is given, otherwise a token.
    pub async fn credential(
        &self,
        json_key: Option<&Path>,
        token_env: Option<&str>,
    ) -> Result<Credential> {
        if let Some(path) = json_key {
            return (self.encode_json_key)(path).map(Credential::JsonKey);
        }
        self.token(token_env).await.map(Credential::Token)
    }
}
