//! `get`: the credential helper protocol used by tools such as the Go
//! module proxy client.
//!
//! The host comes from `--hosts`, or else from a `{"uri": "..."}` request on
//! stdin. The response is `{"headers":{"Authorization":["Bearer <token>"]}}`
//! written without a trailing newline.

use crate::error::{Error, Result};
use crate::repo::{host_from_uri, validate_hosts};
use async_trait::async_trait;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use super::{CommandContext, CredCommand};

#[derive(Debug, Clone, Default, Args)]
pub struct GetCmd {
    /// Hosts to get the credential for. Must have domain '.pkg.dev'.
    #[arg(long, env = "AR_CRED_HELPER_HOSTS", value_delimiter = ',', value_name = "HOSTS")]
    pub hosts: Vec<String>,

    /// Read the access token from this environment variable.
    #[arg(long, env = "AR_CRED_HELPER_ACCESS_TOKEN_FROM_ENV", value_name = "VAR")]
    pub access_token_from_env: Option<String>,
}

/// Request read from stdin when no hosts are passed as flags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetCredentialsRequest {
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetCredentialsResponse {
    pub headers: BTreeMap<String, Vec<String>>,
}

impl GetCredentialsResponse {
    pub fn bearer(token: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), vec![format!("Bearer {token}")]);
        GetCredentialsResponse { headers }
    }
}

impl GetCmd {
    /// Hosts from the flags, or the host of the request on `stdin`.
    pub fn resolve_hosts<R: Read>(&self, stdin: R) -> Result<Vec<String>> {
        if !self.hosts.is_empty() {
            return Ok(self.hosts.iter().map(|h| host_from_uri(h)).collect());
        }
        let request: GetCredentialsRequest =
            serde_json::from_reader(stdin).map_err(Error::InvalidRequest)?;
        Ok(vec![host_from_uri(&request.uri)])
    }

    /// Answer one request, reading from `stdin` and writing to `stdout`.
    pub async fn run<R, W>(&self, ctx: &CommandContext, stdin: R, mut stdout: W) -> Result<()>
    where
        R: Read + Send,
        W: Write + Send,
    {
        let hosts = self.resolve_hosts(stdin)?;
        validate_hosts(&hosts)?;

        let token_env = self.access_token_from_env.as_deref().filter(|v| !v.is_empty());
        let token = ctx.token(token_env).await?;
        tracing::debug!(hosts = %hosts.join(","), "issuing bearer token");

        let body = serde_json::to_string(&GetCredentialsResponse::bearer(&token))?;
        stdout.write_all(body.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

#[async_trait]
impl CredCommand for GetCmd {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        self.run(ctx, std::io::stdin(), std::io::stdout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json() {
        let body = serde_json::to_string(&GetCredentialsResponse::bearer("tok")).unwrap();
        assert_eq!(body, r#"{"headers":{"Authorization":["Bearer tok"]}}"#);
    }

    #[test]
    fn test_hosts_from_flags_win_over_stdin() {
        let cmd = GetCmd {
            hosts: vec!["us-go.pkg.dev".to_string()],
            ..GetCmd::default()
        };
        let hosts = cmd.resolve_hosts(&b"not json"[..]).unwrap();
        assert_eq!(hosts, vec!["us-go.pkg.dev"]);
    }

    #[test]
    fn test_hosts_from_request_uri() {
        let hosts = GetCmd::default()
            .resolve_hosts(&br#"{"uri":"https://us-go.pkg.dev/p/r/@v/list"}"#[..])
            .unwrap();
        assert_eq!(hosts, vec!["us-go.pkg.dev"]);
    }

    #[test]
    fn test_malformed_request() {
        let err = GetCmd::default().resolve_hosts(&b"{"[..]).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
