//! OAuth access token sources.
//!
//! The default chain mirrors what Google client tools do: Application
//! Default Credentials first, then the token of the user logged into gcloud.

use crate::adc::{CredentialsFile, TokenResponse};
use crate::error::{Error, Result};
use crate::paths::{adc_well_known_path, find_gcloud};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::adc::{CLOUD_PLATFORM_SCOPE, DEFAULT_TOKEN_URI};

/// Default GCE metadata server.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const METADATA_TIMEOUT: Duration = Duration::from_secs(3);

/// Something that can produce an OAuth access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A token handed over by another process through an environment variable.
#[derive(Debug, Clone)]
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    pub fn new(var: impl Into<String>) -> Self {
        EnvTokenSource { var: var.into() }
    }
}

#[async_trait]
impl TokenSource for EnvTokenSource {
    async fn token(&self) -> Result<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::EnvVarUnset(self.var.clone()))
    }
}

/// Application Default Credentials.
///
/// Uses the file named by `GOOGLE_APPLICATION_CREDENTIALS`, or gcloud's
/// well-known ADC file when it exists. `authorized_user`, `service_account`,
/// `impersonated_service_account` and `external_account` files (file or URL
/// subject tokens) are exchanged for a `cloud-platform` access token. Without
/// a file, the GCE metadata server is asked for the default service account's
/// token.
#[derive(Debug, Clone)]
pub struct ApplicationDefault {
    client: reqwest::Client,
    credentials_file: Option<PathBuf>,
    metadata_url: String,
}

impl Default for ApplicationDefault {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationDefault {
    /// Discover ADC from the environment.
    pub fn new() -> Self {
        let credentials_file = std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| adc_well_known_path().filter(|p| p.is_file()));

        let metadata_url = std::env::var("GCE_METADATA_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .map(|h| format!("http://{}", h))
            .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string());

        ApplicationDefault {
            client: reqwest::Client::new(),
            credentials_file,
            metadata_url,
        }
    }

    /// Use this credentials file instead of discovering one.
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Ignore any credentials file and go straight to the metadata server.
    pub fn without_credentials_file(mut self) -> Self {
        self.credentials_file = None;
        self
    }

    /// Base URL of the metadata server.
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn from_file(&self, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: CredentialsFile = serde_json::from_str(&content).map_err(|e| {
            Error::Adc(format!("invalid credentials file {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), kind = file.kind(), "using credentials file");
        file.token(&self.client).await
    }

    async fn from_metadata_server(&self) -> Result<String> {
        let url = format!("{}{}", self.metadata_url, METADATA_TOKEN_PATH);
        tracing::debug!(%url, "requesting token from metadata server");
        let response: TokenResponse = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Adc(format!("metadata server unavailable: {}", e)))?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.access_token)
    }
}

#[async_trait]
impl TokenSource for ApplicationDefault {
    async fn token(&self) -> Result<String> {
        match &self.credentials_file {
            Some(path) => self.from_file(path).await,
            None => self.from_metadata_server().await,
        }
    }
}

/// `gcloud auth print-access-token`.
#[derive(Debug, Clone)]
pub struct GcloudCli {
    program: Option<PathBuf>,
}

impl Default for GcloudCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GcloudCli {
    /// Use the gcloud found on `PATH`.
    pub fn new() -> Self {
        GcloudCli {
            program: find_gcloud(),
        }
    }

    /// Use a specific gcloud executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        GcloudCli {
            program: Some(program.into()),
        }
    }
}

#[async_trait]
impl TokenSource for GcloudCli {
    async fn token(&self) -> Result<String> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| Error::Gcloud("gcloud not found on PATH".to_string()))?;

        let output = tokio::process::Command::new(program)
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| Error::Gcloud(format!("failed to run {}: {}", program.display(), e)))?;

        if !output.status.success() {
            return Err(Error::Gcloud(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(Error::Gcloud("printed an empty token".to_string()));
        }
        Ok(token)
    }
}

/// Application Default Credentials, falling back to gcloud.
pub struct GoogleTokenSource {
    primary: Box<dyn TokenSource>,
    fallback: Box<dyn TokenSource>,
}

impl Default for GoogleTokenSource {
    fn default() -> Self {
        Self::with_sources(ApplicationDefault::new(), GcloudCli::new())
    }
}

impl GoogleTokenSource {
    pub fn with_sources(
        primary: impl TokenSource + 'static,
        fallback: impl TokenSource + 'static,
    ) -> Self {
        GoogleTokenSource {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }
}

#[async_trait]
impl TokenSource for GoogleTokenSource {
    async fn token(&self) -> Result<String> {
        let adc_err = match self.primary.token().await {
            Ok(token) => return Ok(token),
            Err(e) => e,
        };
        tracing::debug!(error = %adc_err, "application default credentials unavailable, trying gcloud");

        self.fallback
            .token()
            .await
            .map_err(|gcloud_err| Error::TokenUnavailable {
                adc: adc_err.to_string(),
                gcloud: gcloud_err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl TokenSource for Fixed {
        async fn token(&self) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::Adc("no credentials".to_string()))
        }
    }

    #[tokio::test]
    async fn test_env_token_source() {
        std::env::set_var("AR_CRED_HELPER_TEST_TOKEN_A", "from-env");
        let token = EnvTokenSource::new("AR_CRED_HELPER_TEST_TOKEN_A").token().await.unwrap();
        assert_eq!(token, "from-env");
        std::env::remove_var("AR_CRED_HELPER_TEST_TOKEN_A");
    }

    #[tokio::test]
    async fn test_env_token_source_empty() {
        std::env::set_var("AR_CRED_HELPER_TEST_TOKEN_B", "");
        let err = EnvTokenSource::new("AR_CRED_HELPER_TEST_TOKEN_B").token().await.unwrap_err();
        assert!(matches!(err, Error::EnvVarUnset(ref v) if v == "AR_CRED_HELPER_TEST_TOKEN_B"));
        std::env::remove_var("AR_CRED_HELPER_TEST_TOKEN_B");
    }

    #[tokio::test]
    async fn test_google_source_prefers_primary() {
        let source = GoogleTokenSource::with_sources(Fixed(Some("adc")), Fixed(Some("gcloud")));
        assert_eq!(source.token().await.unwrap(), "adc");
    }

    #[tokio::test]
    async fn test_google_source_falls_back() {
        let source = GoogleTokenSource::with_sources(Fixed(None), Fixed(Some("gcloud")));
        assert_eq!(source.token().await.unwrap(), "gcloud");
    }

    #[tokio::test]
    async fn test_google_source_reports_both_failures() {
        let source = GoogleTokenSource::with_sources(Fixed(None), Fixed(None));
        let err = source.token().await.unwrap_err();
        assert!(matches!(err, Error::TokenUnavailable { .. }));
        assert!(err.to_string().contains("Application Default Credentials"));
    }

    #[tokio::test]
    async fn test_gcloud_missing_program() {
        let cli = GcloudCli { program: None };
        let err = cli.token().await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
