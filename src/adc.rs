//! Application Default Credentials files.
//!
//! Each `type` of credentials file has its own way of turning into an access
//! token, but all of them end in an OAuth token endpoint.

use crate::error::{Error, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default endpoint for refresh-token and JWT-bearer grants.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scope requested for every token.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";

/// Lifetime of signed assertions and impersonated tokens, in seconds.
const TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
}

/// A parsed ADC file, keyed by its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CredentialsFile {
    AuthorizedUser(AuthorizedUser),
    ServiceAccount(ServiceAccountKey),
    ImpersonatedServiceAccount(ImpersonatedServiceAccount),
    ExternalAccount(ExternalAccount),
}

impl CredentialsFile {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CredentialsFile::AuthorizedUser(_) => "authorized_user",
            CredentialsFile::ServiceAccount(_) => "service_account",
            CredentialsFile::ImpersonatedServiceAccount(_) => "impersonated_service_account",
            CredentialsFile::ExternalAccount(_) => "external_account",
        }
    }

    pub(crate) async fn token(&self, client: &reqwest::Client) -> Result<String> {
        match self {
            CredentialsFile::AuthorizedUser(creds) => creds.token(client).await,
            CredentialsFile::ServiceAccount(key) => key.token(client).await,
            CredentialsFile::ImpersonatedServiceAccount(creds) => creds.token(client).await,
            CredentialsFile::ExternalAccount(creds) => creds.token(client).await,
        }
    }
}

/// Credentials of a user who ran `gcloud auth application-default login`.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthorizedUser {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl AuthorizedUser {
    async fn token(&self, client: &reqwest::Client) -> Result<String> {
        let token_uri = self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        tracing::debug!(%token_uri, "refreshing authorized_user credentials");
        post_form(
            client,
            token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
            ],
        )
        .await
    }
}

/// A downloaded service account key.
#[derive(Debug, Deserialize)]
pub(crate) struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub(crate) iss: String,
    pub(crate) scope: String,
    pub(crate) aud: String,
    pub(crate) iat: u64,
    pub(crate) exp: u64,
}

impl ServiceAccountKey {
    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// A signed JWT asserting this account's identity, issued at `now`.
    pub(crate) fn assertion(&self, now: u64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|e| {
            Error::Adc(format!("invalid private key for {}: {}", self.client_email, e))
        })?;
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            aud: self.token_uri().to_string(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| Error::Adc(format!("failed to sign assertion: {}", e)))
    }

    async fn token(&self, client: &reqwest::Client) -> Result<String> {
        let assertion = self.assertion(unix_now())?;
        tracing::debug!(account = %self.client_email, token_uri = %self.token_uri(), "exchanging service account assertion");
        post_form(
            client,
            self.token_uri(),
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
        )
        .await
    }
}

/// Credentials that act as another service account.
#[derive(Debug, Deserialize)]
pub(crate) struct ImpersonatedServiceAccount {
    service_account_impersonation_url: String,
    source_credentials: SourceCredentials,
    #[serde(default)]
    delegates: Vec<String>,
}

/// What an impersonated account authenticates with first.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum SourceCredentials {
    AuthorizedUser(AuthorizedUser),
    ServiceAccount(ServiceAccountKey),
}

impl ImpersonatedServiceAccount {
    async fn token(&self, client: &reqwest::Client) -> Result<String> {
        let source = match &self.source_credentials {
            SourceCredentials::AuthorizedUser(creds) => creds.token(client).await?,
            SourceCredentials::ServiceAccount(key) => key.token(client).await?,
        };
        impersonate(
            client,
            &self.service_account_impersonation_url,
            &source,
            &self.delegates,
        )
        .await
    }
}

/// Workload or workforce identity federation.
#[derive(Debug, Deserialize)]
pub(crate) struct ExternalAccount {
    audience: String,
    subject_token_type: String,
    token_url: String,
    #[serde(default)]
    service_account_impersonation_url: Option<String>,
    credential_source: CredentialSource,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialSource {
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    format: Option<SubjectTokenFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum SubjectTokenFormat {
    Text,
    Json { subject_token_field_name: String },
}

impl ExternalAccount {
    async fn subject_token(&self, client: &reqwest::Client) -> Result<String> {
        let source = &self.credential_source;
        let raw = if let Some(path) = &source.file {
            std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
                path: path.clone(),
                source: e,
            })?
        } else if let Some(url) = &source.url {
            let mut request = client.get(url);
            for (name, value) in &source.headers {
                request = request.header(name, value);
            }
            request.send().await?.error_for_status()?.text().await?
        } else {
            return Err(Error::Adc(
                "external_account credential source must name a file or url".to_string(),
            ));
        };

        match &source.format {
            None | Some(SubjectTokenFormat::Text) => Ok(raw.trim().to_string()),
            Some(SubjectTokenFormat::Json {
                subject_token_field_name,
            }) => {
                let value: serde_json::Value = serde_json::from_str(&raw)?;
                value
                    .get(subject_token_field_name)
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::Adc(format!(
                            "subject token field \"{}\" is missing",
                            subject_token_field_name
                        ))
                    })
            }
        }
    }

    async fn token(&self, client: &reqwest::Client) -> Result<String> {
        let subject_token = self.subject_token(client).await?;
        tracing::debug!(token_url = %self.token_url, "exchanging external subject token");
        let federated = post_form(
            client,
            &self.token_url,
            &[
                ("grant_type", TOKEN_EXCHANGE_GRANT),
                ("audience", self.audience.as_str()),
                ("scope", CLOUD_PLATFORM_SCOPE),
                ("requested_token_type", ACCESS_TOKEN_TYPE),
                ("subject_token", subject_token.as_str()),
                ("subject_token_type", self.subject_token_type.as_str()),
            ],
        )
        .await?;

        match &self.service_account_impersonation_url {
            Some(url) => impersonate(client, url, &federated, &[]).await,
            None => Ok(federated),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenRequest<'a> {
    delegates: &'a [String],
    scope: [&'a str; 1],
    lifetime: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    access_token: String,
}

/// IAM `generateAccessToken`, authenticated with `source_token`.
async fn impersonate(
    client: &reqwest::Client,
    url: &str,
    source_token: &str,
    delegates: &[String],
) -> Result<String> {
    tracing::debug!(%url, "impersonating service account");
    let request = GenerateAccessTokenRequest {
        delegates,
        scope: [CLOUD_PLATFORM_SCOPE],
        lifetime: format!("{}s", TOKEN_LIFETIME_SECS),
    };
    let response: GenerateAccessTokenResponse = client
        .post(url)
        .bearer_auth(source_token)
        .json(&request)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(response.access_token)
}

async fn post_form(client: &reqwest::Client, url: &str, form: &[(&str, &str)]) -> Result<String> {
    let response: TokenResponse = client
        .post(url)
        .form(form)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(response.access_token)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
