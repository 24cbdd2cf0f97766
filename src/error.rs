//! Error types for ar-cred-helper.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while issuing credentials or updating config files.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more arguments failed validation. Every problem found is
    /// reported, not just the first.
    #[error("{}", .0.join("\n"))]
    Invalid(Vec<String>),

    /// Failed to read a config or key file.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a config file.
    #[error("failed to save {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the directory holding a config file.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The home directory is needed for a default path but is unknown.
    #[error("cannot determine the home directory")]
    HomeDirUnavailable,

    /// An existing Maven settings file could not be understood.
    #[error("cannot load Maven settings file at {path}: {message}")]
    MalformedXml { path: PathBuf, message: String },

    /// A duration flag could not be parsed.
    #[error("invalid duration '{0}': expected values like 90s, 5m, 12h or 1h30m")]
    InvalidDuration(String),

    /// The credential helper request on stdin was not valid JSON.
    #[error("failed to parse request: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    /// The environment variable expected to carry an access token is unset or empty.
    #[error("failed to get access token from env var \"{0}\"")]
    EnvVarUnset(String),

    /// A service account key file could not be read.
    #[error("failed to encode JSON key {path}: {source}")]
    JsonKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Application Default Credentials could not produce a token.
    #[error("application default credentials: {0}")]
    Adc(String),

    /// `gcloud auth print-access-token` failed.
    #[error("gcloud: {0}")]
    Gcloud(String),

    /// Neither ADC nor gcloud produced a token.
    #[error("failed to find Application Default Credentials: {adc} and gcloud credentials: {gcloud}")]
    TokenUnavailable { adc: String, gcloud: String },

    /// HTTP failure while talking to a token endpoint.
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Other I/O failure (stdin, stdout, child processes).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::Invalid`] holding a single problem.
    pub fn invalid(problem: impl Into<String>) -> Self {
        Error::Invalid(vec![problem.into()])
    }

    /// Flatten into validation messages so several checks can be reported
    /// together.
    pub fn into_problems(self) -> Vec<String> {
        match self {
            Error::Invalid(problems) => problems,
            other => vec![other.to_string()],
        }
    }
}

/// Result type alias for ar-cred-helper operations.
pub type Result<T> = std::result::Result<T, Error>;
