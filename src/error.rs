use thiserror::Error;

/// Errors raised while loading the configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment or your .env file")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors raised while decoding the base64 service-account bundle.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential bundle is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("credential bundle is not valid service-account JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every failure a pipeline run can end with.
#[derive(Debug, Error)]
pub enum Error {
    #[error("war data request failed: {0}")]
    Fetch(#[source] reqwest::Error),
    #[error("{0} cannot be used as an API base URL")]
    InvalidBaseUrl(String),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error("spreadsheet authentication failed: {0}")]
    Auth(String),
    #[error("spreadsheet update failed: {0}")]
    Publish(#[source] reqwest::Error),
    #[error("spreadsheet API rejected the update with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
