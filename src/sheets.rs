use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, prelude::BASE64_STANDARD};
use reqwest::Url;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{error, info};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::config::Config;
use crate::error::{CredentialError, Error};
use crate::pipeline::{ReportBatch, ReportSink};
use crate::report::ReportTable;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Values are stored as given, never parsed as formulas.
const VALUE_INPUT_OPTION: &str = "RAW";

/// Decodes the base64 service-account bundle.
///
/// Literal `\n` sequences in the private key (common when the JSON was
/// pasted through a single-line environment variable) become real newlines.
pub fn decode_credentials(encoded: &str) -> Result<ServiceAccountKey, CredentialError> {
    let raw = BASE64_STANDARD.decode(encoded.trim())?;
    let mut key: ServiceAccountKey = serde_json::from_slice(&raw)?;
    key.private_key = key.private_key.replace("\\n", "\n");
    Ok(key)
}

/// Supplies bearer tokens for the Sheets API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, Error>;
}

/// Mints tokens with the OAuth2 service-account flow.
///
/// The authenticator is built on first use and then reused, so tokens are
/// cached until they expire.
pub struct ServiceAccountTokens {
    encoded_credentials: String,
    authenticator: OnceCell<DefaultAuthenticator>,
}

impl ServiceAccountTokens {
    pub fn new(encoded_credentials: impl Into<String>) -> Self {
        Self {
            encoded_credentials: encoded_credentials.into(),
            authenticator: OnceCell::new(),
        }
    }

    async fn authenticator(&self) -> Result<&DefaultAuthenticator, Error> {
        self.authenticator
            .get_or_try_init(|| async {
                let key = decode_credentials(&self.encoded_credentials)?;
                info!("🔐 Authenticating to Google Sheets as {}", key.client_email);
                ServiceAccountAuthenticator::builder(key)
                    .build()
                    .await
                    .map_err(|e| Error::Auth(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, Error> {
        let token = self
            .authenticator()
            .await?
            .token(&[SHEETS_SCOPE])
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| Error::Auth("token endpoint returned no access token".to_string()))
    }
}

/// Destination ranges inside the spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetRanges {
    pub home: String,
    pub opponent: String,
    pub summary: Option<String>,
}

impl SheetRanges {
    pub fn from_config(config: &Config) -> Self {
        Self {
            home: config.home_range.clone(),
            opponent: config.opponent_range.clone(),
            summary: config.summary_range.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest<'a> {
    pub value_input_option: &'static str,
    pub data: Vec<ValueRange<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange<'a> {
    pub range: &'a str,
    pub major_dimension: &'static str,
    pub values: &'a ReportTable,
}

/// Builds the single batch request that overwrites every range of a run.
///
/// A summary table is only written when both the batch carries one and a
/// summary range is configured.
pub fn batch_request<'a>(
    ranges: &'a SheetRanges,
    batch: &'a ReportBatch,
) -> BatchUpdateValuesRequest<'a> {
    let value_range = |range: &'a str, values: &'a ReportTable| ValueRange {
        range,
        major_dimension: "ROWS",
        values,
    };

    let mut data = vec![
        value_range(&ranges.home, &batch.home),
        value_range(&ranges.opponent, &batch.opponent),
    ];
    if let (Some(range), Some(summary)) = (&ranges.summary, &batch.summary) {
        data.push(value_range(range, summary));
    }

    BatchUpdateValuesRequest {
        value_input_option: VALUE_INPUT_OPTION,
        data,
    }
}

/// Writes report batches into one Google spreadsheet.
pub struct SheetsPublisher {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    ranges: SheetRanges,
    tokens: Arc<dyn TokenSource>,
}

impl SheetsPublisher {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        ranges: SheetRanges,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            ranges,
            tokens,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(
            http,
            config.sheets_api_base_url.as_str(),
            config.spreadsheet_id.as_str(),
            SheetRanges::from_config(config),
            Arc::new(ServiceAccountTokens::new(config.google_creds_b64.as_str())),
        )
    }

    fn batch_update_url(&self) -> Result<Url, Error> {
        let invalid = || Error::InvalidBaseUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values:batchUpdate"]);
        Ok(url)
    }
}

#[async_trait]
impl ReportSink for SheetsPublisher {
    async fn publish(&self, batch: &ReportBatch) -> Result<(), Error> {
        let url = self.batch_update_url()?;
        let token = self.tokens.access_token().await?;
        let body = batch_request(&self.ranges, batch);

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(Error::Publish)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Sheets API returned {}: {}", status, body);
            return Err(Error::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            "📝 Google Sheet updated: {} ({} ranges)",
            self.spreadsheet_id,
            body.data.len()
        );
        Ok(())
    }
}
