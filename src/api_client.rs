use std::fmt;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::ACCEPT;
use tracing::info;

use crate::api_models::WarReport;
use crate::config::Config;
use crate::error::Error;
use crate::pipeline::WarSource;

/// Which war endpoint to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WarMode {
    /// Clan War League group.
    Cwl,
    /// A regular or friendly war.
    #[default]
    Normal,
}

impl WarMode {
    /// Parses a mode string case-insensitively.
    ///
    /// Only `"cwl"` selects the league endpoint; anything else, including
    /// `"friendly"` and unrecognized input, is a normal war.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("cwl") {
            WarMode::Cwl
        } else {
            WarMode::Normal
        }
    }
}

impl fmt::Display for WarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarMode::Cwl => f.write_str("CWL"),
            WarMode::Normal => f.write_str("NORMAL"),
        }
    }
}

/// Builds the war endpoint for `clan_tag` under `base_url`.
///
/// The tag is pushed as a path segment, so its leading '#' is sent as `%23`.
pub fn war_url(base_url: &str, clan_tag: &str, mode: WarMode) -> Result<Url, Error> {
    let mut url = Url::parse(base_url).map_err(|_| Error::InvalidBaseUrl(base_url.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::InvalidBaseUrl(base_url.to_string()))?;
        segments.pop_if_empty().extend(["clans", clan_tag, "currentwar"]);
        if mode == WarMode::Cwl {
            segments.push("leaguegroup");
        }
    }
    Ok(url)
}

/// Fetches the current war for a clan from the Clash of Clans API.
///
/// # Arguments
///
/// * `client` - A shared reference to a `reqwest::Client`.
/// * `api_token` - The API token for authorization.
/// * `url` - The endpoint built by [`war_url`].
///
/// # Returns
///
/// The decoded `WarReport`, or `Error::Fetch` on transport failure, a
/// non-success status, or an undecodable body.
pub async fn fetch_war(
    client: &reqwest::Client,
    api_token: &str,
    url: Url,
) -> Result<WarReport, Error> {
    let response = client
        .get(url)
        .bearer_auth(api_token)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(Error::Fetch)?;

    let response = response.error_for_status().map_err(Error::Fetch)?;

    response.json::<WarReport>().await.map_err(Error::Fetch)
}

/// War source backed by the live Clash of Clans API.
#[derive(Clone)]
pub struct CocClient {
    http: reqwest::Client,
    base_url: String,
    clan_tag: String,
    api_token: String,
}

impl CocClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.coc_api_base_url.clone(),
            clan_tag: config.clan_tag.clone(),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl WarSource for CocClient {
    async fn fetch(&self, mode: WarMode) -> Result<WarReport, Error> {
        let url = war_url(&self.base_url, &self.clan_tag, mode)?;
        info!("📡 Fetching {} war from: {}", mode, url);
        fetch_war(&self.http, &self.api_token, url).await
    }
}
