use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::api_client::WarMode;
use crate::error::ConfigError;
use crate::scheduler::ScheduledJob;

pub const DEFAULT_CLAN_TAG: &str = "#PQJJQ2PG";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_COC_API_BASE_URL: &str = "https://api.clashofclans.com/v1";
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_HOME_RANGE: &str = "Our Clan War Report!A1";
pub const DEFAULT_OPPONENT_RANGE: &str = "Opponent Clan War Report!A1";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Holds the application's configuration values.
///
/// Built once at startup and shared read-only by every component.
#[derive(Clone)]
pub struct Config {
    pub clan_tag: String,
    pub api_token: String,
    pub spreadsheet_id: String,
    pub google_creds_b64: String,
    pub port: u16,
    pub coc_api_base_url: String,
    pub sheets_api_base_url: String,
    pub home_range: String,
    pub opponent_range: String,
    /// Destination of the war summary table. The summary is skipped when unset.
    pub summary_range: Option<String>,
    pub refresh_interval: Duration,
    pub scheduled_job: ScheduledJob,
    pub scheduled_mode: WarMode,
    pub log_level: Level,
}

impl Config {
    /// Creates a new Config instance by loading values from environment variables.
    ///
    /// Variables from a `.env` file in the working directory are loaded first,
    /// if the file exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        // .ok() silently ignores errors, which is fine if the file doesn't exist.
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let refresh_secs: u64 = parse_or(
            "REFRESH_INTERVAL_SECS",
            get("REFRESH_INTERVAL_SECS"),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        if refresh_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REFRESH_INTERVAL_SECS",
                value: refresh_secs.to_string(),
                reason: "interval must be at least one second".to_string(),
            });
        }

        Ok(Config {
            clan_tag: get("CLAN_TAG").unwrap_or_else(|| DEFAULT_CLAN_TAG.to_string()),
            api_token: require("COC_API_TOKEN")?,
            spreadsheet_id: require("SPREADSHEET_ID")?,
            google_creds_b64: require("GOOGLE_CREDS_B64")?,
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            coc_api_base_url: get("COC_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COC_API_BASE_URL.to_string()),
            sheets_api_base_url: get("SHEETS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE_URL.to_string()),
            home_range: get("HOME_RANGE").unwrap_or_else(|| DEFAULT_HOME_RANGE.to_string()),
            opponent_range: get("OPPONENT_RANGE")
                .unwrap_or_else(|| DEFAULT_OPPONENT_RANGE.to_string()),
            summary_range: get("SUMMARY_RANGE"),
            refresh_interval: Duration::from_secs(refresh_secs),
            scheduled_job: parse_or("SCHEDULED_JOB", get("SCHEDULED_JOB"), ScheduledJob::Update)?,
            // Mode parsing is total: unknown values fall back to a normal war.
            scheduled_mode: get("SCHEDULED_MODE")
                .map(|value| WarMode::parse(&value))
                .unwrap_or_default(),
            log_level: parse_or("LOG_LEVEL", get("LOG_LEVEL"), Level::INFO)?,
        })
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("clan_tag", &self.clan_tag)
            .field("api_token", &"<redacted>")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("google_creds_b64", &"<redacted>")
            .field("port", &self.port)
            .field("coc_api_base_url", &self.coc_api_base_url)
            .field("sheets_api_base_url", &self.sheets_api_base_url)
            .field("home_range", &self.home_range)
            .field("opponent_range", &self.opponent_range)
            .field("summary_range", &self.summary_range)
            .field("refresh_interval", &self.refresh_interval)
            .field("scheduled_job", &self.scheduled_job)
            .field("scheduled_mode", &self.scheduled_mode)
            .field("log_level", &self.log_level)
            .finish()
    }
}
