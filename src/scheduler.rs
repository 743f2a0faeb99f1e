use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::api_client::WarMode;
use crate::pipeline::UpdatePipeline;
use crate::sheets::decode_credentials;

/// What the recurring trigger does on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledJob {
    /// Run the full fetch, format and publish pipeline.
    Update,
    /// Only check that the credential bundle decodes, and log the outcome.
    ValidateCredentials,
}

#[derive(Debug)]
pub struct UnknownJob(String);

impl fmt::Display for UnknownJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scheduled job {:?}, expected \"update\" or \"validate\"", self.0)
    }
}

impl FromStr for ScheduledJob {
    type Err = UnknownJob;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "update" => Ok(ScheduledJob::Update),
            "validate" => Ok(ScheduledJob::ValidateCredentials),
            _ => Err(UnknownJob(s.to_string())),
        }
    }
}

/// Runs a single tick of the scheduled job.
///
/// Failures are logged and never stop the schedule.
pub async fn run_tick(
    job: ScheduledJob,
    pipeline: &UpdatePipeline,
    mode: WarMode,
    encoded_credentials: &str,
) -> bool {
    match job {
        ScheduledJob::Update => match pipeline.run(mode).await {
            Ok(_) => true,
            Err(e) => {
                error!("❌ Scheduled {} update failed: {}", mode, e);
                false
            }
        },
        ScheduledJob::ValidateCredentials => {
            info!("🔍 Credential bundle length: {}", encoded_credentials.len());
            match decode_credentials(encoded_credentials) {
                Ok(key) => {
                    info!("✅ Valid JSON credentials for {}", key.client_email);
                    true
                }
                Err(e) => {
                    error!("❌ Invalid credential bundle: {}", e);
                    false
                }
            }
        }
    }
}

/// Spawns the recurring trigger.
///
/// The first tick fires one `period` after startup. Ticks that fall behind
/// a slow run are skipped rather than bunched up.
pub fn spawn(
    job: ScheduledJob,
    period: Duration,
    pipeline: Arc<UpdatePipeline>,
    mode: WarMode,
    encoded_credentials: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("⏰ Scheduled {:?} job every {:?}", job, period);

        loop {
            ticker.tick().await;
            run_tick(job, &pipeline, mode, &encoded_credentials).await;
        }
    })
}
