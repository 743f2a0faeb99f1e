use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api_client::WarMode;
use crate::api_models::{SideSelector, WarReport};
use crate::error::Error;
use crate::report::{self, ReportTable};

/// Anything that can produce the current war document.
#[async_trait]
pub trait WarSource: Send + Sync {
    async fn fetch(&self, mode: WarMode) -> Result<WarReport, Error>;
}

/// Anything that can store a formatted report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, batch: &ReportBatch) -> Result<(), Error>;
}

/// Every table produced by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBatch {
    pub mode: WarMode,
    pub home: ReportTable,
    pub opponent: ReportTable,
    pub summary: Option<ReportTable>,
}

impl ReportBatch {
    /// Formats both rosters, plus the summary when `with_summary` is set.
    pub fn from_report(war: &WarReport, mode: WarMode, with_summary: bool) -> Self {
        Self {
            mode,
            home: report::format_side(war, SideSelector::Clan),
            opponent: report::format_side(war, SideSelector::Opponent),
            summary: with_summary.then(|| report::format_summary(war, Utc::now())),
        }
    }
}

/// Fetch, format and publish, one run at a time.
pub struct UpdatePipeline {
    source: Arc<dyn WarSource>,
    sink: Arc<dyn ReportSink>,
    with_summary: bool,
    // Held for a whole run so overlapping triggers cannot interleave their writes.
    run_lock: Mutex<()>,
}

impl UpdatePipeline {
    pub fn new(source: Arc<dyn WarSource>, sink: Arc<dyn ReportSink>, with_summary: bool) -> Self {
        Self {
            source,
            sink,
            with_summary,
            run_lock: Mutex::new(()),
        }
    }

    /// Runs one full update for `mode`.
    ///
    /// The sink is only reached once the fetch has succeeded.
    pub async fn run(&self, mode: WarMode) -> Result<ReportBatch, Error> {
        let _guard = self.run_lock.lock().await;

        let war = self.source.fetch(mode).await?;
        if war.clan.members.is_empty() && war.opponent.members.is_empty() {
            warn!("⚠️ {} war data has no members on either side", mode);
        }

        let batch = ReportBatch::from_report(&war, mode, self.with_summary);
        self.sink.publish(&batch).await?;

        info!(
            "✅ {} war report updated ({} home rows, {} opponent rows)",
            mode,
            batch.home.len() - 1,
            batch.opponent.len() - 1
        );
        Ok(batch)
    }
}
