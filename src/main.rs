use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use clan_war_reporter::api_client::CocClient;
use clan_war_reporter::config::Config;
use clan_war_reporter::pipeline::UpdatePipeline;
use clan_war_reporter::scheduler;
use clan_war_reporter::server::{self, AppState};
use clan_war_reporter::sheets::SheetsPublisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize Logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 Starting clan war reporter for {}...", config.clan_tag);

    // --- Initialize clients ---
    let http_client = reqwest::Client::new();
    let source = Arc::new(CocClient::new(http_client.clone(), &config));
    let sink = Arc::new(SheetsPublisher::from_config(http_client, &config));
    let pipeline = Arc::new(UpdatePipeline::new(
        source,
        sink,
        config.summary_range.is_some(),
    ));

    info!("✅ Configuration and clients initialized successfully.");

    // --- Recurring trigger ---
    let schedule = scheduler::spawn(
        config.scheduled_job,
        config.refresh_interval,
        pipeline.clone(),
        config.scheduled_mode,
        config.google_creds_b64.clone(),
    );

    // --- Manual trigger ---
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    server::serve(listener, AppState { pipeline }, async {
        tokio::signal::ctrl_c().await.ok();
        info!("🏁 Shutdown requested.");
    })
    .await?;

    schedule.abort();
    Ok(())
}
