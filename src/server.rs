use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api_client::WarMode;
use crate::pipeline::UpdatePipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<UpdatePipeline>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateQuery {
    pub mode: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/update", get(manual_update))
        .with_state(state)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("🚀 Server running at http://{}", addr);
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn home() -> &'static str {
    "🔥 Clan war reporter is running!"
}

async fn manual_update(
    State(state): State<AppState>,
    Query(query): Query<UpdateQuery>,
) -> (StatusCode, String) {
    let requested = query
        .mode
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "normal".to_string());
    let label = requested.trim().to_uppercase();
    let mode = WarMode::parse(&requested);

    match state.pipeline.run(mode).await {
        Ok(_) => (
            StatusCode::OK,
            format!("✅ {label} War Report Updated in Google Sheet!"),
        ),
        Err(e) => {
            error!("❌ Error updating {} war report: {}", label, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("❌ Failed to update {label} war data."),
            )
        }
    }
}
