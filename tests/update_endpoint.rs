mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use clan_war_reporter::api_client::WarMode;
use clan_war_reporter::api_models::WarReport;
use clan_war_reporter::error::Error;
use clan_war_reporter::pipeline::{ReportBatch, ReportSink, UpdatePipeline, WarSource};
use clan_war_reporter::report::Cell;
use clan_war_reporter::server::{AppState, build_router};
use tokio::sync::Mutex;

use crate::common::{WAR_JSON, spawn_stub};

/// Serves a fixed war document, optionally failing instead.
struct StubSource {
    report: Option<WarReport>,
    delay: Duration,
    modes: Mutex<Vec<WarMode>>,
}

impl StubSource {
    fn ok() -> Self {
        Self {
            report: Some(serde_json::from_str(WAR_JSON).expect("war fixture")),
            delay: Duration::ZERO,
            modes: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            report: None,
            ..Self::ok()
        }
    }
}

#[async_trait]
impl WarSource for StubSource {
    async fn fetch(&self, mode: WarMode) -> Result<WarReport, Error> {
        self.modes.lock().await.push(mode);
        tokio::time::sleep(self.delay).await;
        self.report
            .clone()
            .ok_or_else(|| Error::InvalidBaseUrl("upstream unavailable".to_string()))
    }
}

/// Records every publish as a start/end event pair.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<String>>,
    batches: Mutex<Vec<ReportBatch>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn publish(&self, batch: &ReportBatch) -> Result<(), Error> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.events.lock().await.push(format!("start {}", batch.mode));
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.events.lock().await.push(format!("end {}", batch.mode));
        self.batches.lock().await.push(batch.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn serve(source: StubSource, sink: Arc<RecordingSink>) -> String {
    let pipeline = Arc::new(UpdatePipeline::new(Arc::new(source), sink, false));
    let addr = spawn_stub(build_router(AppState { pipeline })).await;
    format!("http://{addr}")
}

#[tokio::test]
async fn health_route_responds() {
    let base = serve(StubSource::ok(), Arc::default()).await;
    let response = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.text().await.unwrap().contains("running"));
}

#[tokio::test]
async fn update_publishes_and_names_the_mode() {
    let sink = Arc::new(RecordingSink::default());
    let base = serve(StubSource::ok(), sink.clone()).await;

    let response = reqwest::get(format!("{base}/update?mode=normal")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.text().await.unwrap().contains("NORMAL"));

    let batches = sink.batches.lock().await;
    assert_eq!(batches.len(), 1);
    let home = &batches[0].home;
    assert_eq!(home.len(), 3);
    // #A attacked twice: 2 + 3 stars, 55.5 + 100 destruction.
    assert_eq!(home.rows[1][4], Cell::Integer(5));
    assert_eq!(home.rows[1][5], Cell::text("155.5"));
    // #C never attacked: zero totals and six blank attack cells.
    let idle = &home.rows[2];
    assert_eq!(idle[0], Cell::text("#C"));
    assert_eq!(idle[4], Cell::Integer(0));
    assert_eq!(idle[5], Cell::text("0.0"));
    assert!(idle[6..].iter().all(|c| *c == Cell::empty()));
    assert_eq!(batches[0].opponent.rows[1][0], Cell::text("#B"));
}

#[tokio::test]
async fn mode_defaults_to_normal_and_is_case_insensitive() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Arc::new(UpdatePipeline::new(
        Arc::new(StubSource::ok()),
        sink.clone(),
        false,
    ));
    let addr = spawn_stub(build_router(AppState {
        pipeline: pipeline.clone(),
    }))
    .await;

    let plain = reqwest::get(format!("http://{addr}/update")).await.unwrap();
    assert!(plain.text().await.unwrap().contains("NORMAL"));

    let cwl = reqwest::get(format!("http://{addr}/update?mode=CwL")).await.unwrap();
    assert!(cwl.text().await.unwrap().contains("CWL"));

    let friendly = reqwest::get(format!("http://{addr}/update?mode=friendly"))
        .await
        .unwrap();
    assert!(friendly.text().await.unwrap().contains("FRIENDLY"));

    let modes: Vec<WarMode> = sink.batches.lock().await.iter().map(|b| b.mode).collect();
    assert_eq!(modes, vec![WarMode::Normal, WarMode::Cwl, WarMode::Normal]);
}

#[tokio::test]
async fn failed_fetch_returns_500_without_publishing() {
    let sink = Arc::new(RecordingSink::default());
    let base = serve(StubSource::failing(), sink.clone()).await;

    let response = reqwest::get(format!("{base}/update?mode=normal")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text().await.unwrap(),
        "❌ Failed to update NORMAL war data."
    );
    assert!(sink.events.lock().await.is_empty());
}

#[tokio::test]
async fn overlapping_updates_are_serialized() {
    let sink = Arc::new(RecordingSink::default());
    let source = StubSource {
        delay: Duration::from_millis(20),
        ..StubSource::ok()
    };
    let base = serve(source, sink.clone()).await;

    let requests = ["normal", "cwl", "normal", "cwl"]
        .into_iter()
        .map(|mode| reqwest::get(format!("{base}/update?mode={mode}")));
    for response in futures::future::join_all(requests).await {
        assert_eq!(response.unwrap().status(), reqwest::StatusCode::OK);
    }

    assert_eq!(sink.max_in_flight.load(Ordering::SeqCst), 1);
    let events = sink.events.lock().await;
    assert_eq!(events.len(), 8);
    for pair in events.chunks(2) {
        let started = pair[0].trim_start_matches("start ");
        assert_eq!(pair[1], format!("end {started}"));
    }
}
