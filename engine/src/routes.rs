use axum::{
    extract::State,
    response::{Html, Json},
    routing::{get, post},
    Form, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::{sync::Arc, time::Instant};
use tracing::{error, info, warn};

use crate::{
    engine::Detector,
    error::AppError,
    page::{self, Outcome},
    types::{DetectRequest, Detection},
};

pub type AppState = Arc<AppContext>;

/// Process-wide, read-only state built once at startup.
pub struct AppContext {
    pub detector: Detector,
    pub metrics: Option<PrometheusHandle>,
}

impl AppContext {
    fn run(&self, input: &str) -> Result<Detection, AppError> {
        let start = Instant::now();
        let result = self.detector.detect(input);

        match &result {
            Ok(d) => {
                metrics::counter!("detections_total", "verdict" => d.verdict.as_str()).increment(1);
            }
            Err(AppError::InvalidInput(msg)) => {
                info!("Rejected submission: {}", msg);
                metrics::counter!("invalid_inputs_total").increment(1);
            }
            Err(e) => {
                error!("Detection failed for {:?}: {}", input, e);
                metrics::counter!("detection_errors_total").increment(1);
            }
        }

        metrics::histogram!("request_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);
        result
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/detect", post(detect_api))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(page::render(None, None))
}

async fn submit(State(state): State<AppState>, Form(request): Form<DetectRequest>) -> Html<String> {
    let outcome = match state.run(&request.url) {
        Ok(detection) => Outcome::Detected(detection),
        Err(AppError::InvalidInput(msg)) => Outcome::Warning(msg),
        Err(e) => Outcome::Failed(e.to_string()),
    };
    Html(page::render(Some(&request.url), Some(&outcome)))
}

async fn detect_api(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<Detection>, AppError> {
    let detection = state.run(&request.url)?;
    Ok(Json(detection))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.detector.model_kind(),
    }))
}

async fn metrics_text(State(state): State<AppState>) -> String {
    match &state.metrics {
        Some(handle) => handle.render(),
        None => {
            warn!("Metrics requested but no recorder is installed");
            String::new()
        }
    }
}
