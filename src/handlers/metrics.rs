use axum::extract::State;
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::TRACKED_KEYS;
use crate::state::AppState;

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, AppError> {
    // read at scrape time so the gauge never lags check/reset
    TRACKED_KEYS.set(state.limiter.len() as f64);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
