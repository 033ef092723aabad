use axum::{Json, extract::{Path, State}};
use std::sync::Arc;
use crate::error::AppError;
use crate::models::{CheckLimitRequest, CheckLimitResponse, ResetResponse};
use crate::rate_limit::LimitPolicy;
use crate::state::AppState;

// Raw limiter access. Denials come back as 200 with allowed=false.
pub async fn check_limit_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckLimitRequest>,
) -> Result<Json<CheckLimitResponse>, AppError> {
    let policy = LimitPolicy::from_millis(req.max_attempts, req.window_ms, req.block_duration_ms)?;
    let decision = state.limiter.check_limit(&req.key, &policy)?;
    Ok(Json(decision.into()))
}

pub async fn reset_limit_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Json<ResetResponse> {
    let cleared = state.limiter.reset(&key);
    Json(ResetResponse { key, cleared })
}
