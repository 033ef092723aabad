use axum::{Json, extract::State};
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use crate::error::AppError;
use crate::metrics::{REQUEST_TOTAL, UPSTREAM_LATENCY};
use crate::models::LoginRequest;
use crate::rate_limit::login_key;
use crate::state::AppState;
use super::upstream_body;

// Sign-in: throttle per email, forward to the backend, clear the counter on success
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    REQUEST_TOTAL.inc();

    let key = login_key(&payload.email)?;
    let decision = state.limiter.check_limit(&key, &state.login_policy)?;
    if !decision.allowed {
        return Err(AppError::RateLimited(decision));
    }

    let start_time = Instant::now();
    let res = state
        .client
        .post(format!("{}/auth/login", state.upstream_url))
        .json(&payload)
        .send()
        .await?;
    UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

    let status = res.status();
    if status.is_success() {
        // the sign-in happened whatever the body looks like
        state.limiter.reset(&key);
        tracing::info!(key = %key, "Sign-in succeeded, attempts cleared");
        return Ok(Json(upstream_body(res).await));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::info!(key = %key, remaining = decision.remaining_attempts, "Sign-in rejected by backend");
        return Err(AppError::InvalidCredentials {
            remaining_attempts: decision.remaining_attempts,
        });
    }

    Err(AppError::UpstreamStatus(status))
}
