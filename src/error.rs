use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use crate::rate_limit::RateLimitDecision;

// Misuse of the limiter. Denials are not errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("rate limit key must not be empty")]
    EmptyKey,
    #[error("invalid rate limit policy: {0}")]
    InvalidPolicy(&'static str),
    #[error("{0} must not be blank")]
    BlankSubject(&'static str),
}

// Startup configuration that would leave the gateway broken
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("rate limited")]
    RateLimited(RateLimitDecision),

    #[error(transparent)]
    InvalidLimit(#[from] RateLimitError),

    #[error("invalid credentials")]
    InvalidCredentials { remaining_attempts: u32 },

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream answered with status {0}")]
    UpstreamStatus(StatusCode),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

fn error_body(code: &str, message: &str, details: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "details": details,
        }
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::RateLimited(decision) => {
                let body = error_body(
                    "E-RATE-LIMITED",
                    &decision.wait_message(),
                    serde_json::json!({
                        "resetIn": decision.reset_in.as_millis() as u64,
                        "blockedFor": decision.blocked_for.map(|d| d.as_millis() as u64),
                    }),
                );
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

                let retry_secs = decision.reset_in.as_millis().div_ceil(1000);
                if let Ok(val) = HeaderValue::from_str(&retry_secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, val);
                }
                response
            }
            AppError::InvalidLimit(e) => {
                let code = match &e {
                    RateLimitError::BlankSubject(_) => "E-BAD-REQUEST",
                    _ => "E-INVALID-LIMIT",
                };
                let body = error_body(code, &e.to_string(), serde_json::Value::Null);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::InvalidCredentials { remaining_attempts } => {
                let body = error_body(
                    "E-AUTH-FAILED",
                    "Invalid email or password",
                    serde_json::json!({ "remainingAttempts": remaining_attempts }),
                );
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "Upstream request failed");
                let body = error_body("E-UPSTREAM", "Backend unavailable", serde_json::Value::Null);
                (StatusCode::BAD_GATEWAY, Json(body)).into_response()
            }
            AppError::UpstreamStatus(status) => {
                tracing::warn!(status = %status, "Upstream rejected request");
                let body = error_body(
                    "E-UPSTREAM",
                    "Backend rejected the request",
                    serde_json::json!({ "status": status.as_u16() }),
                );
                (StatusCode::BAD_GATEWAY, Json(body)).into_response()
            }
            AppError::Metrics(e) => {
                tracing::error!(error = %e, "Metrics encoding failed");
                let body = error_body("E-INTERNAL", "Internal error", serde_json::Value::Null);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rate_limited_sets_retry_after() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining_attempts: 0,
            reset_in: Duration::from_millis(9_200),
            blocked_for: None,
        };
        let response = AppError::RateLimited(decision).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "10");
    }

    #[test]
    fn invalid_policy_is_bad_request() {
        let response = AppError::from(RateLimitError::InvalidPolicy("window must be positive")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
