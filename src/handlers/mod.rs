mod health;
mod metrics;
mod login;
mod forms;
mod limits;

use axum::{Router, routing::{delete, get, post}};
use std::sync::Arc;
use crate::state::AppState;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use login::login_handler;
pub use forms::submit_form_handler;
pub use limits::{check_limit_handler, reset_limit_handler};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/forms/{form_id}/submit", post(submit_form_handler))
        .route("/api/limits/check", post(check_limit_handler))
        .route("/api/limits/{key}", delete(reset_limit_handler))
        .with_state(state)
}

// Upstream answer for a 2xx. Empty or non-JSON bodies become null.
pub(crate) async fn upstream_body(res: reqwest::Response) -> serde_json::Value {
    match res.bytes().await {
        Ok(bytes) if bytes.is_empty() => serde_json::Value::Null,
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Upstream body is not JSON");
            serde_json::Value::Null
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read upstream body");
            serde_json::Value::Null
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use axum::response::Response;
    use crate::rate_limit::{LimitPolicy, RateLimiter};

    // nothing listens on the discard port, so any upstream call fails fast
    pub fn test_state() -> Arc<AppState> {
        test_state_with("http://127.0.0.1:9".to_string())
    }

    pub fn test_state_with(upstream_url: String) -> Arc<AppState> {
        Arc::new(AppState {
            client: reqwest::Client::new(),
            upstream_url,
            limiter: Arc::new(RateLimiter::new()),
            login_policy: LimitPolicy::login(),
            form_policy: LimitPolicy::form_submit(),
        })
    }

    // Serve a stand-in backend on an ephemeral port, returns its base url
    pub async fn spawn_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
