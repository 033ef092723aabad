use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;
use crate::state::AppState;

// Liveness plus a glance at what the limiter is holding
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "trackedKeys": state.limiter.len(),
        "upstream": state.upstream_url,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::router;
    use crate::rate_limit::LimitPolicy;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn reports_healthy_with_key_count() {
        let state = test_state();
        state.limiter.check_limit("form:x:y", &LimitPolicy::form_submit()).unwrap();

        let response = router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["trackedKeys"], 1);
        assert_eq!(body["upstream"], "http://127.0.0.1:9");
    }
}
