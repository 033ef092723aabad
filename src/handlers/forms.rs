use axum::{Json, extract::{Path, State}};
use std::sync::Arc;
use std::time::Instant;
use crate::error::AppError;
use crate::metrics::{REQUEST_TOTAL, UPSTREAM_LATENCY};
use crate::models::FormSubmission;
use crate::rate_limit::form_key;
use crate::state::AppState;
use super::upstream_body;

pub async fn submit_form_handler(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
    Json(submission): Json<FormSubmission>,
) -> Result<Json<serde_json::Value>, AppError> {
    REQUEST_TOTAL.inc();

    let key = form_key(&form_id, &submission.subject)?;
    let decision = state.limiter.check_limit(&key, &state.form_policy)?;
    if !decision.allowed {
        return Err(AppError::RateLimited(decision));
    }

    let start_time = Instant::now();
    let res = state
        .client
        .post(format!("{}/forms/{}", state.upstream_url, form_id))
        .json(&submission.payload)
        .send()
        .await?;
    UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

    let status = res.status();
    if !status.is_success() {
        return Err(AppError::UpstreamStatus(status));
    }
    Ok(Json(upstream_body(res).await))
}

#[cfg(test)]
mod tests {
    use super::super::router;
    use super::super::test_support::*;
    use crate::rate_limit::form_key;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::{Json, Router, routing::post};
    use tower::ServiceExt;

    fn submit(form_id: &str, subject: &str) -> axum::http::Request<axum::body::Body> {
        json_request(
            "POST",
            &format!("/api/forms/{}/submit", form_id),
            serde_json::json!({ "subject": subject, "payload": { "message": "hi" } }),
        )
    }

    #[tokio::test]
    async fn fourth_submission_is_throttled_without_block() {
        let state = test_state();
        let key = form_key("contact", "visitor-1").unwrap();
        for _ in 0..3 {
            state.limiter.check_limit(&key, &state.form_policy).unwrap();
        }

        let response = router(state.clone()).oneshot(submit("contact", "visitor-1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = json_body(response).await;
        assert!(body["error"]["details"]["blockedFor"].is_null());
        assert!(body["error"]["details"]["resetIn"].as_u64().unwrap() <= 10_000);
    }

    #[tokio::test]
    async fn allowed_submission_reaches_backend() {
        let upstream = spawn_upstream(Router::new().route(
            "/forms/{id}",
            post(|Path(id): Path<String>, Json(fields): Json<serde_json::Value>| async move {
                Json(serde_json::json!({ "form": id, "received": fields }))
            }),
        ))
        .await;
        let state = test_state_with(upstream);

        let response = router(state.clone()).oneshot(submit("contact", "visitor-2")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["form"], "contact");
        assert_eq!(body["received"]["message"], "hi");
        assert_eq!(
            state.limiter.entry(&form_key("contact", "visitor-2").unwrap()).unwrap().count,
            1
        );
    }

    #[tokio::test]
    async fn blank_subject_is_rejected() {
        let state = test_state();

        let response = router(state.clone()).oneshot(submit("contact", " ")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.limiter.is_empty());
    }

    #[tokio::test]
    async fn other_forms_are_unaffected() {
        let state = test_state();
        let contact = form_key("contact", "visitor-1").unwrap();
        for _ in 0..4 {
            state.limiter.check_limit(&contact, &state.form_policy).unwrap();
        }

        let d = state
            .limiter
            .check_limit(&form_key("newsletter", "visitor-1").unwrap(), &state.form_policy)
            .unwrap();
        assert!(d.allowed);
        assert_eq!(d.remaining_attempts, 2);
    }
}
