use serde::{Deserialize, Serialize};
use crate::rate_limit::RateLimitDecision;

// Sign-in form body, forwarded as-is to the backend
#[derive(Deserialize, Serialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Form submission: who is submitting plus the form fields
#[derive(Deserialize, Serialize, Clone)]
pub struct FormSubmission {
    pub subject: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

// Raw limiter call, durations in milliseconds
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckLimitRequest {
    pub key: String,
    pub max_attempts: u32,
    pub window_ms: u64,
    #[serde(default)]
    pub block_duration_ms: Option<u64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckLimitResponse {
    pub allowed: bool,
    pub remaining_attempts: u32,
    pub reset_in: u64,
    pub blocked_for: Option<u64>,
}

impl From<RateLimitDecision> for CheckLimitResponse {
    fn from(d: RateLimitDecision) -> Self {
        Self {
            allowed: d.allowed,
            remaining_attempts: d.remaining_attempts,
            reset_in: d.reset_in.as_millis() as u64,
            blocked_for: d.blocked_for.map(|b| b.as_millis() as u64),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ResetResponse {
    pub key: String,
    pub cleared: bool,
}
