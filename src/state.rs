use std::sync::Arc;
use crate::rate_limit::{LimitPolicy, RateLimiter};
// app's shared state, built once in main and handed to every handler

pub struct AppState {
    pub client: reqwest::Client,
    pub upstream_url: String,           // backend API base url
    pub limiter: Arc<RateLimiter>,
    pub login_policy: LimitPolicy,
    pub form_policy: LimitPolicy,
}
