use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("throttle_requests_total", "Total number of guarded requests").unwrap();
    pub static ref RATE_LIMIT_ALLOWED: Counter =
        register_counter!("throttle_allowed_total", "Attempts allowed by the limiter").unwrap();
    pub static ref RATE_LIMIT_DENIED: Counter =
        register_counter!("throttle_denied_total", "Attempts denied by the limiter").unwrap();
    pub static ref RATE_LIMIT_BLOCKS: Counter =
        register_counter!("throttle_blocks_total", "Keys placed under a temporary block").unwrap();
    pub static ref RATE_LIMIT_RESETS: Counter =
        register_counter!("throttle_resets_total", "Keys cleared by an explicit reset").unwrap();
    pub static ref SWEPT_ENTRIES: Counter =
        register_counter!("throttle_swept_entries_total", "Expired entries removed by the sweeper").unwrap();
    pub static ref TRACKED_KEYS: Gauge =
        register_gauge!("throttle_tracked_keys", "Current number of keys held by the limiter").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "throttle_upstream_latency_seconds",
        "Upstream backend latency in seconds"
    )
    .unwrap();
}
