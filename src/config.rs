use clap::Parser;
use std::time::Duration;
use crate::error::{ConfigError, RateLimitError};
use crate::rate_limit::LimitPolicy;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "throttle-gate")]
#[command(about = "Rate limiting gateway for sign-in and form traffic")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Backend API that performs the guarded actions
    #[arg(short, long, default_value = "localhost:3000")]
    pub upstream: String,

    // Upstream request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub upstream_timeout: u64,

    // How often expired limiter entries are swept, in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    // Sign-in attempts allowed per window
    #[arg(long, default_value_t = 5)]
    pub login_max_attempts: u32,

    // Sign-in window in seconds
    #[arg(long, default_value_t = 900)]
    pub login_window: u64,

    // Sign-in block in seconds once attempts run out (0 disables blocking)
    #[arg(long, default_value_t = 1800)]
    pub login_block: u64,

    // Form submissions allowed per window
    #[arg(long, default_value_t = 3)]
    pub form_max_attempts: u32,

    // Form window in seconds
    #[arg(long, default_value_t = 10)]
    pub form_window: u64,
}

impl Args {
    pub fn login_policy(&self) -> Result<LimitPolicy, RateLimitError> {
        let block = (self.login_block > 0).then(|| Duration::from_secs(self.login_block));
        LimitPolicy::new(self.login_max_attempts, Duration::from_secs(self.login_window), block)
    }

    pub fn form_policy(&self) -> Result<LimitPolicy, RateLimitError> {
        LimitPolicy::new(self.form_max_attempts, Duration::from_secs(self.form_window), None)
    }

    pub fn sweep_every(&self) -> Result<Duration, ConfigError> {
        nonzero_secs(self.sweep_interval, "sweep-interval")
    }

    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        nonzero_secs(self.upstream_timeout, "upstream-timeout")
    }

    // add http:// if not present
    pub fn upstream_url(&self) -> String {
        let url = self.upstream.trim().trim_end_matches('/');
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("http://{}", url)
        }
    }
}

// tokio's interval panics on zero and reqwest fails every call with a zero timeout
fn nonzero_secs(secs: u64, flag: &'static str) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Zero(flag));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_presets() {
        let args = Args::parse_from(["throttle-gate"]);
        assert_eq!(args.login_policy().unwrap(), LimitPolicy::login());
        assert_eq!(args.form_policy().unwrap(), LimitPolicy::form_submit());
        assert_eq!(args.upstream_url(), "http://localhost:3000");
    }

    #[test]
    fn zero_login_block_disables_blocking() {
        let args = Args::parse_from(["throttle-gate", "--login-block", "0"]);
        assert_eq!(args.login_policy().unwrap().block_duration(), None);
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let args = Args::parse_from(["throttle-gate", "--sweep-interval", "0"]);
        assert_eq!(args.sweep_every(), Err(ConfigError::Zero("sweep-interval")));

        let args = Args::parse_from(["throttle-gate"]);
        assert_eq!(args.sweep_every(), Ok(Duration::from_secs(60)));
    }

    #[test]
    fn zero_upstream_timeout_is_rejected() {
        let args = Args::parse_from(["throttle-gate", "--upstream-timeout", "0"]);
        assert_eq!(args.request_timeout(), Err(ConfigError::Zero("upstream-timeout")));

        let args = Args::parse_from(["throttle-gate"]);
        assert_eq!(args.request_timeout(), Ok(Duration::from_secs(10)));
    }

    #[test]
    fn zero_attempts_fail_validation() {
        let args = Args::parse_from(["throttle-gate", "--form-max-attempts", "0"]);
        assert!(args.form_policy().is_err());
    }
}
