use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use tokio::time::Instant;
use crate::error::RateLimitError;
use crate::metrics::{RATE_LIMIT_ALLOWED, RATE_LIMIT_BLOCKS, RATE_LIMIT_DENIED, RATE_LIMIT_RESETS};

// Rate limit entry - tracks attempts per key
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: Instant,
    pub blocked_until: Option<Instant>,
}

impl RateLimitEntry {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_reset_at: now + window,
            blocked_until: None,
        }
    }

    fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    // window over and no block still running
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.window_reset_at && self.blocked_until.is_none_or(|until| now >= until)
    }
}

/// Limits for one throttled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    max_attempts: u32,
    window: Duration,
    block_duration: Option<Duration>,
}

impl LimitPolicy {
    pub fn new(
        max_attempts: u32,
        window: Duration,
        block_duration: Option<Duration>,
    ) -> Result<Self, RateLimitError> {
        if max_attempts < 1 {
            return Err(RateLimitError::InvalidPolicy("max attempts must be at least 1"));
        }
        if window.is_zero() {
            return Err(RateLimitError::InvalidPolicy("window must be positive"));
        }
        if block_duration.is_some_and(|b| b.is_zero()) {
            return Err(RateLimitError::InvalidPolicy("block duration must be positive"));
        }
        Ok(Self {
            max_attempts,
            window,
            block_duration,
        })
    }

    // Same as `new`, with millisecond values as they arrive from JSON callers
    pub fn from_millis(
        max_attempts: u32,
        window_ms: u64,
        block_duration_ms: Option<u64>,
    ) -> Result<Self, RateLimitError> {
        Self::new(
            max_attempts,
            Duration::from_millis(window_ms),
            block_duration_ms.map(Duration::from_millis),
        )
    }

    /// Sign-in attempts: 5 per 15 minutes, then blocked for 30 minutes.
    pub const fn login() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60),
            block_duration: Some(Duration::from_secs(30 * 60)),
        }
    }

    /// Form submissions: 3 per 10 seconds, denial lapses with the window.
    pub const fn form_submit() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::from_secs(10),
            block_duration: None,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn block_duration(&self) -> Option<Duration> {
        self.block_duration
    }
}

/// Outcome of one `check_limit` call. A denial is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining_attempts: u32,
    /// Time until the current restriction (window or block) clears.
    pub reset_in: Duration,
    /// Remaining block time, only set while a block is active.
    pub blocked_for: Option<Duration>,
}

impl RateLimitDecision {
    fn allowed(remaining_attempts: u32, reset_in: Duration) -> Self {
        Self {
            allowed: true,
            remaining_attempts,
            reset_in,
            blocked_for: None,
        }
    }

    fn denied(reset_in: Duration, blocked_for: Option<Duration>) -> Self {
        Self {
            allowed: false,
            remaining_attempts: 0,
            reset_in,
            blocked_for,
        }
    }

    // Wait-time sentence shown to the user on denial
    pub fn wait_message(&self) -> String {
        let wait = self.blocked_for.unwrap_or(self.reset_in);
        let secs = wait.as_millis().div_ceil(1000) as u64;
        let human = if secs >= 120 {
            format!("{} minutes", secs.div_ceil(60))
        } else if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{} seconds", secs.max(1))
        };
        format!("Too many attempts. Try again in {}.", human)
    }
}

// In-memory fixed window limiter keyed by "<namespace>:<subject>"
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Record one attempt for `key` and decide whether it may proceed.
    ///
    /// The entry's shard lock is held for the whole read-modify-write, so
    /// concurrent calls on the same key are serialized.
    pub fn check_limit(
        &self,
        key: &str,
        policy: &LimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        if key.is_empty() {
            return Err(RateLimitError::EmptyKey);
        }
        let now = Instant::now();

        let decision = match self.entries.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(RateLimitEntry::fresh(now, policy.window));
                RateLimitDecision::allowed(policy.max_attempts - 1, policy.window)
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.is_blocked(now) {
                    // re-read only, block time takes precedence for reporting
                    let left = entry
                        .blocked_until
                        .map_or(Duration::ZERO, |until| until - now);
                    RateLimitDecision::denied(left, Some(left))
                } else if now >= entry.window_reset_at || entry.blocked_until.is_some() {
                    *entry = RateLimitEntry::fresh(now, policy.window);
                    RateLimitDecision::allowed(policy.max_attempts - 1, policy.window)
                } else {
                    entry.count = entry.count.saturating_add(1);
                    let window_left = entry.window_reset_at - now;

                    if entry.count > policy.max_attempts {
                        match policy.block_duration {
                            Some(block) => {
                                entry.blocked_until = Some(now + block);
                                RATE_LIMIT_BLOCKS.inc();
                                tracing::warn!(
                                    key = %key,
                                    count = entry.count,
                                    block_secs = block.as_secs(),
                                    "Rate limit exceeded, key blocked"
                                );
                                RateLimitDecision::denied(block, Some(block))
                            }
                            None => RateLimitDecision::denied(window_left, None),
                        }
                    } else {
                        RateLimitDecision::allowed(policy.max_attempts - entry.count, window_left)
                    }
                }
            }
        };

        if decision.allowed {
            RATE_LIMIT_ALLOWED.inc();
        } else {
            RATE_LIMIT_DENIED.inc();
            tracing::warn!(
                key = %key,
                reset_in_ms = decision.reset_in.as_millis() as u64,
                blocked = decision.blocked_for.is_some(),
                "Attempt denied"
            );
        }
        Ok(decision)
    }

    // Drop all state for a key (e.g. after a successful login)
    pub fn reset(&self, key: &str) -> bool {
        let cleared = self.entries.remove(key).is_some();
        if cleared {
            RATE_LIMIT_RESETS.inc();
        }
        tracing::debug!(key = %key, cleared, "Rate limit reset");
        cleared
    }

    /// Delete entries whose window and block have both run out.
    /// Returns how many entries were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| e.clone())
    }
}

// A blank subject would put every anonymous caller into one shared bucket
pub fn login_key(email: &str) -> Result<String, RateLimitError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(RateLimitError::BlankSubject("email"));
    }
    Ok(format!("login:{}", email.to_lowercase()))
}

pub fn form_key(form_id: &str, subject: &str) -> Result<String, RateLimitError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(RateLimitError::BlankSubject("subject"));
    }
    Ok(format!("form:{}:{}", form_id, subject))
}
