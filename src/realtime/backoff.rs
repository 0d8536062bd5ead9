//! Exponential reconnect backoff with a single pending timer

use super::transport::RetryTimer;
use std::time::Duration;

/// Delay sequence `min(base * 2^n, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(15000),
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    /// Delay before retry number `attempt` (0-indexed). Saturates for large attempts.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u128 << attempt.min(100);
        let ms = self
            .base_delay
            .as_millis()
            .saturating_mul(factor)
            .min(self.max_delay.as_millis());
        Duration::from_millis(ms as u64)
    }
}

/// Retry state plus the one timer it may have armed
pub struct Backoff {
    policy: BackoffPolicy,
    attempts: u32,
    timer: Box<dyn RetryTimer>,
    pending: Option<u64>,
    next_ticket: u64,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy, timer: Box<dyn RetryTimer>) -> Self {
        Self {
            policy,
            attempts: 0,
            timer,
            pending: None,
            next_ticket: 0,
        }
    }

    /// Failed/closed connections since the last successful connect
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Arm the next retry, replacing any pending one. Returns the delay used.
    pub fn schedule(&mut self) -> Duration {
        let delay = self.policy.delay_for_attempt(self.attempts);
        self.attempts = self.attempts.saturating_add(1);

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.timer.arm(delay, ticket);
        self.pending = Some(ticket);
        delay
    }

    /// Claim a timer firing. Cancelled or superseded tickets return false.
    pub fn fire(&mut self, ticket: u64) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            self.timer.cancel();
        }
    }
}
