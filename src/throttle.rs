//! Backlog throttle
//!
//! Slows continuation requests down while the consumer falls behind. The
//! session on the server expires when left idle, so the throttle only ever
//! lengthens the wait and never stops fetching.

use crate::config::ThrottleConfig;
use std::time::Duration;

/// Three-tier delay policy keyed on the accumulator backlog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklogThrottle {
    min_delay: Duration,
    medium_delay: Duration,
    long_delay: Duration,
}

impl Default for BacklogThrottle {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}

impl BacklogThrottle {
    /// Create a throttle with explicit delays
    pub fn new(min_delay: Duration, medium_delay: Duration, long_delay: Duration) -> Self {
        Self {
            min_delay,
            medium_delay,
            long_delay,
        }
    }

    /// Create a throttle from configuration
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.medium_delay_ms),
            Duration::from_millis(config.long_delay_ms),
        )
    }

    /// Delay before the next continuation request
    ///
    /// Without a limit only the minimum delay applies. Above the limit the
    /// medium delay applies, above twice the limit the long one.
    pub fn delay_before_next_fetch(&self, backlog: usize, limit: Option<usize>) -> Duration {
        let Some(limit) = limit else {
            return self.min_delay;
        };

        if backlog > limit.saturating_mul(2) {
            self.long_delay
        } else if backlog > limit {
            self.medium_delay
        } else {
            self.min_delay
        }
    }

    /// Minimum delay
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}
