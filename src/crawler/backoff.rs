//! Adaptive inter-request delay shared by all workers
//!
//! | Outcome | New delay |
//! |---------|-----------|
//! | Success | `max(delay * 0.9, 100ms)` |
//! | HTTP 429 / 403 | `min(delay * 2, max_delay)` |
//! | Anything else | unchanged |

use serde::Serialize;
use std::time::Duration;

/// Lower bound for the delay after successes
pub const MIN_DELAY_MS: f64 = 100.0;

const DECAY_FACTOR: f64 = 0.9;
const GROWTH_FACTOR: f64 = 2.0;

/// Number of delay adjustments made during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffStats {
    /// Rate-limit doublings
    pub increases: u32,
    /// Success decays that actually lowered the delay
    pub decreases: u32,
}

/// One global delay knob
#[derive(Debug, Clone)]
pub struct Backoff {
    delay_ms: f64,
    max_ms: f64,
    stats: BackoffStats,
}

impl Backoff {
    /// Creates a controller starting at `initial`, capped at `max`
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max_ms = max.as_millis() as f64;
        Self {
            delay_ms: (initial.as_millis() as f64).min(max_ms),
            max_ms,
            stats: BackoffStats::default(),
        }
    }

    /// Delay workers wait before their next fetch
    pub fn current(&self) -> Duration {
        Duration::from_millis(self.delay_ms.round() as u64)
    }

    pub fn current_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Decays the delay after a successful fetch
    pub fn on_success(&mut self) {
        let next = (self.delay_ms * DECAY_FACTOR).max(MIN_DELAY_MS);
        if next < self.delay_ms {
            self.stats.decreases += 1;
        }
        self.delay_ms = next;
    }

    /// Doubles the delay after a 429 or 403, up to the maximum
    pub fn on_rate_limited(&mut self) {
        self.delay_ms = (self.delay_ms * GROWTH_FACTOR).min(self.max_ms);
        self.stats.increases += 1;
        tracing::debug!("Rate limited, delay is now {:.0}ms", self.delay_ms);
    }

    pub fn stats(&self) -> BackoffStats {
        self.stats
    }
}
