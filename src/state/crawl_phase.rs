/// Crawl phase definitions for the scheduler state machine
///
/// ```text
/// Idle ──> Running ──> Draining ──> Terminated
///   │         │           │             ^
///   └─────────┴───────────┴──> Failed ──┘
/// ```
use crate::ScribeError;
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Created, nothing fetched yet
    Idle,

    /// Workers are pulling URLs from the frontier
    Running,

    /// Frontier exhausted; final checkpoint, sitemap and webhook
    Draining,

    /// A fatal filesystem error stopped the crawl
    Failed,

    /// Crawl is over, successfully or not
    Terminated,
}

impl CrawlPhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Failed)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Failed)
                | (Self::Draining, Self::Terminated)
                | (Self::Draining, Self::Failed)
                | (Self::Failed, Self::Terminated)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), ScribeError> {
        if !self.can_transition_to(next) {
            return Err(ScribeError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self, next);
        *self = next;
        Ok(())
    }

    /// Returns true once no further transition except to Terminated is possible
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
        }
    }
}

impl Default for CrawlPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
