use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserResult, ChannelPage};
use crate::config::PaginationSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Height stopped changing for `stall_limit` consecutive scrolls.
    Stalled,
    MaxAttempts,
    /// The page could not report its height or refused to scroll.
    PageError,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StopReason::Stalled => "stalled",
            StopReason::MaxAttempts => "max_attempts",
            StopReason::PageError => "page_error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationOutcome {
    pub attempts: usize,
    pub final_height: u64,
    pub stop_reason: StopReason,
    pub error: Option<String>,
}

/// Scrolls the page to the bottom until lazy loading stops producing content.
///
/// Termination is heuristic: the loop ends once the document height failed
/// to change `stall_limit` times in a row, or after `max_attempts` scrolls.
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    max_attempts: usize,
    stall_limit: usize,
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl PaginationDriver {
    pub fn new(config: &PaginationSection) -> Self {
        Self {
            max_attempts: config.max_attempts,
            stall_limit: config.stall_limit.max(1),
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    pub async fn run<P>(&self, page: &mut P) -> PaginationOutcome
    where
        P: ChannelPage + ?Sized,
    {
        info!(
            max_attempts = self.max_attempts,
            stall_limit = self.stall_limit,
            "Scrolling to load all videos"
        );
        let mut outcome = PaginationOutcome {
            attempts: 0,
            final_height: 0,
            stop_reason: StopReason::MaxAttempts,
            error: None,
        };

        let mut height = match page.scroll_height().await {
            Ok(height) => height,
            Err(err) => return self.page_error(outcome, err),
        };
        outcome.final_height = height;

        let mut stalls = 0usize;
        while outcome.attempts < self.max_attempts {
            if let Err(err) = page.scroll_to_bottom().await {
                return self.page_error(outcome, err);
            }
            outcome.attempts += 1;

            let next = match self.settle(page, height).await {
                Ok(next) => next,
                Err(err) => return self.page_error(outcome, err),
            };
            if next == height {
                stalls += 1;
                debug!(attempt = outcome.attempts, stalls, height, "height unchanged");
                if stalls >= self.stall_limit {
                    outcome.stop_reason = StopReason::Stalled;
                    break;
                }
            } else {
                stalls = 0;
                debug!(attempt = outcome.attempts, from = height, to = next, "height changed");
                height = next;
            }
            outcome.final_height = height;
        }

        info!(
            attempts = outcome.attempts,
            height = outcome.final_height,
            reason = %outcome.stop_reason,
            "Scrolling completed"
        );
        outcome
    }

    /// Polls the height until it moves away from `before` or the settle
    /// timeout elapses; returns the last height read.
    async fn settle<P>(&self, page: &mut P, before: u64) -> BrowserResult<u64>
    where
        P: ChannelPage + ?Sized,
    {
        let deadline = Instant::now() + self.settle_timeout;
        loop {
            sleep(self.poll_interval).await;
            let height = page.scroll_height().await?;
            if height != before || Instant::now() >= deadline {
                return Ok(height);
            }
        }
    }

    fn page_error(&self, mut outcome: PaginationOutcome, err: BrowserError) -> PaginationOutcome {
        warn!(attempts = outcome.attempts, error = %err, "scrolling aborted");
        outcome.stop_reason = StopReason::PageError;
        outcome.error = Some(err.to_string());
        outcome
    }
}
