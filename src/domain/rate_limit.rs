//! Submission Rate Limit
//!
//! Rolling-window cap on relay submissions. The state is an owned value
//! handed to the submitter by mutable reference, so two batches never share
//! a counter.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Default submissions allowed per window
pub const DEFAULT_MAX_SUBMISSIONS: usize = 2;

/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RateLimitState {
    /// Start times of submissions still inside the window, oldest first
    recent: VecDeque<Instant>,
    limit: usize,
    window: Duration,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUBMISSIONS, DEFAULT_WINDOW)
    }
}

impl RateLimitState {
    /// A limit of zero is treated as one
    pub fn new(limit: usize, window: Duration) -> Self {
        let limit = limit.max(1);
        Self {
            recent: VecDeque::with_capacity(limit),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Submissions counted in the window ending now
    pub fn count(&self) -> usize {
        self.count_at(Instant::now())
    }

    /// Start of the current window (oldest counted submission)
    pub fn window_start(&self) -> Option<Instant> {
        let now = Instant::now();
        self.recent
            .iter()
            .find(|t| now.duration_since(**t) < self.window)
            .copied()
    }

    fn count_at(&self, now: Instant) -> usize {
        self.recent
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }

    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.recent.front() {
            if now.duration_since(*oldest) >= self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a submission if there is room; otherwise return how long to wait
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        let now = Instant::now();
        self.evict(now);

        if self.recent.len() < self.limit {
            self.recent.push_back(now);
            return Ok(());
        }

        // Full: wait until the oldest entry leaves the window
        let oldest = self.recent[0];
        Err(self.window.saturating_sub(now.duration_since(oldest)))
    }

    /// Suspend until a submission slot is free, then take it
    pub async fn acquire(&mut self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    tracing::debug!(
                        "Relay rate limit reached ({} per {:?}), waiting {:?}",
                        self.limit,
                        self.window,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
