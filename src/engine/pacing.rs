//! Pacing between consecutive research calls.
//!
//! The orchestrator only knows it must call `pause` between calls; how long
//! that takes is up to the `Pacer` it was built with.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait before the next outbound call.
    async fn pause(&self);
}

/// Sleep for the same fixed delay every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!(delay_secs = self.delay.as_secs_f64(), "Pausing for rate limit");
        tokio::time::sleep(self.delay).await;
    }
}
