// Simulated I/O latency for the static data services.
// A real backend would replace this with its own timeout and retry policy.

use rand::Rng;
use tokio::time::{Duration, sleep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    min_ms: u64,
    max_ms: u64,
}

impl Latency {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        // Keep the window well-formed even if the caller swapped the bounds
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    // No artificial delay; used by tests and tooling.
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    fn sample(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if delay.is_zero() {
            return;
        }
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Simulating data service latency");
        sleep(delay).await;
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::new(200, 500)
    }
}
