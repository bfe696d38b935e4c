use godfield_core::Millis;
use tokio::time::Instant;

/// Monotonic milliseconds since the agent started.
///
/// Built on `tokio::time::Instant` so a paused test runtime drives it
/// together with every sleep.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    /// Start counting from now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since [`Clock::start`], saturating.
    pub fn now_ms(&self) -> Millis {
        Millis::try_from(self.epoch.elapsed().as_millis()).unwrap_or(Millis::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn follows_paused_time() {
        let clock = Clock::start();
        assert_eq!(clock.now_ms(), 0);
        tokio::time::sleep(Duration::from_millis(1_250)).await;
        assert_eq!(clock.now_ms(), 1_250);
    }
}
