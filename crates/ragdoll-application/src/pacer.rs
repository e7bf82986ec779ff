//! Fixed inter-call pacing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ragdoll_core::messages;

/// Sleeps for a fixed delay after each provider call that reached the network.
///
/// Cache hits never pause. The pause counter lets callers observe how many
/// network calls a turn made.
#[derive(Debug, Default)]
pub struct Pacer {
    delay: Duration,
    pauses: AtomicUsize,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pauses: AtomicUsize::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of pauses taken so far.
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        if self.delay.is_zero() {
            return;
        }
        tracing::info!("{}", messages::waiting(self.delay.as_millis()));
        tokio::time::sleep(self.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_delay_still_counts() {
        let pacer = Pacer::new(Duration::ZERO);
        pacer.pause().await;
        pacer.pause().await;
        assert_eq!(pacer.pauses(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_the_delay() {
        let pacer = Pacer::new(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        pacer.pause().await;
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(pacer.pauses(), 1);
    }
}
