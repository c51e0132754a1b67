//! Provider-mandated pauses between calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces calls to one provider at least `gap` apart.
///
/// Concurrent callers queue on the pacer, so the gap holds even when
/// every credential is fetched at once. Waiting is an awaited sleep.
#[derive(Debug)]
pub struct Pacer {
    gap: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Creates a pacer with the given minimum gap.
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            next_slot: Mutex::new(None),
        }
    }

    /// Returns the minimum gap.
    pub fn gap(&self) -> Duration {
        self.gap
    }

    /// Waits until the caller may issue its call.
    pub async fn wait(&self) {
        if self.gap.is_zero() {
            return;
        }
        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            tokio::time::sleep_until(slot).await;
        }
        *next_slot = Some(Instant::now() + self.gap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced() {
        let pacer = Arc::new(Pacer::new(Duration::from_secs(1)));
        let start = Instant::now();

        let waits = (0..3).map(|_| {
            let pacer = Arc::clone(&pacer);
            async move { pacer.wait().await }
        });
        futures::future::join_all(waits).await;

        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_zero_gap_never_waits() {
        let pacer = Pacer::new(Duration::ZERO);
        pacer.wait().await;
        pacer.wait().await;
        assert_eq!(pacer.gap(), Duration::ZERO);
    }
}
