//! Randomized pacing between requests to the target site.
//!
//! Each caller paces independently; this is not a process-wide limiter.

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(5))
    }
}

impl Pacer {
    /// Creates a pacer sleeping uniformly in `[min, max]`. Swapped bounds are
    /// reordered.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[must_use]
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// A pacer that never sleeps.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    #[must_use]
    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }

    /// Draws the next delay from `[min, max]`.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }

    /// Sleeps for a freshly drawn delay.
    pub async fn pace(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::debug!(delay_ms = delay.as_millis(), "pacing before request");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_are_two_to_five_seconds() {
        assert_eq!(
            Pacer::default().bounds(),
            (Duration::from_secs(2), Duration::from_secs(5))
        );
    }

    #[test]
    fn next_delay_stays_within_bounds() {
        let pacer = Pacer::from_millis(20, 50);
        for _ in 0..500 {
            let d = pacer.next_delay();
            assert!(d >= Duration::from_millis(20) && d <= Duration::from_millis(50), "{d:?}");
        }
    }

    #[test]
    fn swapped_bounds_are_reordered() {
        let pacer = Pacer::from_millis(900, 100);
        assert_eq!(
            pacer.bounds(),
            (Duration::from_millis(100), Duration::from_millis(900))
        );
    }

    #[test]
    fn disabled_pacer_has_zero_delay() {
        assert_eq!(Pacer::disabled().next_delay(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn pace_sleeps_at_least_min() {
        let pacer = Pacer::from_millis(2_000, 5_000);
        let start = tokio::time::Instant::now();
        pacer.pace().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2_000), "{elapsed:?}");
        assert!(elapsed <= Duration::from_millis(5_000) + Duration::from_millis(5), "{elapsed:?}");
    }
}
