//! Token bucket primitive shared by the global and per-client limiters.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// A fixed-capacity token bucket with lazy, time-proportional refill.
///
/// A fresh bucket starts full. Every [`TokenBucket::allow`] first credits
/// `elapsed * refill_per_sec` tokens (capped at `capacity`) and then tries to
/// take one. Rejection is immediate: callers are never queued.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket holding at most `capacity` tokens and regaining
    /// `refill_per_sec` tokens every second.
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        let refill_per_sec = if refill_per_sec.is_finite() && refill_per_sec > 0.0 {
            refill_per_sec
        } else {
            0.0
        };
        Self {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Create a bucket that regains `per_period` tokens over `period`.
    pub fn per_period(capacity: u32, per_period: u32, period: Duration) -> Self {
        let secs = period.as_secs_f64();
        let rate = if secs > 0.0 { f64::from(per_period) / secs } else { 0.0 };
        Self::new(capacity, rate)
    }

    /// Try to take one token now.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Try to take one token, treating `now` as the current instant.
    ///
    /// An instant earlier than the last refill credits nothing.
    pub fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state, now);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available, after crediting refill up to `now`.
    pub fn available_at(&self, now: Instant) -> f64 {
        let mut state = self.state.lock();
        self.refill(&mut state, now);
        state.tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_per_sec(&self) -> f64 {
        self.refill_per_sec
    }

    /// Time needed to regain a single token from empty.
    pub fn refill_interval(&self) -> Option<Duration> {
        if self.refill_per_sec > 0.0 {
            Some(Duration::from_secs_f64(1.0 / self.refill_per_sec))
        } else {
            None
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        if elapsed.is_zero() {
            return;
        }
        let credited = state.tokens + elapsed.as_secs_f64() * self.refill_per_sec;
        state.tokens = credited.min(f64::from(self.capacity));
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejects() {
        let bucket = TokenBucket::new(0, 10.0);
        assert!(!bucket.allow());
        assert!(!bucket.allow_at(Instant::now() + Duration::from_secs(60)));
    }

    #[test]
    fn test_invalid_rate_never_refills() {
        let bucket = TokenBucket::new(1, f64::NAN);
        let start = Instant::now();
        assert!(bucket.allow_at(start));
        assert!(!bucket.allow_at(start + Duration::from_secs(3600)));
        assert_eq!(bucket.refill_interval(), None);
    }

    #[test]
    fn test_per_period_rate() {
        let bucket = TokenBucket::per_period(8, 60, Duration::from_secs(60));
        assert!((bucket.refill_per_sec() - 1.0).abs() < f64::EPSILON);
        assert_eq!(bucket.refill_interval(), Some(Duration::from_secs(1)));
    }
}
