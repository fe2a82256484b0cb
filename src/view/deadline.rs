//! Action deadline tracking for time-limited turns.
//!
//! The tracker is a pure state machine over absolute timestamps; the
//! periodic tick that samples it lives with the owning client and is
//! canceled the moment the turn it belongs to goes stale. That keeps timer
//! lifetime explicit instead of scattered across callers.

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// No deadline armed; the full fraction is reported.
    Idle,
    /// Counting down toward `deadline` from a baseline of `total`.
    Counting {
        deadline: DateTime<Utc>,
        total: Duration,
    },
    /// The deadline passed. Sticky until re-armed or disarmed.
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadlineTracker {
    phase: Phase,
}

impl Default for DeadlineTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineTracker {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    /// Arm for a new absolute deadline. The remaining-time baseline is taken
    /// at arm time, so re-arming with a fresh deadline resets the fraction
    /// to 1 regardless of what was counting before.
    pub fn arm(&mut self, deadline: DateTime<Utc>, now: DateTime<Utc>) {
        let total = deadline - now;
        if total <= Duration::zero() {
            self.phase = Phase::Expired;
        } else {
            self.phase = Phase::Counting { deadline, total };
        }
    }

    pub fn disarm(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, Phase::Counting { .. })
    }

    pub fn is_expired(&self) -> bool {
        self.phase == Phase::Expired
    }

    /// Remaining fraction of the armed turn in `[0, 1]`: 1 while idle, 0 at
    /// or after the deadline.
    pub fn remaining_fraction(&mut self, now: DateTime<Utc>) -> f64 {
        match self.phase {
            Phase::Idle => 1.0,
            Phase::Expired => 0.0,
            Phase::Counting { deadline, total } => {
                let left = deadline - now;
                if left <= Duration::zero() {
                    self.phase = Phase::Expired;
                    return 0.0;
                }
                let total_ms = total.num_milliseconds().max(1) as f64;
                let left_ms = left.num_milliseconds() as f64;
                (left_ms / total_ms).clamp(0.0, 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn idle_tracker_reports_full_fraction() {
        let mut tracker = DeadlineTracker::new();
        assert_eq!(tracker.remaining_fraction(at(0)), 1.0);
        assert!(!tracker.is_armed());
    }

    #[test]
    fn fraction_decreases_monotonically_and_clamps() {
        let mut tracker = DeadlineTracker::new();
        tracker.arm(at(10), at(0));
        let mut prev = 1.0_f64;
        for t in 0..=12 {
            let f = tracker.remaining_fraction(at(t));
            assert!((0.0..=1.0).contains(&f), "fraction {f} out of range");
            assert!(f <= prev, "fraction must not increase");
            prev = f;
        }
        assert_eq!(tracker.remaining_fraction(at(12)), 0.0);
        assert!(tracker.is_expired());
    }

    #[test]
    fn reaches_exactly_zero_at_the_deadline() {
        let mut tracker = DeadlineTracker::new();
        tracker.arm(at(5), at(0));
        assert_eq!(tracker.remaining_fraction(at(5)), 0.0);
    }

    #[test]
    fn rearming_resets_the_baseline() {
        let mut tracker = DeadlineTracker::new();
        tracker.arm(at(10), at(0));
        let _ = tracker.remaining_fraction(at(11));
        assert!(tracker.is_expired());

        tracker.arm(at(40), at(20));
        assert!(tracker.is_armed());
        let f = tracker.remaining_fraction(at(20));
        assert!((f - 1.0).abs() < 1e-9);
        // Halfway through the new window, not the old one.
        let f = tracker.remaining_fraction(at(30));
        assert!((f - 0.5).abs() < 0.01);
    }

    #[test]
    fn arming_with_past_deadline_is_immediately_expired() {
        let mut tracker = DeadlineTracker::new();
        tracker.arm(at(0), at(5));
        assert!(tracker.is_expired());
        assert_eq!(tracker.remaining_fraction(at(6)), 0.0);
    }

    #[test]
    fn disarm_returns_to_idle() {
        let mut tracker = DeadlineTracker::new();
        tracker.arm(at(10), at(0));
        tracker.disarm();
        assert_eq!(tracker.remaining_fraction(at(3)), 1.0);
    }
}
