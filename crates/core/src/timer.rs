//! Per-question countdown.
//!
//! The countdown holds no thread or task of its own; whoever owns the session
//! feeds it one `tick()` per elapsed second. That keeps it deterministic and
//! lets the owner stop it simply by not ticking (or by calling `stop()`).

/// Outcome of feeding one tick into the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown is stopped or has already fired; nothing happened.
    Idle,
    /// One second elapsed and time is left.
    Running { remaining: i64 },
    /// Time ran out on this tick. Reported once per `start()`.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    limit: i64,
    remaining: i64,
    running: bool,
    fired: bool,
}

impl Countdown {
    /// A stopped countdown with nothing on the clock.
    #[must_use]
    pub fn stopped() -> Self {
        Self {
            limit: 0,
            remaining: 0,
            running: false,
            fired: false,
        }
    }

    /// (Re)start with `limit_secs` on the clock. All previous state is discarded.
    ///
    /// A limit of zero or less starts with nothing remaining; the first tick
    /// then reports expiry.
    pub fn start(&mut self, limit_secs: i64) {
        self.limit = limit_secs;
        self.remaining = limit_secs.max(0);
        self.running = true;
        self.fired = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Tick {
        if !self.running || self.fired {
            return Tick::Idle;
        }

        self.remaining = (self.remaining - 1).max(0);
        if self.remaining == 0 {
            self.fired = true;
            self.running = false;
            return Tick::Expired;
        }

        Tick::Running {
            remaining: self.remaining,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.fired
    }

    /// Fraction of time left in `[0, 1]`; 0 for a non-positive limit.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        remaining_ratio(self.remaining, self.limit)
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::stopped()
    }
}

/// Fraction of `limit` still remaining, clamped to `[0, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn remaining_ratio(remaining: i64, limit: i64) -> f64 {
    if limit <= 0 {
        return 0.0;
    }
    (remaining as f64 / limit as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_zero_after_exactly_limit_ticks() {
        for limit in [1, 2, 5, 30] {
            let mut countdown = Countdown::stopped();
            countdown.start(limit);
            for step in 1..limit {
                assert_eq!(
                    countdown.tick(),
                    Tick::Running {
                        remaining: limit - step
                    }
                );
            }
            assert_eq!(countdown.tick(), Tick::Expired);
            assert_eq!(countdown.remaining(), 0);
        }
    }

    #[test]
    fn expiry_fires_once_and_never_goes_negative() {
        let mut countdown = Countdown::stopped();
        countdown.start(1);
        assert_eq!(countdown.tick(), Tick::Expired);
        for _ in 0..5 {
            assert_eq!(countdown.tick(), Tick::Idle);
        }
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn restart_discards_previous_state() {
        let mut countdown = Countdown::stopped();
        countdown.start(3);
        countdown.tick();
        countdown.tick();
        countdown.tick();
        assert!(countdown.has_expired());

        countdown.start(3);
        assert_eq!(countdown.remaining(), 3);
        assert!(!countdown.has_expired());
        assert_eq!(countdown.tick(), Tick::Running { remaining: 2 });
    }

    #[test]
    fn stopped_countdown_ignores_ticks() {
        let mut countdown = Countdown::stopped();
        countdown.start(10);
        countdown.stop();
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining(), 10);
    }

    #[test]
    fn non_positive_limit_is_safe() {
        let mut countdown = Countdown::stopped();
        countdown.start(-5);
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.ratio().abs() < f64::EPSILON);
        assert_eq!(countdown.tick(), Tick::Expired);

        countdown.start(0);
        assert!(countdown.ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_tracks_remaining_time() {
        let mut countdown = Countdown::stopped();
        countdown.start(4);
        assert!((countdown.ratio() - 1.0).abs() < f64::EPSILON);
        countdown.tick();
        assert!((countdown.ratio() - 0.75).abs() < f64::EPSILON);
    }
}
