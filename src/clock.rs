use std::time::Duration;

/// Shortest gap between random state rolls.
pub const STATE_INTERVAL_MIN_MS: u64 = 1500;
/// Longest gap between random state rolls.
pub const STATE_INTERVAL_MAX_MS: u64 = 4000;

/// Deadline-based timer on the companion's monotonic clock.
///
/// Time is a `Duration` since companion start so the whole clock can be
/// driven by tests without sleeping. A timer is either periodic (re-arms
/// itself after firing) or single-shot (disarms after firing).
#[derive(Debug, Clone)]
pub struct Timer {
    interval: Duration,
    deadline: Option<Duration>,
    periodic: bool,
}

impl Timer {
    pub fn periodic(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            periodic: true,
        }
    }

    pub fn single_shot(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            periodic: false,
        }
    }

    /// Arm (or re-arm) the timer to fire one interval after `now`.
    pub fn start(&mut self, now: Duration) {
        self.deadline = Some(now + self.interval);
    }

    /// Replace the interval and arm from `now`.
    pub fn start_with(&mut self, now: Duration, interval: Duration) {
        self.interval = interval;
        self.start(now);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Change the interval. An already scheduled deadline is left alone;
    /// the new value applies from the next scheduling onwards.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true if the timer fired at or before `now`.
    ///
    /// Periodic timers re-arm one interval after `now` rather than after the
    /// missed deadline, so a stalled loop never produces a burst of fires.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = if self.periodic {
                    Some(now + self.interval)
                } else {
                    None
                };
                true
            }
            _ => false,
        }
    }
}

/// Animation timer interval for a frame rate.
pub fn frame_interval(frame_rate_hz: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(frame_rate_hz.max(1)))
}

/// Draw a fresh state-timer interval, uniform over the inclusive range.
pub fn draw_state_interval(rng: &mut fastrand::Rng) -> Duration {
    Duration::from_millis(rng.u64(STATE_INTERVAL_MIN_MS..=STATE_INTERVAL_MAX_MS))
}

/// Which clock timers fired during one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fired {
    pub animation: bool,
    pub state: bool,
}

/// The two independent periodic triggers behind the companion.
///
/// The animation timer runs at `1000 / frame_rate_hz` ms. The state timer
/// re-arms with a freshly drawn random interval every time it fires.
/// Once stopped, neither timer fires again until `start` is called.
pub struct ClockDriver {
    animation: Timer,
    state: Timer,
    running: bool,
}

impl ClockDriver {
    pub fn new(frame_rate_hz: u32) -> Self {
        Self {
            animation: Timer::periodic(frame_interval(frame_rate_hz)),
            state: Timer::single_shot(Duration::from_millis(STATE_INTERVAL_MIN_MS)),
            running: false,
        }
    }

    pub fn start(&mut self, now: Duration, rng: &mut fastrand::Rng) {
        self.running = true;
        self.animation.start(now);
        self.state.start_with(now, draw_state_interval(rng));
        log::debug!(
            "Clock started: animation every {:?}, first state roll in {:?}",
            self.animation.interval(),
            self.state.interval()
        );
    }

    /// Stop both timers. No fire is reported after this returns.
    pub fn stop(&mut self) {
        self.running = false;
        self.animation.stop();
        self.state.stop();
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_frame_rate(&mut self, frame_rate_hz: u32) {
        self.animation.set_interval(frame_interval(frame_rate_hz));
    }

    pub fn animation_interval(&self) -> Duration {
        self.animation.interval()
    }

    #[cfg(test)]
    pub fn state_interval(&self) -> Duration {
        self.state.interval()
    }

    #[cfg(test)]
    pub fn state_deadline(&self) -> Option<Duration> {
        self.state.deadline()
    }

    /// Fire whatever is due. The animation timer is always reported first
    /// so callers can keep frame advance ahead of any state change.
    pub fn poll(&mut self, now: Duration, rng: &mut fastrand::Rng) -> Fired {
        if !self.running {
            return Fired::default();
        }
        let animation = self.animation.poll(now);
        let state = self.state.poll(now);
        if state {
            self.state.start_with(now, draw_state_interval(rng));
        }
        Fired { animation, state }
    }

    /// Earliest pending deadline across both timers.
    pub fn next_deadline(&self) -> Option<Duration> {
        earliest([self.animation.deadline(), self.state.deadline()])
    }
}

/// Smallest of a set of optional deadlines.
pub fn earliest<I: IntoIterator<Item = Option<Duration>>>(deadlines: I) -> Option<Duration> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn frame_interval_matches_rate() {
        for hz in 6..=30u32 {
            let expected = 1000.0 / hz as f64;
            let actual = frame_interval(hz).as_millis() as f64;
            assert!((expected - actual).abs() < 1.0, "{hz} Hz -> {actual}ms");
        }
    }

    #[test]
    fn periodic_timer_rearms_from_fire_time() {
        let mut t = Timer::periodic(ms(50));
        t.start(ms(0));
        assert!(!t.poll(ms(49)));
        assert!(t.poll(ms(50)));
        assert_eq!(t.deadline(), Some(ms(100)));
        // A stall fires once, not once per missed interval.
        assert!(t.poll(ms(400)));
        assert!(!t.poll(ms(401)));
        assert_eq!(t.deadline(), Some(ms(450)));
    }

    #[test]
    fn single_shot_fires_once() {
        let mut t = Timer::single_shot(ms(2000));
        t.start(ms(0));
        assert!(!t.poll(ms(1999)));
        assert!(t.poll(ms(2000)));
        assert!(!t.poll(ms(2500)));
        assert!(!t.is_active());
    }

    #[test]
    fn interval_change_applies_on_next_scheduling() {
        let mut t = Timer::periodic(ms(100));
        t.start(ms(0));
        t.set_interval(ms(40));
        assert_eq!(t.deadline(), Some(ms(100)));
        assert!(t.poll(ms(100)));
        assert_eq!(t.deadline(), Some(ms(140)));
    }

    #[test]
    fn state_intervals_stay_in_range() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut clock = ClockDriver::new(15);
        clock.start(ms(0), &mut rng);
        let mut now = ms(0);
        let mut intervals = Vec::new();
        for _ in 0..2000 {
            now = clock.next_deadline().unwrap().max(now);
            let fired = clock.poll(now, &mut rng);
            if fired.state {
                intervals.push(clock.state_interval());
            }
        }
        assert!(intervals.len() > 10);
        for iv in &intervals {
            assert!(*iv >= ms(STATE_INTERVAL_MIN_MS) && *iv <= ms(STATE_INTERVAL_MAX_MS));
        }
        let distinct: std::collections::HashSet<_> = intervals.iter().collect();
        assert!(distinct.len() > intervals.len() / 2);
    }

    #[test]
    fn stopped_clock_never_fires() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut clock = ClockDriver::new(20);
        clock.start(ms(0), &mut rng);
        clock.stop();
        assert_eq!(clock.next_deadline(), None);
        assert_eq!(clock.poll(ms(60_000), &mut rng), Fired::default());
    }

    #[test]
    fn frame_rate_change_keeps_state_phase() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut clock = ClockDriver::new(10);
        clock.start(ms(0), &mut rng);
        let state_deadline = clock.state.deadline();
        clock.set_frame_rate(25);
        assert_eq!(clock.animation_interval(), ms(40));
        assert_eq!(clock.state.deadline(), state_deadline);
    }
}
