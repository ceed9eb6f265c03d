/// Monotonic microsecond time source
///
/// On the Pico this is the 1 MHz system timer. Taking `&self` lets one clock
/// be shared by every driver that needs it.
pub trait Clock {
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Seconds between two millisecond timestamps
pub fn seconds_between(start_ms: u64, end_ms: u64) -> f32 {
    end_ms.saturating_sub(start_ms) as f32 / 1000.0
}

/// Counts down to a fixed point in time
///
/// A stopped timer is never finished and has no time remaining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountDownTimer {
    deadline_ms: Option<u64>,
}

impl CountDownTimer {
    pub const fn stopped() -> CountDownTimer {
        Self { deadline_ms: None }
    }

    pub fn start(&mut self, now_ms: u64, duration_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(duration_ms));
    }

    pub fn stop(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.deadline_ms
            .map(|deadline| deadline.saturating_sub(now_ms))
            .unwrap_or(0)
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        matches!(self.deadline_ms, Some(deadline) if now_ms >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_is_idle() {
        let timer = CountDownTimer::stopped();
        assert!(!timer.is_running());
        assert!(!timer.is_finished(u64::MAX));
        assert_eq!(timer.remaining_ms(0), 0);
    }

    #[test]
    fn counts_down_to_deadline() {
        let mut timer = CountDownTimer::stopped();
        timer.start(1_000, 50_000);
        assert_eq!(timer.remaining_ms(11_000), 40_000);
        assert!(!timer.is_finished(50_999));
        assert!(timer.is_finished(51_000));
        assert_eq!(timer.remaining_ms(60_000), 0);

        timer.stop();
        assert!(!timer.is_finished(60_000));
    }

    #[test]
    fn seconds_between_never_goes_negative() {
        assert_eq!(seconds_between(2_500, 4_000), 1.5);
        assert_eq!(seconds_between(4_000, 2_500), 0.0);
    }
}
