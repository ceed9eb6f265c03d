use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::config::{
    ULTRASONIC_ECHO_TIMEOUT_US, ULTRASONIC_OFFSET_CM, ULTRASONIC_SAMPLE_INTERVAL_MS,
    ULTRASONIC_TRIGGER_US, ULTRASONIC_US_PER_CM, ULTRASONIC_WINDOW_MS,
};
use crate::error::SensorError;
use crate::hardware::DistanceSensor;
use crate::timer::Clock;

/// HC-SR04 style ultrasonic ranger mounted above the water surface
pub struct Ultrasonic<TRIG, ECHO, K, D> {
    trigger: TRIG,
    echo: ECHO,
    clock: K,
    delay: D,
}

impl<TRIG, ECHO, K, D> Ultrasonic<TRIG, ECHO, K, D>
where
    TRIG: OutputPin,
    ECHO: InputPin,
    K: Clock,
    D: DelayNs,
{
    pub fn new(mut trigger: TRIG, echo: ECHO, clock: K, delay: D) -> Result<Self, SensorError> {
        trigger.set_low().map_err(|_| SensorError::Pin)?;
        Ok(Self {
            trigger,
            echo,
            clock,
            delay,
        })
    }

    /// Fires one ping and returns the echo pulse width in microseconds
    pub fn echo_us(&mut self) -> Result<u64, SensorError> {
        // 10 us pulse to send wave
        self.trigger.set_high().map_err(|_| SensorError::Pin)?;
        self.delay.delay_us(ULTRASONIC_TRIGGER_US);
        self.trigger.set_low().map_err(|_| SensorError::Pin)?;

        let sent = self.clock.now_us();
        while self.echo.is_low().map_err(|_| SensorError::Pin)? {
            if self.clock.now_us().saturating_sub(sent) > ULTRASONIC_ECHO_TIMEOUT_US {
                debug!("timeout waiting for echo high");
                return Err(SensorError::EchoTimeout);
            }
        }

        let rise = self.clock.now_us();
        while self.echo.is_high().map_err(|_| SensorError::Pin)? {
            if self.clock.now_us().saturating_sub(rise) > ULTRASONIC_ECHO_TIMEOUT_US {
                debug!("timeout waiting for echo low");
                return Err(SensorError::EchoTimeout);
            }
        }
        Ok(self.clock.now_us().saturating_sub(rise))
    }
}

impl<TRIG, ECHO, K, D> DistanceSensor for Ultrasonic<TRIG, ECHO, K, D>
where
    TRIG: OutputPin,
    ECHO: InputPin,
    K: Clock,
    D: DelayNs,
{
    /// Averages every ping that returned within the detection window.
    /// Fails only if none did.
    fn gap_cm(&mut self) -> Result<f32, SensorError> {
        let start = self.clock.now_ms();
        let mut total_cm = 0.0;
        let mut samples: u32 = 0;

        while self.clock.now_ms().saturating_sub(start) < ULTRASONIC_WINDOW_MS {
            match self.echo_us() {
                Ok(pulse_us) => {
                    total_cm += pulse_us as f32 / ULTRASONIC_US_PER_CM;
                    samples += 1;
                }
                Err(SensorError::EchoTimeout) => {}
                Err(e) => return Err(e),
            }
            self.delay.delay_ms(ULTRASONIC_SAMPLE_INTERVAL_MS);
        }

        if samples == 0 {
            return Err(SensorError::EchoTimeout);
        }
        let gap_cm = total_cm / samples as f32 - ULTRASONIC_OFFSET_CM;
        debug!("ultrasonic gap {} cm over {} samples", gap_cm, samples);
        Ok(gap_cm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeClock, FakeDelay, FakeEcho, FakePin, PinLog};

    #[test]
    fn pulse_width_is_timed_from_the_rising_edge() {
        let log = PinLog::default();
        let clock = FakeClock::new();
        // 57 more high reads plus the falling read, 10 us each
        let echo = FakeEcho::new(&clock, 10, 58, 10);
        let mut sonar =
            Ultrasonic::new(FakePin::new("trig", &log), echo, &clock, FakeDelay::new(&clock))
                .unwrap();

        assert_eq!(sonar.echo_us().unwrap(), 580);
        assert_eq!(log.levels("trig"), [false, true, false]);
    }

    #[test]
    fn gap_is_averaged_and_offset() {
        let log = PinLog::default();
        let clock = FakeClock::new();
        let echo = FakeEcho::new(&clock, 10, 58, 10);
        let mut sonar =
            Ultrasonic::new(FakePin::new("trig", &log), echo, &clock, FakeDelay::new(&clock))
                .unwrap();

        let gap = sonar.gap_cm().unwrap();
        let expected = 580.0 / ULTRASONIC_US_PER_CM - ULTRASONIC_OFFSET_CM;
        assert!((gap - expected).abs() < 1e-3, "gap {gap}");
        // four pings fit in the one second window
        assert_eq!(log.levels("trig").iter().filter(|level| **level).count(), 4);
        assert!(clock.now_ms() >= ULTRASONIC_WINDOW_MS);
    }

    #[test]
    fn silent_echo_times_out() {
        let log = PinLog::default();
        let clock = FakeClock::new();
        let echo = FakeEcho::silent(&clock, 100);
        let mut sonar =
            Ultrasonic::new(FakePin::new("trig", &log), echo, &clock, FakeDelay::new(&clock))
                .unwrap();

        assert_eq!(sonar.echo_us(), Err(SensorError::EchoTimeout));
        assert_eq!(sonar.gap_cm(), Err(SensorError::EchoTimeout));
    }
}
