use embedded_hal::delay::DelayNs;
use log::debug;

use crate::config::{
    ADC_FULL_SCALE, THERMISTOR_CALIBRATION_C, THERMISTOR_FIXED_OHMS,
    THERMISTOR_SAMPLE_INTERVAL_MS, THERMISTOR_WINDOW_MS,
};
use crate::error::SensorError;
use crate::hardware::TemperatureSensor;
use crate::timer::Clock;

/// A single ADC channel returning raw counts
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Thermistor resistance from the divider's raw ADC count.
/// Both rails are outside the measurable range.
pub fn resistance_ohms(raw: u16) -> Result<f32, SensorError> {
    if raw == 0 || raw >= ADC_FULL_SCALE {
        return Err(SensorError::OutOfRange);
    }
    let raw = f32::from(raw);
    Ok(THERMISTOR_FIXED_OHMS * raw / (f32::from(ADC_FULL_SCALE) - raw))
}

/// Logarithmic fit of the thermistor curve, plus calibration
pub fn celsius_from_ohms(ohms: f32) -> f32 {
    -21.21 * libm::logf(ohms / 1000.0) + 72.203 + THERMISTOR_CALIBRATION_C
}

/// NTC thermistor in a divider with a 10k fixed resistor
pub struct Thermistor<A, K, D> {
    adc: A,
    clock: K,
    delay: D,
}

impl<A, K, D> Thermistor<A, K, D>
where
    A: AnalogInput,
    K: Clock,
    D: DelayNs,
{
    pub fn new(adc: A, clock: K, delay: D) -> Self {
        Self { adc, clock, delay }
    }
}

impl<A, K, D> TemperatureSensor for Thermistor<A, K, D>
where
    A: AnalogInput,
    K: Clock,
    D: DelayNs,
{
    fn temperature_c(&mut self) -> Result<f32, SensorError> {
        let start = self.clock.now_ms();
        let mut total = 0.0;
        let mut samples: u32 = 0;

        while self.clock.now_ms().saturating_sub(start) < THERMISTOR_WINDOW_MS {
            let raw = self.adc.read_raw()?;
            match resistance_ohms(raw) {
                Ok(ohms) => {
                    total += celsius_from_ohms(ohms);
                    samples += 1;
                }
                Err(_) => debug!("thermistor reading {} at the rail", raw),
            }
            self.delay.delay_ms(THERMISTOR_SAMPLE_INTERVAL_MS);
        }

        if samples == 0 {
            return Err(SensorError::OutOfRange);
        }
        Ok(total / samples as f32)
    }
}
