//! Water level and temperature sensing

pub mod thermistor;
pub mod ultrasonic;

pub use thermistor::{AnalogInput, Thermistor};
pub use ultrasonic::Ultrasonic;

use crate::config::{TEMPERATURE_HIGH_C, TEMPERATURE_LOW_C};

/// Where a water temperature sits relative to the safe band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    TooLow,
    Normal,
    TooHigh,
}

impl TemperatureBand {
    /// The band limits themselves count as normal
    pub fn of(celsius: f32) -> TemperatureBand {
        if celsius < TEMPERATURE_LOW_C {
            TemperatureBand::TooLow
        } else if celsius > TEMPERATURE_HIGH_C {
            TemperatureBand::TooHigh
        } else {
            TemperatureBand::Normal
        }
    }
}
