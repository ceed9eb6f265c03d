use core::fmt;

use crate::console::{parse_bounded_pwm, parse_positive_int, parse_positive_real, Bound};
use crate::error::InputError;

/// Preferences defines the operator-selected system parameters.
/// tank_base_area_cm2: Inner base area of the tank
/// tank_height_cm: Distance from the ultrasonic sensor face to the tank floor
/// max_tank_volume_l: Volume treated as 100% full
/// motor_speed_low / motor_speed_high: PWM duty (0-255) for the pump speeds
/// polling_min_s / polling_max_s: Expected bounds on one polling cycle
/// observation_s: Length of the data observation window
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub tank_base_area_cm2: f32,
    pub tank_height_cm: f32,
    pub max_tank_volume_l: f32,
    pub motor_speed_low: u8,
    pub motor_speed_high: u8,
    pub polling_min_s: u32,
    pub polling_max_s: u32,
    pub observation_s: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            tank_base_area_cm2: 24.0 * 24.0,
            tank_height_cm: 21.0,
            max_tank_volume_l: 10.0,
            motor_speed_low: 90,
            motor_speed_high: 250,
            polling_min_s: 1,
            polling_max_s: 5,
            observation_s: 20,
        }
    }
}

/// One editable system parameter, numbered as on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    TankBaseArea,
    TankHeight,
    MaxTankVolume,
    MotorSpeedLow,
    MotorSpeedHigh,
    PollingMin,
    PollingMax,
    ObservationDuration,
}

impl Parameter {
    pub const ALL: [Parameter; 8] = [
        Parameter::TankBaseArea,
        Parameter::TankHeight,
        Parameter::MaxTankVolume,
        Parameter::MotorSpeedLow,
        Parameter::MotorSpeedHigh,
        Parameter::PollingMin,
        Parameter::PollingMax,
        Parameter::ObservationDuration,
    ];

    /// Menu numbers start at 1
    pub fn from_choice(choice: u32) -> Option<Parameter> {
        let index = usize::try_from(choice).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Parameter::TankBaseArea => "TANK BASE AREA",
            Parameter::TankHeight => "TANK HEIGHT",
            Parameter::MaxTankVolume => "MAX. TANK VOLUME",
            Parameter::MotorSpeedLow => "MOTOR SPEED (LOW)",
            Parameter::MotorSpeedHigh => "MOTOR SPEED (HIGH)",
            Parameter::PollingMin => "MIN. POLLING RATE",
            Parameter::PollingMax => "MAX. POLLING RATE",
            Parameter::ObservationDuration => "OBSERVATION DURATION",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::TankBaseArea => "cm^2",
            Parameter::TankHeight => "cm",
            Parameter::MaxTankVolume => "L",
            Parameter::MotorSpeedLow | Parameter::MotorSpeedHigh => "PWM",
            Parameter::PollingMin | Parameter::PollingMax | Parameter::ObservationDuration => "s",
        }
    }
}

/// A parameter value as shown to the operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Real(f32),
    Whole(u32),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Real(value) => write!(f, "{}", value),
            ParameterValue::Whole(value) => write!(f, "{}", value),
        }
    }
}

/// Record of an accepted parameter edit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub parameter: Parameter,
    pub old: ParameterValue,
    pub new: ParameterValue,
}

impl fmt::Display for ParameterChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.parameter.unit();
        write!(
            f,
            "Changed {} from {}{} to {}{}",
            self.parameter.name(),
            self.old,
            unit,
            self.new,
            unit
        )
    }
}

impl Preferences {
    pub fn value(&self, parameter: Parameter) -> ParameterValue {
        match parameter {
            Parameter::TankBaseArea => ParameterValue::Real(self.tank_base_area_cm2),
            Parameter::TankHeight => ParameterValue::Real(self.tank_height_cm),
            Parameter::MaxTankVolume => ParameterValue::Real(self.max_tank_volume_l),
            Parameter::MotorSpeedLow => ParameterValue::Whole(self.motor_speed_low.into()),
            Parameter::MotorSpeedHigh => ParameterValue::Whole(self.motor_speed_high.into()),
            Parameter::PollingMin => ParameterValue::Whole(self.polling_min_s),
            Parameter::PollingMax => ParameterValue::Whole(self.polling_max_s),
            Parameter::ObservationDuration => ParameterValue::Whole(self.observation_s),
        }
    }

    /// Validates operator input for a parameter and stores it.
    /// Paired limits (motor LOW/HIGH, polling min/max) are checked against
    /// the current value of their partner.
    pub fn apply(&mut self, parameter: Parameter, input: &str) -> Result<ParameterChange, InputError> {
        let old = self.value(parameter);
        match parameter {
            Parameter::TankBaseArea => self.tank_base_area_cm2 = parse_positive_real(input)?,
            Parameter::TankHeight => self.tank_height_cm = parse_positive_real(input)?,
            Parameter::MaxTankVolume => self.max_tank_volume_l = parse_positive_real(input)?,
            Parameter::MotorSpeedLow => {
                self.motor_speed_low =
                    parse_bounded_pwm(input, Bound::AtMost(self.motor_speed_high.into()))?
            }
            Parameter::MotorSpeedHigh => {
                self.motor_speed_high =
                    parse_bounded_pwm(input, Bound::AtLeast(self.motor_speed_low.into()))?
            }
            Parameter::PollingMin => {
                self.polling_min_s = parse_positive_int(input, Bound::AtMost(self.polling_max_s))?
            }
            Parameter::PollingMax => {
                self.polling_max_s = parse_positive_int(input, Bound::AtLeast(self.polling_min_s))?
            }
            Parameter::ObservationDuration => {
                self.observation_s = parse_positive_int(input, Bound::Unbounded)?
            }
        }
        Ok(ParameterChange {
            parameter,
            old,
            new: self.value(parameter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_rig() {
        let preferences = Preferences::default();
        assert_eq!(preferences.tank_base_area_cm2, 576.0);
        assert_eq!(preferences.motor_speed_low, 90);
        assert_eq!(preferences.motor_speed_high, 250);
        assert_eq!(preferences.observation_s, 20);
    }

    #[test]
    fn parameters_are_numbered_from_one() {
        assert_eq!(Parameter::from_choice(1), Some(Parameter::TankBaseArea));
        assert_eq!(Parameter::from_choice(8), Some(Parameter::ObservationDuration));
        assert_eq!(Parameter::from_choice(0), None);
        assert_eq!(Parameter::from_choice(9), None);
    }

    #[test]
    fn applies_real_parameter() {
        let mut preferences = Preferences::default();
        let change = preferences.apply(Parameter::TankHeight, "25.5").unwrap();
        assert_eq!(preferences.tank_height_cm, 25.5);
        assert_eq!(change.old, ParameterValue::Real(21.0));
        assert_eq!(
            std::format!("{}", change),
            "Changed TANK HEIGHT from 21cm to 25.5cm"
        );
    }

    #[test]
    fn rejects_non_positive_values() {
        let mut preferences = Preferences::default();
        assert_eq!(
            preferences.apply(Parameter::MaxTankVolume, "0"),
            Err(InputError::NotPositive)
        );
        assert_eq!(
            preferences.apply(Parameter::MaxTankVolume, "lots"),
            Err(InputError::NotNumber)
        );
        assert_eq!(preferences.max_tank_volume_l, 10.0);
    }

    #[test]
    fn motor_speeds_stay_ordered_and_in_pwm_range() {
        let mut preferences = Preferences::default();
        assert_eq!(
            preferences.apply(Parameter::MotorSpeedLow, "251"),
            Err(InputError::AboveMaximum { max: 250 })
        );
        assert_eq!(
            preferences.apply(Parameter::MotorSpeedLow, "20"),
            Err(InputError::PwmRange)
        );
        assert_eq!(
            preferences.apply(Parameter::MotorSpeedHigh, "80"),
            Err(InputError::BelowMinimum { min: 90 })
        );
        assert_eq!(
            preferences.apply(Parameter::MotorSpeedHigh, "300"),
            Err(InputError::PwmRange)
        );
        preferences.apply(Parameter::MotorSpeedHigh, "255").unwrap();
        preferences.apply(Parameter::MotorSpeedLow, "255").unwrap();
        assert_eq!((preferences.motor_speed_low, preferences.motor_speed_high), (255, 255));
    }

    #[test]
    fn polling_bounds_stay_ordered() {
        let mut preferences = Preferences::default();
        assert_eq!(
            preferences.apply(Parameter::PollingMin, "6"),
            Err(InputError::AboveMaximum { max: 5 })
        );
        assert_eq!(
            preferences.apply(Parameter::PollingMax, "2.5"),
            Err(InputError::NotInteger)
        );
        let change = preferences.apply(Parameter::PollingMax, "8").unwrap();
        assert_eq!(change.new, ParameterValue::Whole(8));
        preferences.apply(Parameter::PollingMin, "6").unwrap();
        assert_eq!(preferences.polling_min_s, 6);
    }
}
