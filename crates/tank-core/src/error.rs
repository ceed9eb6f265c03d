//! Error types shared across the rig

use thiserror_no_std::Error;

/// Failures reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("no ultrasonic echo before timeout")]
    EchoTimeout,
    #[error("sensor pin access failed")]
    Pin,
    #[error("ADC conversion failed")]
    Adc,
    #[error("reading outside the measurable range")]
    OutOfRange,
}

/// Failures driving an output device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("motor driver did not accept the command")]
    Motor,
    #[error("seven segment display write failed")]
    Display,
    #[error("alert output write failed")]
    Alert,
}

/// Console I/O outcome that aborts the current prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Operator pressed Ctrl+C
    #[error("keyboard interrupt")]
    Interrupted,
    #[error("console read failed")]
    Read,
    #[error("console write failed")]
    Write,
}

impl From<core::fmt::Error> for ConsoleError {
    fn from(_: core::fmt::Error) -> Self {
        ConsoleError::Write
    }
}

/// Rejected operator input. The message is what the operator sees before
/// being asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("INVALID INPUT: Detected non-integer input. Please try again.")]
    NotInteger,
    #[error("INVALID INPUT: Detected non-numerical input. Please try again.")]
    NotNumber,
    #[error("INVALID INPUT: Input must be greater than 0. Please try again.")]
    NotPositive,
    #[error("INVALID INPUT: Input out of acceptable range. Please try again.")]
    OutOfRange,
    #[error("INVALID INPUT: Detected numerical input. Please try again.")]
    NumericText,
    #[error("INVALID INPUT: Input out of acceptable values. Please try again.")]
    NotAccepted,
    #[error("Minimum value must be lesser than the Maximum Value of {max}. Please try again.")]
    AboveMaximum { max: u32 },
    #[error("Maximum value must be greater than the Minimum Value of {min}. Please try again.")]
    BelowMinimum { min: u32 },
    #[error("Value must be within the range of 30-255 pwm. Please try again.")]
    PwmRange,
}
