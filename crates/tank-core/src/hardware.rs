//! Device seams between the polling loop and the board
//!
//! Each driver implements one of the small traits below; [`Rig`] bundles the
//! five devices and exposes them to the loop and the menu as a single
//! [`TankHardware`].

use log::warn;

use crate::alert::AlertSignal;
use crate::error::{ActuatorError, SensorError};
use crate::motor::MotorCommand;
use crate::seven_segment::Indicator;

/// Actuator failures are reported but never stop the caller
pub(crate) fn actuate(result: Result<(), ActuatorError>) {
    if let Err(e) = result {
        warn!("actuator fault: {}", e);
    }
}

/// Gap between the sensor face and the water surface
pub trait DistanceSensor {
    fn gap_cm(&mut self) -> Result<f32, SensorError>;
}

pub trait TemperatureSensor {
    fn temperature_c(&mut self) -> Result<f32, SensorError>;
}

pub trait PumpDrive {
    fn drive(&mut self, command: MotorCommand) -> Result<(), ActuatorError>;
}

pub trait SegmentDisplay {
    /// Shows `text`, scrolling if needed, with the state indicator lit
    fn show(&mut self, text: &str, indicator: Indicator) -> Result<(), ActuatorError>;
    fn blank(&mut self) -> Result<(), ActuatorError>;
}

pub trait AlertOutputs {
    fn signal(&mut self, signal: AlertSignal) -> Result<(), ActuatorError>;
    fn silence(&mut self) -> Result<(), ActuatorError>;
}

/// Everything the polling loop and the menu touch on the board
pub trait TankHardware {
    fn gap_cm(&mut self) -> Result<f32, SensorError>;
    fn temperature_c(&mut self) -> Result<f32, SensorError>;
    fn drive_pump(&mut self, command: MotorCommand) -> Result<(), ActuatorError>;
    fn show(&mut self, text: &str, indicator: Indicator) -> Result<(), ActuatorError>;
    fn blank_display(&mut self) -> Result<(), ActuatorError>;
    fn signal(&mut self, signal: AlertSignal) -> Result<(), ActuatorError>;
    fn silence_alerts(&mut self) -> Result<(), ActuatorError>;
}

/// The tank rig's five devices
pub struct Rig<S, T, P, V, A> {
    pub sonar: S,
    pub thermometer: T,
    pub pump: P,
    pub display: V,
    pub alerts: A,
}

impl<S, T, P, V, A> TankHardware for Rig<S, T, P, V, A>
where
    S: DistanceSensor,
    T: TemperatureSensor,
    P: PumpDrive,
    V: SegmentDisplay,
    A: AlertOutputs,
{
    fn gap_cm(&mut self) -> Result<f32, SensorError> {
        self.sonar.gap_cm()
    }

    fn temperature_c(&mut self) -> Result<f32, SensorError> {
        self.thermometer.temperature_c()
    }

    fn drive_pump(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        self.pump.drive(command)
    }

    fn show(&mut self, text: &str, indicator: Indicator) -> Result<(), ActuatorError> {
        self.display.show(text, indicator)
    }

    fn blank_display(&mut self) -> Result<(), ActuatorError> {
        self.display.blank()
    }

    fn signal(&mut self, signal: AlertSignal) -> Result<(), ActuatorError> {
        self.alerts.signal(signal)
    }

    fn silence_alerts(&mut self) -> Result<(), ActuatorError> {
        self.alerts.silence()
    }
}
