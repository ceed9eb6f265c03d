//! Bidirectional pump motor behind an L293D driver
//!
//! Clockwise runs the inlet (fill), anticlockwise runs the outlet (drain).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::info;

use crate::config::{MOTOR_FULL_SPEED, MOTOR_SETTLE_MS};
use crate::error::ActuatorError;
use crate::hardware::PumpDrive;
use crate::preferences::Preferences;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Low,
    High,
    Full,
}

impl Speed {
    /// PWM duty (0-255) for this speed under the current preferences
    pub fn duty(self, preferences: &Preferences) -> u8 {
        match self {
            Speed::Low => preferences.motor_speed_low,
            Speed::High => preferences.motor_speed_high,
            Speed::Full => MOTOR_FULL_SPEED,
        }
    }
}

/// What the pump should do, independent of wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpCommand {
    Fill(Speed),
    Drain(Speed),
    Stop,
}

impl PumpCommand {
    pub fn resolve(self, preferences: &Preferences) -> MotorCommand {
        match self {
            PumpCommand::Fill(speed) => MotorCommand::Clockwise(speed.duty(preferences)),
            PumpCommand::Drain(speed) => MotorCommand::Anticlockwise(speed.duty(preferences)),
            PumpCommand::Stop => MotorCommand::Stop,
        }
    }
}

/// Direction and PWM duty as applied to the driver pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    Clockwise(u8),
    Anticlockwise(u8),
    Stop,
}

/// L293D half of a dual H-bridge: EN12 takes PWM, 1A/2A pick the direction
pub struct Motor<EN, A1, A2, D> {
    enable: EN,
    input_1a: A1,
    input_2a: A2,
    delay: D,
}

impl<EN, A1, A2, D> Motor<EN, A1, A2, D>
where
    EN: SetDutyCycle,
    A1: OutputPin,
    A2: OutputPin,
    D: DelayNs,
{
    /// Takes the driver pins and leaves the motor stopped
    pub fn new(enable: EN, input_1a: A1, input_2a: A2, delay: D) -> Result<Self, ActuatorError> {
        let mut motor = Self {
            enable,
            input_1a,
            input_2a,
            delay,
        };
        motor.enable.set_duty_cycle_fully_off().map_err(|_| ActuatorError::Motor)?;
        motor.input_1a.set_low().map_err(|_| ActuatorError::Motor)?;
        motor.input_2a.set_low().map_err(|_| ActuatorError::Motor)?;
        info!("MOTOR setup complete.");
        Ok(motor)
    }

    pub fn clockwise(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.input_1a.set_low().map_err(|_| ActuatorError::Motor)?;
        self.input_2a.set_high().map_err(|_| ActuatorError::Motor)?;
        info!("PUMP ACTIVATED: Motor turning CLOCKWISE at duty {}", duty);
        self.run(duty)
    }

    pub fn anticlockwise(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.input_1a.set_high().map_err(|_| ActuatorError::Motor)?;
        self.input_2a.set_low().map_err(|_| ActuatorError::Motor)?;
        info!("PUMP ACTIVATED: Motor turning ANTICLOCKWISE at duty {}", duty);
        self.run(duty)
    }

    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.enable.set_duty_cycle_fully_off().map_err(|_| ActuatorError::Motor)?;
        self.delay.delay_ms(MOTOR_SETTLE_MS);
        info!("PUMP DEACTIVATED: Motor stopped");
        Ok(())
    }

    fn run(&mut self, duty: u8) -> Result<(), ActuatorError> {
        // Let the bridge settle on the new direction before powering it
        self.delay.delay_ms(MOTOR_SETTLE_MS);
        self.enable
            .set_duty_cycle_fraction(duty.into(), u8::MAX.into())
            .map_err(|_| ActuatorError::Motor)
    }
}

impl<EN, A1, A2, D> PumpDrive for Motor<EN, A1, A2, D>
where
    EN: SetDutyCycle,
    A1: OutputPin,
    A2: OutputPin,
    D: DelayNs,
{
    fn drive(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        match command {
            MotorCommand::Clockwise(duty) => self.clockwise(duty),
            MotorCommand::Anticlockwise(duty) => self.anticlockwise(duty),
            MotorCommand::Stop => self.stop(),
        }
    }
}
