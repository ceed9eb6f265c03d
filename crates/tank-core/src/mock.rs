//! Test doubles for pins, time, the console and the rig hardware

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::alert::AlertSignal;
use crate::error::{ActuatorError, SensorError};
use crate::hardware::TankHardware;
use crate::motor::MotorCommand;
use crate::sensors::thermistor::AnalogInput;
use crate::seven_segment::Indicator;
use crate::timer::Clock;

/// Nanosecond clock advanced by fake delays and pin reads
#[derive(Debug, Default)]
pub struct FakeClock {
    now_ns: Cell<u64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }

    pub fn advance_us(&self, us: u64) {
        self.advance_ns(us * 1_000);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_ns(ms * 1_000_000);
    }
}

impl Clock for FakeClock {
    fn now_us(&self) -> u64 {
        self.now_ns.get() / 1_000
    }
}

/// Delay that moves the fake clock forward instead of sleeping
#[derive(Clone, Copy)]
pub struct FakeDelay<'a> {
    clock: &'a FakeClock,
}

impl<'a> FakeDelay<'a> {
    pub fn new(clock: &'a FakeClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for FakeDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(ns.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PinEvent {
    Level(&'static str, bool),
    Duty(&'static str, u16),
}

/// Ordered record of every write to the fake output pins sharing it
#[derive(Debug, Clone, Default)]
pub struct PinLog {
    events: Rc<RefCell<Vec<PinEvent>>>,
}

impl PinLog {
    fn push(&self, event: PinEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn levels(&self, pin: &str) -> Vec<bool> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                PinEvent::Level(name, level) if *name == pin => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn duties(&self, pin: &str) -> Vec<u16> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                PinEvent::Duty(name, duty) if *name == pin => Some(*duty),
                _ => None,
            })
            .collect()
    }

    pub fn last_level(&self, pin: &str) -> Option<bool> {
        self.levels(pin).last().copied()
    }

    pub fn last_name(&self) -> Option<&'static str> {
        self.events.borrow().last().map(|event| match event {
            PinEvent::Level(name, _) | PinEvent::Duty(name, _) => *name,
        })
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

pub struct FakePin {
    name: &'static str,
    log: PinLog,
}

impl FakePin {
    pub fn new(name: &'static str, log: &PinLog) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(PinEvent::Level(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(PinEvent::Level(self.name, true));
        Ok(())
    }
}

/// PWM channel whose duty range matches the 0-255 motor scale
pub struct FakePwm {
    name: &'static str,
    log: PinLog,
}

impl FakePwm {
    pub fn new(name: &'static str, log: &PinLog) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }
}

impl embedded_hal::pwm::ErrorType for FakePwm {
    type Error = Infallible;
}

impl SetDutyCycle for FakePwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.log.push(PinEvent::Duty(self.name, duty));
        Ok(())
    }
}

/// Echo line repeating `low_reads` low reads then `high_reads` high reads.
/// Every read advances the clock by `step_us`.
pub struct FakeEcho<'a> {
    clock: &'a FakeClock,
    low_reads: u32,
    high_reads: u32,
    step_us: u64,
    position: u32,
}

impl<'a> FakeEcho<'a> {
    pub fn new(clock: &'a FakeClock, low_reads: u32, high_reads: u32, step_us: u64) -> Self {
        Self {
            clock,
            low_reads,
            high_reads,
            step_us,
            position: 0,
        }
    }

    /// An echo line that never rises
    pub fn silent(clock: &'a FakeClock, step_us: u64) -> Self {
        Self::new(clock, 1, 0, step_us)
    }

    fn read(&mut self) -> bool {
        let period = self.low_reads + self.high_reads;
        let high = self.position % period >= self.low_reads;
        self.position = self.position.wrapping_add(1);
        self.clock.advance_us(self.step_us);
        high
    }
}

impl ErrorType for FakeEcho<'_> {
    type Error = Infallible;
}

impl InputPin for FakeEcho<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read())
    }
}

/// ADC returning a fixed sequence of raw counts, repeating the last one
pub struct FakeAdc {
    values: VecDeque<Result<u16, SensorError>>,
    last: Result<u16, SensorError>,
}

impl FakeAdc {
    pub fn constant(raw: u16) -> Self {
        Self {
            values: VecDeque::new(),
            last: Ok(raw),
        }
    }

    pub fn sequence(values: &[Result<u16, SensorError>]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            last: Err(SensorError::Adc),
        }
    }
}

impl AnalogInput for FakeAdc {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        if let Some(value) = self.values.pop_front() {
            self.last = value;
        }
        self.last
    }
}

/// Serial console with scripted operator input and captured output
#[derive(Debug, Default)]
pub struct FakeSerial {
    input: VecDeque<u8>,
    output: Vec<u8>,
    /// Readiness checks that report no input before the queue shows up
    quiet_polls: usize,
}

impl FakeSerial {
    pub fn with_input(input: &str) -> Self {
        Self {
            input: input.bytes().collect(),
            ..Self::default()
        }
    }

    /// Keeps the queued input hidden from the next `polls` readiness checks,
    /// as if the operator typed it later
    pub fn hold_input_for_polls(&mut self, polls: usize) {
        self.quiet_polls = polls;
    }

    pub fn push_input(&mut self, input: &str) {
        self.input.extend(input.bytes());
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl embedded_io::ErrorType for FakeSerial {
    type Error = Infallible;
}

impl embedded_io::Read for FakeSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;
        while count < buf.len() {
            match self.input.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl embedded_io::ReadReady for FakeSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.quiet_polls > 0 {
            self.quiet_polls -= 1;
            return Ok(false);
        }
        Ok(!self.input.is_empty())
    }
}

impl embedded_io::Write for FakeSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Rig stand-in: scripted sensor readings, recorded actuator commands.
/// Each operation takes a fixed slice of fake time.
pub struct FakeHardware<'a> {
    pub clock: &'a FakeClock,
    pub gaps: VecDeque<Result<f32, SensorError>>,
    pub temperature_c: Result<f32, SensorError>,
    pub motor: Vec<MotorCommand>,
    pub display: Vec<(String, Indicator)>,
    pub blanked: usize,
    pub alerts: Vec<AlertSignal>,
    pub silenced: usize,
    /// Fake milliseconds spent in each sensor read
    pub sensor_ms: u64,
}

impl<'a> FakeHardware<'a> {
    pub fn new(clock: &'a FakeClock) -> Self {
        Self {
            clock,
            gaps: VecDeque::new(),
            temperature_c: Ok(25.0),
            motor: Vec::new(),
            display: Vec::new(),
            blanked: 0,
            alerts: Vec::new(),
            silenced: 0,
            sensor_ms: 1000,
        }
    }

    pub fn with_gaps(clock: &'a FakeClock, gaps: &[f32]) -> Self {
        let mut hardware = Self::new(clock);
        hardware.gaps = gaps.iter().map(|gap| Ok(*gap)).collect();
        hardware
    }
}

impl TankHardware for FakeHardware<'_> {
    fn gap_cm(&mut self) -> Result<f32, SensorError> {
        self.clock.advance_ms(self.sensor_ms);
        self.gaps.pop_front().unwrap_or(Err(SensorError::EchoTimeout))
    }

    fn temperature_c(&mut self) -> Result<f32, SensorError> {
        self.clock.advance_ms(self.sensor_ms / 2);
        self.temperature_c
    }

    fn drive_pump(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        self.motor.push(command);
        Ok(())
    }

    fn show(&mut self, text: &str, indicator: Indicator) -> Result<(), ActuatorError> {
        self.clock.advance_ms(1000);
        self.display.push((String::from(text), indicator));
        Ok(())
    }

    fn blank_display(&mut self) -> Result<(), ActuatorError> {
        self.blanked += 1;
        Ok(())
    }

    fn signal(&mut self, signal: AlertSignal) -> Result<(), ActuatorError> {
        self.alerts.push(signal);
        Ok(())
    }

    fn silence_alerts(&mut self) -> Result<(), ActuatorError> {
        self.silenced += 1;
        Ok(())
    }
}
