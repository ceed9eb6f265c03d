//! The polling loop: sense, classify, alert, pump, display, record

use core::fmt::Write;

use embedded_io::{Read, ReadReady, Write as SerialWrite};
use log::{info, warn};

use crate::alert::{rate_exceeds_limit, AlertSignal, StateAlert};
use crate::config::STATE_ALERT_HOLD_S;
use crate::console::Console;
use crate::error::{ConsoleError, SensorError};
use crate::hardware::{actuate, TankHardware};
use crate::history::{History, Sample};
use crate::motor::{MotorCommand, PumpCommand, Speed};
use crate::preferences::Preferences;
use crate::rendering::{banner, format_fixed, progress_bar};
use crate::sensors::TemperatureBand;
use crate::seven_segment::Indicator;
use crate::tank::{Reading, TankState};
use crate::timer::{seconds_between, Clock};

/// Display text is at most a volume or a duration plus unit
const DISPLAY_TEXT: usize = 16;

/// What one completed polling cycle measured and did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub temperature_c: f32,
    pub reading: Reading,
    pub held_s: f32,
    pub state_alert: StateAlert,
    pub elapsed_s: f32,
    pub rate_l_per_s: Option<f32>,
    /// Full speed pump override applied against a fault
    pub fault_response: Option<PumpCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// A sensor failed; nothing was recorded for this cycle
    Skipped(SensorError),
}

/// Runs polling sessions and keeps the last session's samples
#[derive(Debug, Default)]
pub struct TankMonitor {
    history: History,
    /// Time spent in skipped cycles since the last recorded sample
    skipped_s: f32,
}

impl TankMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Polls until the operator presses Ctrl+C, then runs the cleanup.
    /// Each session starts with an empty history.
    pub fn run<H, K, IO>(
        &mut self,
        hardware: &mut H,
        preferences: &Preferences,
        clock: &K,
        console: &mut Console<IO>,
    ) -> Result<(), ConsoleError>
    where
        H: TankHardware,
        K: Clock,
        IO: Read + SerialWrite + ReadReady,
    {
        banner(console, "POLLING LOOP")?;
        writeln!(console, "[CTRL+C to return to system menu]\n\nPolling...")?;
        info!("polling session started");

        self.history.clear();
        self.skipped_s = 0.0;
        let session_start_ms = clock.now_ms();
        while !console.poll_interrupt()? {
            self.poll_cycle(hardware, preferences, clock, console)?;
        }
        self.cleanup(hardware, clock, console, session_start_ms)
    }

    /// One pass of the polling loop
    pub fn poll_cycle<H, K, W>(
        &mut self,
        hardware: &mut H,
        preferences: &Preferences,
        clock: &K,
        out: &mut W,
    ) -> Result<CycleOutcome, ConsoleError>
    where
        H: TankHardware,
        K: Clock,
        W: Write,
    {
        let start_ms = clock.now_ms();

        let temperature_c = match hardware.temperature_c() {
            Ok(celsius) => celsius,
            Err(e) => return self.skip(out, "thermistor", e, seconds_between(start_ms, clock.now_ms())),
        };
        writeln!(out, "Current temperature in the water tank is {:.2} degree celsius", temperature_c)?;
        match TemperatureBand::of(temperature_c) {
            TemperatureBand::TooLow => writeln!(out, "WARNING: Temperature is too low")?,
            TemperatureBand::TooHigh => writeln!(out, "WARNING: Temperature is too high")?,
            TemperatureBand::Normal => {}
        }

        let gap_cm = match hardware.gap_cm() {
            Ok(gap) => gap,
            Err(e) => return self.skip(out, "ultrasonic", e, seconds_between(start_ms, clock.now_ms())),
        };
        let reading = Reading::from_gap(gap_cm, preferences);
        if reading.state == TankState::Empty {
            writeln!(out, "Tank is completely empty")?;
        }
        writeln!(out, "\nTank Water Volume: {:.4}\nTank State: {}", reading.volume_l, reading.state.label())?;
        if reading.state == TankState::Overfull {
            writeln!(
                out,
                "|| WARNING: Tank water level exceeds measurement range. Please inspect tank for overflows. ||"
            )?;
        }

        let held_s = self
            .history
            .state_held_s(reading.state, self.skipped_s + seconds_between(start_ms, clock.now_ms()));
        let state_alert = StateAlert::evaluate(reading.state, held_s);
        if state_alert == StateAlert::Sustained {
            warn!("tank {} for {}s", reading.state.label(), held_s);
            writeln!(
                out,
                "|| WARNING: The tank has been {} for more than {}s ||",
                reading.state.label(),
                STATE_ALERT_HOLD_S
            )?;
        }
        actuate(hardware.signal(AlertSignal::TankState(state_alert)));

        actuate(hardware.drive_pump(reading.state.pump_command().resolve(preferences)));

        let text = format_fixed::<DISPLAY_TEXT>(reading.volume_l, 2, "L");
        actuate(hardware.show(&text, reading.state.indicator()));

        let elapsed_s = seconds_between(start_ms, clock.now_ms());
        writeln!(out, "----------------------------------------------")?;
        writeln!(out, "LOOP COMPLETE. Time taken: {:.4}s", elapsed_s)?;
        if elapsed_s > preferences.polling_max_s as f32 || elapsed_s < preferences.polling_min_s as f32 {
            writeln!(out, "|| WARNING: Elapsed time out of reasonable range. ||")?;
        }
        // Rates and history span the real time since the last recorded sample
        let interval_s = self.skipped_s + elapsed_s;
        self.skipped_s = 0.0;
        writeln!(out, "Total Polling time = {:.2}s", self.history.total_s() + interval_s)?;

        let rate_l_per_s = self.history.rate_for(reading.volume_l, interval_s);
        let fault_response = match rate_l_per_s {
            None => {
                writeln!(out, "Rate of volume change: INSUFFICIENT DATA. Must have at least 2 polled values.")?;
                None
            }
            Some(rate) => Self::check_rate(hardware, preferences, out, rate)?,
        };

        self.history.push(Sample {
            elapsed_s: interval_s,
            volume_l: reading.volume_l,
            level_cm: reading.level_cm,
            rate_l_per_s,
            state: reading.state,
        });

        Ok(CycleOutcome::Completed(CycleReport {
            temperature_c,
            reading,
            held_s,
            state_alert,
            elapsed_s,
            rate_l_per_s,
            fault_response,
        }))
    }

    /// Rate of change alert. A fault runs the pump at full speed against
    /// the trend.
    fn check_rate<H: TankHardware, W: Write>(
        hardware: &mut H,
        preferences: &Preferences,
        out: &mut W,
        rate: f32,
    ) -> Result<Option<PumpCommand>, ConsoleError> {
        writeln!(out, "Rate of volume change: {:.4}L/s", rate)?;
        let exceeded = rate_exceeds_limit(rate);
        actuate(hardware.signal(AlertSignal::RateOfChange { exceeded }));
        if !exceeded {
            return Ok(None);
        }

        writeln!(
            out,
            "\n|| WARNING: Volume change rate exceeds normal range. Please check for tank leaks/damages. ||"
        )?;
        writeln!(out, "SUSPECTED FAULTS DETECTED")?;
        let response = if rate > 0.0 {
            writeln!(out, "Water is draining in too fast.")?;
            PumpCommand::Drain(Speed::Full)
        } else {
            writeln!(out, "Water is draining out too fast.")?;
            PumpCommand::Fill(Speed::Full)
        };
        actuate(hardware.drive_pump(response.resolve(preferences)));
        Ok(Some(response))
    }

    fn skip<W: Write>(
        &mut self,
        out: &mut W,
        sensor: &str,
        error: SensorError,
        elapsed_s: f32,
    ) -> Result<CycleOutcome, ConsoleError> {
        self.skipped_s += elapsed_s;
        warn!("{} read failed: {}", sensor, error);
        writeln!(out, "SENSOR FAULT: {} read failed ({}). Skipping this cycle.", sensor, error)?;
        Ok(CycleOutcome::Skipped(error))
    }

    fn cleanup<H, K, W>(
        &mut self,
        hardware: &mut H,
        clock: &K,
        out: &mut W,
        session_start_ms: u64,
    ) -> Result<(), ConsoleError>
    where
        H: TankHardware,
        K: Clock,
        W: Write,
    {
        writeln!(out, "\nKEYBOARD INTERRUPT DETECTED: Terminating polling loop...\n")?;
        actuate(hardware.drive_pump(MotorCommand::Stop));
        actuate(hardware.silence_alerts());

        let total_s = seconds_between(session_start_ms, clock.now_ms());
        info!("polling session ended after {}s", total_s);
        writeln!(out, "Total elapsed time: {:.2}s", total_s)?;
        let text = format_fixed::<DISPLAY_TEXT>(total_s, 2, "s");
        actuate(hardware.show(&text, Indicator::Off));
        actuate(hardware.blank_display());

        writeln!(out, "Returning to System Menu...\n")?;
        progress_bar(out, 100)?;
        Ok(())
    }
}
