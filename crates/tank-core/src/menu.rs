//! Operator menu over the serial console
//!
//! Startup and account selection, then the system menu with its tank
//! operation, settings, data observation, admin and quit options. Ctrl+C in
//! a submenu returns to the system menu; at the system menu it offers to quit.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write as SerialWrite};
use heapless::String;
use log::info;

use crate::access::{AccessControl, PasswordCheck};
use crate::config::{LOCKOUT_MS, LOCKOUT_REPORT_MS, TEMP_ADMIN_MS};
use crate::console::{parse_choice, parse_positive_int, parse_yes_no, Bound, Console, Line};
use crate::error::{ConsoleError, InputError};
use crate::hardware::{actuate, TankHardware};
use crate::history::Series;
use crate::motor::MotorCommand;
use crate::operations::TankMonitor;
use crate::preferences::{Parameter, Preferences};
use crate::rendering::{banner, chart, options, parameter_table, progress_bar};
use crate::seven_segment::Indicator;
use crate::timer::Clock;

/// Lockout countdown polling step
const LOCKOUT_POLL_MS: u32 = 100;

const SYSTEM_MENU: [&str; 5] = [
    "tank operation",
    "system settings",
    "data observation",
    "admin access",
    "quit program",
];

const ADMIN_MENU: [&str; 4] = [
    "display system password",
    "update system parameters",
    "override lockout status",
    "return to system menu",
];

const OBSERVATION_MENU: [&str; 4] = [
    "Water Volume against Time",
    "Rate of Change of Water Volume against Time",
    "Water Level against Time",
    "return to system menu",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Keys and passwords are entered as whole numbers
fn whole_number(input: &str) -> Result<Line, InputError> {
    parse_positive_int(input, Bound::Unbounded)?;
    let mut text = Line::new();
    text.push_str(input).map_err(|_| InputError::OutOfRange)?;
    Ok(text)
}

/// The whole rig as the operator sees it
pub struct SystemMenu<H, K, D> {
    hardware: H,
    clock: K,
    delay: D,
    preferences: Preferences,
    access: AccessControl,
    monitor: TankMonitor,
}

impl<H, K, D> SystemMenu<H, K, D>
where
    H: TankHardware,
    K: Clock,
    D: DelayNs,
{
    pub fn new(hardware: H, clock: K, delay: D) -> Self {
        Self {
            hardware,
            clock,
            delay,
            preferences: Preferences::default(),
            access: AccessControl::new(),
            monitor: TankMonitor::new(),
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Runs from startup until the operator quits
    pub fn run<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        match self.start_up(console) {
            Err(ConsoleError::Interrupted) => {
                writeln!(console, "\nKEYBOARD INTERRUPT DETECTED: Loading system menu.")?
            }
            result => result?,
        }

        loop {
            let flow = match self.system_menu(console) {
                Err(ConsoleError::Interrupted) => self.confirm_quit(console)?,
                result => result?,
            };
            if flow == Flow::Quit {
                return self.end_program(console);
            }
        }
    }

    fn return_to_menu<W: Write>(out: &mut W) -> Result<(), ConsoleError> {
        writeln!(out, "\nReturning to system menu...\n")?;
        progress_bar(out, 100)?;
        Ok(())
    }

    /// Ctrl+C inside a submenu lands back on the system menu
    fn back_on_interrupt<W: Write>(out: &mut W, result: Result<(), ConsoleError>) -> Result<(), ConsoleError> {
        match result {
            Err(ConsoleError::Interrupted) => {
                writeln!(out, "\nKEYBOARD INTERRUPT DETECTED: Returning to system menu.")?;
                progress_bar(out, 100)?;
                Ok(())
            }
            other => other,
        }
    }

    /// Revokes an expired temporary admin session, telling the operator
    fn refresh_admin<W: Write>(&mut self, out: &mut W) -> Result<(), ConsoleError> {
        if self.access.expire_session(self.clock.now_ms()) {
            writeln!(out, "Temporary admin access has been revoked")?;
        }
        Ok(())
    }

    pub fn start_up<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        banner(console, "TANK MONITORING SYSTEM")?;
        writeln!(console, "System starting up...\n")?;
        progress_bar(console, 100)?;
        writeln!(console, "ULTRASONIC SENSOR setup complete.")?;
        writeln!(console, "THERMISTOR setup complete.")?;
        writeln!(console, "\n\nSYSTEM START UP SUCCESSFUL. Displaying system parameters.")?;
        actuate(self.hardware.show("WELCOME", Indicator::Off));

        banner(console, "DEFAULT SYSTEM PARAMETERS")?;
        parameter_table(console, &self.preferences)?;

        banner(console, "USER ACCOUNT SELECTION")?;
        writeln!(console, "1 guest user\n2 admin")?;
        let account = console.ask("\nPlease select account type (1/2): ", |input| parse_choice(input, 2))?;
        if account == 1 {
            writeln!(console, "\n\nGUEST USER ACCOUNT selected. Loading user menu...\n")?;
            progress_bar(console, 100)?;
            writeln!(console, "\n\n----------- WELCOME USER ------------")?;
            return Ok(());
        }

        writeln!(console, "ADMIN ACCOUNT selected.")?;
        let key = console.ask("\nPlease enter admin masterkey: ", whole_number)?;
        if self.access.login_admin(&key) {
            info!("admin logged in at startup");
            writeln!(console, "Loading admin menu...\n")?;
            progress_bar(console, 100)?;
            self.admin_access(console)
        } else {
            writeln!(console, "\nINCORRECT MASTERKEY: accessing as GUEST USER...")?;
            progress_bar(console, 100)?;
            writeln!(console, "\n\n----------- WELCOME USER ------------")?;
            Ok(())
        }
    }

    /// One pass of the system menu
    pub fn system_menu<IO>(&mut self, console: &mut Console<IO>) -> Result<Flow, ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        banner(console, "SYSTEM MENU")?;
        options(console, &SYSTEM_MENU)?;
        let choice = console.ask("Select Mode (1/2/3/4/5): ", |input| parse_choice(input, 5))?;

        match choice {
            1 => {
                writeln!(console, "Commencing tank operation...\n")?;
                progress_bar(console, 100)?;
                let result = self.monitor.run(
                    &mut self.hardware,
                    &self.preferences,
                    &self.clock,
                    console,
                );
                Self::back_on_interrupt(console, result)?;
            }
            2 => {
                writeln!(console, "Loading system settings...\n")?;
                progress_bar(console, 100)?;
                self.refresh_admin(console)?;
                let result = if self.access.is_admin() {
                    self.update_system_settings(console)
                } else {
                    self.system_settings(console)
                };
                Self::back_on_interrupt(console, result)?;
            }
            3 => {
                writeln!(console, "Commencing data observation...\n")?;
                progress_bar(console, 100)?;
                let result = self.data_observation(console);
                Self::back_on_interrupt(console, result)?;
            }
            4 => {
                let result = self.enter_admin(console);
                Self::back_on_interrupt(console, result)?;
            }
            _ => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn confirm_quit<IO>(&mut self, console: &mut Console<IO>) -> Result<Flow, ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        writeln!(console, "\nKEYBOARD INTERRUPT DETECTED: Already in system menu.")?;
        match console.ask("Would you like to quit the program (Y/N)?: ", parse_yes_no) {
            Ok(true) => Ok(Flow::Quit),
            Ok(false) | Err(ConsoleError::Interrupted) => {
                writeln!(console, "\nReturning to system menu...")?;
                Ok(Flow::Continue)
            }
            Err(e) => Err(e),
        }
    }

    /// Settings behind the password, with lockout after repeated failures
    pub fn system_settings<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        loop {
            if self.access.is_locked_out(self.clock.now_ms()) {
                self.wait_out_lockout(console)?;
            }

            let attempt = console.prompt("\nPlease key in the password: ")?;
            match self.access.check_password(&attempt, self.clock.now_ms()) {
                PasswordCheck::Granted => {
                    writeln!(console, "PASSWORD ACCEPTED: Loading system parameters...\n")?;
                    progress_bar(console, 100)?;
                    return self.update_system_settings(console);
                }
                PasswordCheck::Denied { attempts_left } => {
                    writeln!(console, "Incorrect Password. Attempts left: {}\n", attempts_left)?;
                }
                PasswordCheck::LockedOut => {
                    writeln!(console, "Incorrect Password. No Attempts left.")?;
                    writeln!(
                        console,
                        "UPDATE SYSTEM PARAMETERS feature disabled for {} seconds. User may still access all other tank features while under lockout.",
                        LOCKOUT_MS / 1000
                    )?;
                    writeln!(console, "[CTRL+C to return to system menu]\n")?;
                }
            }
        }
    }

    /// Counts the lockout down, reporting every few seconds, until it ends
    /// or the operator presses Ctrl+C
    fn wait_out_lockout<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        let mut last_report_ms: Option<u64> = None;
        loop {
            let now_ms = self.clock.now_ms();
            if !self.access.is_locked_out(now_ms) {
                writeln!(console, "\nLockout ended.")?;
                return Ok(());
            }
            if last_report_ms.map_or(true, |last| now_ms.saturating_sub(last) >= LOCKOUT_REPORT_MS) {
                let remaining_s = self.access.lockout_remaining_ms(now_ms).div_ceil(1000);
                writeln!(console, "UNDER LOCKOUT: Lockout time remaining: {}s", remaining_s)?;
                last_report_ms = Some(now_ms);
            }
            if console.poll_interrupt()? {
                return Err(ConsoleError::Interrupted);
            }
            self.delay.delay_ms(LOCKOUT_POLL_MS);
        }
    }

    /// Parameter review and editor
    pub fn update_system_settings<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        banner(console, "SYSTEM PARAMETERS")?;
        parameter_table(console, &self.preferences)?;
        let change = console.ask("\nWould you like to change the system setting? (Y/N): ", parse_yes_no)?;
        if !change {
            writeln!(console, "\nREVIEW COMPLETE. Returning to system menu...\n")?;
            progress_bar(console, 100)?;
            return Ok(());
        }

        loop {
            writeln!(console, "\n\n----------- UPDATE SYSTEM PARAMETERS ------------")?;
            for (number, parameter) in Parameter::ALL.iter().enumerate() {
                writeln!(console, "    {} update {}", number + 1, parameter.name())?;
            }
            writeln!(console, "    {} return to system menu\n", Parameter::ALL.len() + 1)?;

            let choice = console.ask("Please enter your selection (1/2/3/4/5/6/7/8/9): ", |input| {
                parse_choice(input, Parameter::ALL.len() as u32 + 1)
            })?;
            let Some(parameter) = Parameter::from_choice(choice) else {
                writeln!(console, "\nREVIEW COMPLETE. Displaying system parameters...\n")?;
                progress_bar(console, 100)?;
                banner(console, "UPDATED SYSTEM PARAMETERS")?;
                parameter_table(console, &self.preferences)?;
                return Self::return_to_menu(console);
            };

            writeln!(
                console,
                "Current {} = {}{}",
                parameter.name(),
                self.preferences.value(parameter),
                parameter.unit()
            )?;
            let mut prompt: String<48> = String::new();
            write!(prompt, "Enter new {} value: ", parameter.name())?;
            let preferences = &mut self.preferences;
            let change = console.ask(&prompt, |input| preferences.apply(parameter, input))?;

            info!("{} updated", parameter.name());
            writeln!(console, "\n\nUpdating parameter..\n")?;
            progress_bar(console, 100)?;
            writeln!(console, "\nUPDATE SUCCESSFUL: {}", change)?;
        }
    }

    fn enter_admin<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        self.refresh_admin(console)?;
        if self.access.is_admin() {
            return self.admin_access(console);
        }

        let key = console.ask("\nPlease enter admin masterkey: ", whole_number)?;
        if self.access.grant_temporary_admin(&key, self.clock.now_ms()) {
            writeln!(
                console,
                "Temporary admin access has been granted for {} seconds",
                TEMP_ADMIN_MS / 1000
            )?;
            writeln!(console, "Loading admin menu...\n")?;
            progress_bar(console, 100)?;
            self.admin_access(console)
        } else {
            writeln!(console, "\nINCORRECT MASTERKEY: admin access denied. Returning to system menu...\n\n")?;
            progress_bar(console, 100)?;
            Ok(())
        }
    }

    /// Admin menu. Every selection re-checks the session, so an expired
    /// temporary session drops back to the system menu.
    pub fn admin_access<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        writeln!(console, "\n\n----------- WELCOME ADMIN ------------")?;
        loop {
            banner(console, "ADMIN ACCESS")?;
            options(console, &ADMIN_MENU)?;
            let choice = console.ask("Please select mode (1/2/3/4): ", |input| parse_choice(input, 4))?;

            self.refresh_admin(console)?;
            if choice == 4 || !self.access.is_admin() {
                return Self::return_to_menu(console);
            }

            match choice {
                1 => {
                    writeln!(console, "Current system password: {}", self.access.password())?;
                    let edit = console.ask("Would you like to edit the password (Y/N)?: ", parse_yes_no)?;
                    self.refresh_admin(console)?;
                    if !self.access.is_admin() {
                        return Self::return_to_menu(console);
                    }
                    if edit {
                        let access = &mut self.access;
                        console.ask("Please enter new password: ", |input| access.set_password(input))?;
                        writeln!(console, "Updating password...\n")?;
                        progress_bar(console, 100)?;
                        writeln!(console, "\n\nPASSWORD UPDATE SUCCESSFUL. Password: {}", self.access.password())?;
                    }
                }
                2 => self.update_system_settings(console)?,
                _ => {
                    if self.access.override_lockout(self.clock.now_ms()) {
                        progress_bar(console, 100)?;
                        writeln!(console, "\n\nUser lockout terminated.")?;
                    } else {
                        writeln!(console, "\n\nUser is not under lockout.")?;
                    }
                }
            }
        }
    }

    /// Charts the last observation window of the most recent polling session
    pub fn data_observation<IO>(&mut self, console: &mut Console<IO>) -> Result<(), ConsoleError>
    where
        IO: Read + SerialWrite + ReadReady,
    {
        loop {
            banner(console, "DATA OBSERVATION")?;
            options(console, &OBSERVATION_MENU)?;
            let choice = console.ask("Please select mode (1/2/3/4): ", |input| parse_choice(input, 4))?;
            let series = match choice {
                1 => Series::Volume,
                2 => Series::RateOfChange,
                3 => Series::Level,
                _ => return Self::return_to_menu(console),
            };

            match self.monitor.history().observe(series, self.preferences.observation_s) {
                Ok(points) => {
                    writeln!(console, "\n\nSUFFICIENT DATA: Plotting {} graph...\n", series.title())?;
                    progress_bar(console, 100)?;
                    chart(console, series, &points)?;
                }
                Err(insufficient) => {
                    writeln!(console, "{}", insufficient)?;
                    return Self::return_to_menu(console);
                }
            }
        }
    }

    /// Shuts every device down and says goodbye
    pub fn end_program<W: Write>(&mut self, out: &mut W) -> Result<(), ConsoleError> {
        banner(out, "END PROGRAM")?;
        writeln!(out, "Shutting down all tank features...\n")?;
        progress_bar(out, 100)?;

        writeln!(out, "\nULTRASONIC SENSOR turning off...")?;
        writeln!(out, "THERMISTOR turning off...")?;
        writeln!(out, "MOTOR turning off...")?;
        actuate(self.hardware.drive_pump(MotorCommand::Stop));
        writeln!(out, "ALERT SYSTEM turning off...")?;
        actuate(self.hardware.silence_alerts());
        writeln!(out, "SEVEN-SEGMENT DISPLAY turning off...")?;
        actuate(self.hardware.show("GOODBYE", Indicator::Off));
        actuate(self.hardware.blank_display());

        writeln!(out, "\n\nFeature shutdown complete. Ending program...\n")?;
        progress_bar(out, 100)?;
        banner(out, "GOODBYE")?;
        info!("program ended");
        Ok(())
    }
}
