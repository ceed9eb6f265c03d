//! Line oriented operator console over any `embedded-io` serial port
//!
//! Input is echoed as typed, backspace edits the line, and Ctrl+C aborts the
//! current prompt with [`ConsoleError::Interrupted`]. Output written through
//! [`core::fmt::Write`] has its newlines expanded to CRLF for terminals.

use core::fmt::{self, Write as _};

use embedded_io::{Read, ReadReady, Write};
use heapless::{Deque, String};

use crate::config::{INTERRUPT_BYTE, MOTOR_SPEED_MAX, MOTOR_SPEED_MIN};
use crate::error::{ConsoleError, InputError};

pub const LINE_CAPACITY: usize = 64;

pub type Line = String<LINE_CAPACITY>;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

pub struct Console<IO> {
    io: IO,
    /// Bytes read while polling for Ctrl+C, handed to the next prompt
    typeahead: Deque<u8, LINE_CAPACITY>,
    /// The last line ended in CR, so a following LF is part of it
    swallow_lf: bool,
}

impl<IO> Console<IO>
where
    IO: Read + Write + ReadReady,
{
    pub fn new(io: IO) -> Self {
        Self {
            io,
            typeahead: Deque::new(),
            swallow_lf: false,
        }
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    fn read_byte(&mut self) -> Result<u8, ConsoleError> {
        if let Some(byte) = self.typeahead.pop_front() {
            return Ok(byte);
        }
        self.read_serial()
    }

    fn read_serial(&mut self) -> Result<u8, ConsoleError> {
        let mut byte = [0u8; 1];
        match self.io.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            _ => Err(ConsoleError::Read),
        }
    }

    fn echo(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        self.io.write_all(bytes).map_err(|_| ConsoleError::Write)
    }

    /// Blocks until the operator ends a line. Characters past the line
    /// capacity are dropped.
    pub fn read_line(&mut self) -> Result<Line, ConsoleError> {
        let mut line = Line::new();
        loop {
            let byte = self.read_byte()?;
            let swallow_lf = core::mem::replace(&mut self.swallow_lf, false);
            match byte {
                INTERRUPT_BYTE => {
                    self.echo(b"^C\r\n")?;
                    return Err(ConsoleError::Interrupted);
                }
                b'\n' if swallow_lf => {}
                b'\r' | b'\n' => {
                    self.swallow_lf = byte == b'\r';
                    self.echo(b"\r\n")?;
                    return Ok(line);
                }
                BACKSPACE | DELETE => {
                    if line.pop().is_some() {
                        self.echo(b"\x08 \x08")?;
                    }
                }
                b' '..=b'~' => {
                    if line.push(char::from(byte)).is_ok() {
                        self.echo(&[byte])?;
                    }
                }
                _ => {}
            }
        }
    }

    /// Prints `text` and reads the reply
    pub fn prompt(&mut self, text: &str) -> Result<Line, ConsoleError> {
        self.write_str(text)?;
        self.read_line()
    }

    /// Re-prompts until `parse` accepts the reply, printing each rejection
    pub fn ask<T>(
        &mut self,
        text: &str,
        mut parse: impl FnMut(&str) -> Result<T, InputError>,
    ) -> Result<T, ConsoleError> {
        loop {
            let line = self.prompt(text)?;
            match parse(line.trim()) {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self, "{}\n", e)?,
            }
        }
    }

    /// Checks pending input for Ctrl+C without blocking. Anything else
    /// typed is kept for the next prompt, up to a line's worth; an
    /// interrupt discards it.
    pub fn poll_interrupt(&mut self) -> Result<bool, ConsoleError> {
        while self.io.read_ready().map_err(|_| ConsoleError::Read)? {
            let byte = self.read_serial()?;
            if byte == INTERRUPT_BYTE {
                self.typeahead.clear();
                return Ok(true);
            }
            // Overflow is dropped so the port keeps draining
            let _ = self.typeahead.push_back(byte);
        }
        Ok(false)
    }
}

impl<IO> fmt::Write for Console<IO>
where
    IO: Write,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.io.write_all(first.as_bytes()).map_err(|_| fmt::Error)?;
        }
        for rest in lines {
            self.io.write_all(b"\r\n").map_err(|_| fmt::Error)?;
            self.io.write_all(rest.as_bytes()).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

/// Limit placed on a value by its paired parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    AtMost(u32),
    AtLeast(u32),
    Unbounded,
}

impl Bound {
    fn check(self, value: u32) -> Result<u32, InputError> {
        match self {
            Bound::AtMost(max) if value > max => Err(InputError::AboveMaximum { max }),
            Bound::AtLeast(min) if value < min => Err(InputError::BelowMinimum { min }),
            _ => Ok(value),
        }
    }
}

/// Whole number greater than zero
pub fn parse_positive_int(input: &str, bound: Bound) -> Result<u32, InputError> {
    let value: i64 = input.trim().parse().map_err(|_| InputError::NotInteger)?;
    if value <= 0 {
        return Err(InputError::NotPositive);
    }
    let value = u32::try_from(value).map_err(|_| InputError::OutOfRange)?;
    bound.check(value)
}

/// Finite real number greater than zero
pub fn parse_positive_real(input: &str) -> Result<f32, InputError> {
    let value: f32 = input.trim().parse().map_err(|_| InputError::NotNumber)?;
    if !value.is_finite() {
        return Err(InputError::NotNumber);
    }
    if value <= 0.0 {
        return Err(InputError::NotPositive);
    }
    Ok(value)
}

/// Motor PWM duty. The paired speed is checked before the PWM range.
pub fn parse_bounded_pwm(input: &str, bound: Bound) -> Result<u8, InputError> {
    let value = parse_positive_int(input, bound)?;
    u8::try_from(value)
        .ok()
        .filter(|duty| (MOTOR_SPEED_MIN..=MOTOR_SPEED_MAX).contains(duty))
        .ok_or(InputError::PwmRange)
}

/// Menu selection between 1 and `options`
pub fn parse_choice(input: &str, options: u32) -> Result<u32, InputError> {
    let choice = parse_positive_int(input, Bound::Unbounded)?;
    if choice > options {
        return Err(InputError::OutOfRange);
    }
    Ok(choice)
}

/// Y or N in either case
pub fn parse_yes_no(input: &str) -> Result<bool, InputError> {
    let input = input.trim();
    if input.parse::<f32>().is_ok() {
        return Err(InputError::NumericText);
    }
    if input.eq_ignore_ascii_case("y") {
        Ok(true)
    } else if input.eq_ignore_ascii_case("n") {
        Ok(false)
    } else {
        Err(InputError::NotAccepted)
    }
}
