//! 4-digit seven segment display behind two cascaded 74HC595 shift registers
//!
//! Each latched frame drives one digit: 8 segment bits (a-g, dp), 4 digit
//! select bits (active low) and the 3 tank state indicator LEDs.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use heapless::Vec;

use crate::config::{SEGMENT_LATCH_HOLD_MS, SEGMENT_SCROLL_FRAME_MS, SEGMENT_STATIC_MS};
use crate::error::ActuatorError;
use crate::hardware::SegmentDisplay;
use crate::timer::Clock;

/// Longest message the display will encode; the rest is dropped
pub const MAX_MESSAGE: usize = 32;
pub const DIGITS: usize = 4;

const BLANK: u8 = 0b0000_0000;
const DECIMAL_POINT: u8 = 0b0000_0001;
const DIGIT_OFF: u8 = 0b1111;

/// Tank state LED next to the digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Off,
    Yellow,
    Red,
    Blue,
}

impl Indicator {
    fn bits(self) -> u8 {
        match self {
            Indicator::Off => 0b000,
            Indicator::Yellow => 0b100,
            Indicator::Red => 0b010,
            Indicator::Blue => 0b001,
        }
    }
}

/// Segment pattern for a character, segments a-g then dp from the MSB.
/// Lowercase letters share the uppercase pattern.
pub fn glyph(c: char) -> Option<u8> {
    let code = match c.to_ascii_uppercase() {
        'A' => 0b1110_1110,
        'B' => 0b0011_1110,
        'C' => 0b1001_1100,
        'D' => 0b0111_1010,
        'E' => 0b1001_1110,
        'F' => 0b1000_1110,
        'G' => 0b1011_1100,
        'H' => 0b0110_1110,
        'I' => 0b1000_1000,
        'J' => 0b0111_0000,
        'K' => 0b1010_1110,
        'L' => 0b0001_1100,
        'M' => 0b1010_1010,
        'N' => 0b0010_1010,
        'O' => 0b0011_1010,
        'P' => 0b1100_1110,
        'Q' => 0b1110_0110,
        'R' => 0b0000_1010,
        'S' => 0b1011_0110,
        'T' => 0b0001_1110,
        'U' => 0b0011_1000,
        'V' => 0b0111_1100,
        'W' => 0b0101_0110,
        'X' => 0b0110_1110,
        'Y' => 0b0111_0110,
        'Z' => 0b1101_0010,
        '0' => 0b1111_1100,
        '1' => 0b0110_0000,
        '2' => 0b1101_1010,
        '3' => 0b1111_0010,
        '4' => 0b0110_0110,
        '5' => 0b1011_0110,
        '6' => 0b1011_1110,
        '7' => 0b1110_0000,
        '8' => 0b1111_1110,
        '9' => 0b1111_0110,
        ' ' => BLANK,
        _ => return None,
    };
    Some(code)
}

/// Digit select nibble, active low
fn digit_select(digit: usize) -> u8 {
    match digit {
        0 => 0b0111,
        1 => 0b1011,
        2 => 0b1101,
        3 => 0b1110,
        _ => DIGIT_OFF,
    }
}

/// Packs one digit's register contents. The first shifted bit is the LSB,
/// so segment `a` ends up on the first register's first output.
pub fn digit_frame(code: u8, digit: usize, indicator: Indicator) -> u16 {
    (u16::from(code) << 8) | (u16::from(digit_select(digit)) << 4) | (u16::from(indicator.bits()) << 1)
}

/// A message converted to segment codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMessage {
    codes: Vec<u8, MAX_MESSAGE>,
}

impl SegmentMessage {
    /// A `.` lights the decimal point of the character before it.
    /// Characters without a glyph are shown blank.
    pub fn encode(text: &str) -> SegmentMessage {
        let mut codes: Vec<u8, MAX_MESSAGE> = Vec::new();
        for c in text.chars() {
            if c == '.' {
                match codes.last_mut() {
                    Some(previous) => *previous |= DECIMAL_POINT,
                    None => {
                        let _ = codes.push(DECIMAL_POINT);
                    }
                }
            } else if codes.push(glyph(c).unwrap_or(BLANK)).is_err() {
                break;
            }
        }
        SegmentMessage { codes }
    }

    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// More than four characters scroll through the digits
    pub fn scrolls(&self) -> bool {
        self.codes.len() > DIGITS
    }

    /// Sliding four-digit windows, or a single right-aligned frame for
    /// short messages
    pub fn frames(&self) -> impl Iterator<Item = [u8; DIGITS]> + '_ {
        let short = if self.codes.len() < DIGITS {
            let mut frame = [BLANK; DIGITS];
            frame[DIGITS - self.codes.len()..].copy_from_slice(&self.codes);
            Some(frame)
        } else {
            None
        };
        let windows = self
            .codes
            .windows(DIGITS)
            .map(|window| [window[0], window[1], window[2], window[3]]);
        short.into_iter().chain(windows)
    }
}

pub struct SevenSegment<SER, RCLK, SRCLK, K, D> {
    ser: SER,
    rclk: RCLK,
    srclk: SRCLK,
    clock: K,
    delay: D,
}

impl<SER, RCLK, SRCLK, K, D> SevenSegment<SER, RCLK, SRCLK, K, D>
where
    SER: OutputPin,
    RCLK: OutputPin,
    SRCLK: OutputPin,
    K: Clock,
    D: DelayNs,
{
    pub fn new(
        mut ser: SER,
        mut rclk: RCLK,
        mut srclk: SRCLK,
        clock: K,
        delay: D,
    ) -> Result<Self, ActuatorError> {
        ser.set_low().map_err(|_| ActuatorError::Display)?;
        rclk.set_low().map_err(|_| ActuatorError::Display)?;
        srclk.set_low().map_err(|_| ActuatorError::Display)?;
        Ok(Self {
            ser,
            rclk,
            srclk,
            clock,
            delay,
        })
    }

    /// Multiplexes one frame across the four digits for `hold_ms`
    fn hold_frame(
        &mut self,
        frame: &[u8; DIGITS],
        indicator: Indicator,
        hold_ms: u64,
    ) -> Result<(), ActuatorError> {
        let start = self.clock.now_ms();
        loop {
            for (digit, code) in frame.iter().enumerate() {
                self.write_digit(*code, digit, indicator)?;
            }
            if self.clock.now_ms().saturating_sub(start) >= hold_ms {
                return Ok(());
            }
        }
    }

    pub fn write_digit(
        &mut self,
        code: u8,
        digit: usize,
        indicator: Indicator,
    ) -> Result<(), ActuatorError> {
        self.shift_out(digit_frame(code, digit, indicator))?;
        self.latch(true)
    }

    fn shift_out(&mut self, frame: u16) -> Result<(), ActuatorError> {
        for bit in 0..16 {
            let level = PinState::from(frame & (1 << bit) != 0);
            self.ser.set_state(level).map_err(|_| ActuatorError::Display)?;
            self.srclk.set_high().map_err(|_| ActuatorError::Display)?;
            self.srclk.set_low().map_err(|_| ActuatorError::Display)?;
        }
        Ok(())
    }

    fn latch(&mut self, hold: bool) -> Result<(), ActuatorError> {
        self.rclk.set_high().map_err(|_| ActuatorError::Display)?;
        if hold {
            self.delay.delay_ms(SEGMENT_LATCH_HOLD_MS);
        }
        self.rclk.set_low().map_err(|_| ActuatorError::Display)
    }
}

impl<SER, RCLK, SRCLK, K, D> SegmentDisplay for SevenSegment<SER, RCLK, SRCLK, K, D>
where
    SER: OutputPin,
    RCLK: OutputPin,
    SRCLK: OutputPin,
    K: Clock,
    D: DelayNs,
{
    fn show(&mut self, text: &str, indicator: Indicator) -> Result<(), ActuatorError> {
        let message = SegmentMessage::encode(text);
        let hold_ms = if message.scrolls() {
            SEGMENT_SCROLL_FRAME_MS
        } else {
            SEGMENT_STATIC_MS
        };
        for frame in message.frames() {
            self.hold_frame(&frame, indicator, hold_ms)?;
        }
        Ok(())
    }

    fn blank(&mut self) -> Result<(), ActuatorError> {
        self.shift_out(0)?;
        self.latch(false)
    }
}
