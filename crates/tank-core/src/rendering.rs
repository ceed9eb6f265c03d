use core::fmt::{self, Write};

use heapless::String;
use ufmt::uwrite;

use crate::history::{Point, Series};
use crate::preferences::{Parameter, Preferences};

/// Console width used to centre banner titles
pub const BANNER_WIDTH: usize = 40;
const BANNER_RULE: &str = "====================================";

const CHART_ROWS: usize = 10;
const CHART_COLUMNS: usize = 60;
const PROGRESS_CELLS: usize = 30;

/// Pads a number with leading zeros up to `width` digits
/// param num: number to be padded
/// param width: minimum digit count, at most 10
/// returns: String with formatted value
pub fn pad_number(num: u32, width: u32) -> String<10> {
    let mut padded = String::new();
    let digits = num.checked_ilog10().unwrap_or(0) + 1;
    for _ in digits..width.min(10) {
        let _ = padded.push('0');
    }
    let _ = uwrite!(padded, "{}", num);
    padded
}

/// Fixed point text for the seven segment display, e.g. `5.76L`
/// param value: number to render
/// param decimals: digits after the point
/// param unit: suffix appended after the number
/// returns: the text, truncated if it does not fit `N`
pub fn format_fixed<const N: usize>(value: f32, decimals: u32, unit: &str) -> String<N> {
    let scale = 10u32.pow(decimals.min(6));
    let scaled = libm::roundf(libm::fabsf(value) * scale as f32) as u32;
    let sign = if value < 0.0 && scaled != 0 { "-" } else { "" };

    let mut text = String::new();
    let _ = if decimals == 0 {
        uwrite!(text, "{}{}{}", sign, scaled, unit)
    } else {
        uwrite!(
            text,
            "{}{}.{}{}",
            sign,
            scaled / scale,
            pad_number(scaled % scale, decimals).as_str(),
            unit
        )
    };
    text
}

/// Section header with a centred title
pub fn banner(out: &mut impl Write, title: &str) -> fmt::Result {
    write!(
        out,
        "\n\n{}\n{:^width$}\n{}\n\n",
        BANNER_RULE,
        title,
        BANNER_RULE,
        width = BANNER_WIDTH
    )
}

/// Numbered list of menu options
pub fn options(out: &mut impl Write, entries: &[&str]) -> fmt::Result {
    for (number, entry) in entries.iter().enumerate() {
        writeln!(out, "    {} {}", number + 1, entry)?;
    }
    writeln!(out)
}

pub fn progress_bar(out: &mut impl Write, percent: u8) -> fmt::Result {
    let percent = usize::from(percent.min(100));
    let filled = PROGRESS_CELLS * percent / 100;
    out.write_str("Progress: |")?;
    for cell in 0..PROGRESS_CELLS {
        out.write_char(if cell < filled { '#' } else { '-' })?;
    }
    writeln!(out, "| {}% Complete", percent)
}

/// Numbered table of the editable parameters and their current values
pub fn parameter_table(out: &mut impl Write, preferences: &Preferences) -> fmt::Result {
    for (number, parameter) in Parameter::ALL.iter().enumerate() {
        writeln!(
            out,
            "    {} {:<22}{}{}",
            number + 1,
            parameter.name(),
            preferences.value(*parameter),
            parameter.unit()
        )?;
    }
    Ok(())
}

/// Scatter chart of an observation window followed by its data table
pub fn chart(out: &mut impl Write, series: Series, points: &[Point]) -> fmt::Result {
    writeln!(out, "Graph of {} ({})\n", series.title(), series.unit())?;
    if points.is_empty() {
        return writeln!(out, "(no data)");
    }

    let (low, high) = points.iter().fold((f32::MAX, f32::MIN), |(low, high), point| {
        (libm::fminf(low, point.value), libm::fmaxf(high, point.value))
    });
    let span = if high - low > f32::EPSILON { high - low } else { 1.0 };
    let columns = points.len().min(CHART_COLUMNS);

    for row in (0..CHART_ROWS).rev() {
        match row {
            r if r == CHART_ROWS - 1 => write!(out, "{:>9.2} |", high)?,
            0 => write!(out, "{:>9.2} |", low)?,
            _ => write!(out, "{:>9} |", "")?,
        }
        for column in 0..columns {
            let point = &points[column * points.len() / columns];
            let level = libm::roundf((point.value - low) / span * (CHART_ROWS - 1) as f32) as usize;
            out.write_char(if level == row { '*' } else { ' ' })?;
        }
        writeln!(out)?;
    }

    write!(out, "{:>9} +", "")?;
    for _ in 0..columns {
        out.write_char('-')?;
    }
    let end_s = points.last().map(|point| point.time_s).unwrap_or(0.0);
    writeln!(out, "\n{:>11}0s{:>width$.1}s\n", "", end_s, width = columns.saturating_sub(2))?;

    writeln!(out, "{:>10} | {:>10}", "Time (s)", series.unit())?;
    for point in points {
        writeln!(out, "{:>10.2} | {:>10.4}", point.time_s, point.value)?;
    }
    Ok(())
}
