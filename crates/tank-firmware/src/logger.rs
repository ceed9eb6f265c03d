//! Forwards `log` records from tank-core to defmt over RTT

use core::fmt::Write;

use heapless::String;
use log::{Level, LevelFilter, Log, Metadata, Record};

const RECORD_CAPACITY: usize = 128;

struct DefmtLogger;

static LOGGER: DefmtLogger = DefmtLogger;

impl Log for DefmtLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        // Long records are cut at the buffer size
        let mut text: String<RECORD_CAPACITY> = String::new();
        let _ = write!(text, "{}", record.args());
        let text = text.as_str();
        match record.level() {
            Level::Error => defmt::error!("{=str}", text),
            Level::Warn => defmt::warn!("{=str}", text),
            Level::Info => defmt::info!("{=str}", text),
            Level::Debug => defmt::debug!("{=str}", text),
            Level::Trace => defmt::trace!("{=str}", text),
        }
    }

    fn flush(&self) {}
}

/// Installs the bridge. Call once, before interrupts are enabled.
pub fn init() {
    // SAFETY: single core, called once at startup before anything else logs
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(LevelFilter::Debug);
    }
}
