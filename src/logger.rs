//! `log` backend writing to a [`StdioDriver`]

use arrayvec::ArrayString;
use core::fmt::Write;
use log::{Level, Log, Metadata, Record};

use crate::stdio_uart_buf::StdioDriver;

/// Longest rendered log line, longer lines are cut short
pub const LINE_CAPACITY: usize = 256;

/// Renders each record as `"<level> <module> <message>\r\n"` and hands the whole line to the
/// driver in one call, so a line that cannot be buffered is dropped and counted as one unit.
pub struct UartLogger<D: 'static> {
    driver: &'static D,
    flush: Option<fn()>,
}

impl<D: StdioDriver + Sync> UartLogger<D> {
    #[must_use]
    pub const fn new(driver: &'static D) -> Self {
        Self {
            driver,
            flush: None,
        }
    }

    /// Function run by [`log::logger().flush()`](Log::flush), typically the buffered UART's flush
    #[must_use]
    pub const fn with_flush(driver: &'static D, flush: fn()) -> Self {
        Self {
            driver,
            flush: Some(flush),
        }
    }

    fn level_str(level: Level) -> &'static str {
        match level {
            Level::Error => "E",
            Level::Warn => "W",
            Level::Info => "I",
            Level::Debug => "D",
            Level::Trace => "T",
        }
    }
}

impl<D: StdioDriver + Sync> Log for UartLogger<D> {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut line = ArrayString::<LINE_CAPACITY>::new();
        let mut cut = CutWriter(&mut line);

        write!(
            cut,
            "{} {} {}",
            Self::level_str(record.level()),
            record
                .target()
                .split("::")
                .last()
                .unwrap_or_else(|| record.target()),
            record.args()
        )
        .ok();

        // keep room for the line ending even when the message was cut
        if line.remaining_capacity() < 2 {
            line.truncate(floor_char_boundary(&line, LINE_CAPACITY - 2));
        }
        line.push_str("\r\n");

        self.driver.out_chars(line.as_bytes());
    }

    fn flush(&self) {
        if let Some(flush) = self.flush {
            flush();
        }
    }
}

/// Writes as much of each fragment as still fits instead of dropping it whole
struct CutWriter<'a, const N: usize>(&'a mut ArrayString<N>);

impl<const N: usize> Write for CutWriter<'_, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let room = self.0.remaining_capacity();
        if s.len() <= room {
            self.0.push_str(s);
            Ok(())
        } else {
            self.0.push_str(&s[..floor_char_boundary(s, room)]);
            Err(core::fmt::Error)
        }
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
