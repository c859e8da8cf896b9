use crate::error::{LogsError, Result};
use crate::logs::LogLine;
use chrono::{Local, TimeZone};
use std::fmt;
use std::io::{self, Stdout, Write};
use tracing::debug;

/// Timestamp layout of a rendered line, e.g. `14.07.17 04:40:00 (+0200)`
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%y %H:%M:%S (%z)";

/// Render a log line using the local timezone
pub fn render_line(line: &LogLine) -> String {
    render_line_in(line, &Local)
}

/// Render a log line with its timestamp converted into `tz`
///
/// The offset printed is the one `tz` applies to the line's instant; the
/// offset the source attached to the timestamp is discarded. A timestamp that
/// cannot be parsed is printed as the raw value the source sent.
pub fn render_line_in<Tz>(line: &LogLine, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let stamp = match line.timestamp.to_utc() {
        Some(instant) => instant
            .with_timezone(tz)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        None => {
            debug!("Unparseable log timestamp {:?}, printing raw value", line.timestamp);
            line.timestamp.to_string()
        }
    };

    format!("{} {}", stamp, line.message)
}

/// Writes rendered log lines to an output stream, one flush per line
pub struct LineRenderer<W: Write> {
    out: W,
    rendered: u64,
}

impl LineRenderer<Stdout> {
    /// Create a renderer writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> LineRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, rendered: 0 }
    }

    /// Render a line and write it out immediately
    pub fn print(&mut self, line: &LogLine) -> Result<()> {
        let rendered = render_line(line);
        writeln!(self.out, "{}", rendered).map_err(LogsError::Output)?;
        self.out.flush().map_err(LogsError::Output)?;
        self.rendered += 1;
        Ok(())
    }

    /// Flush anything still held by the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(LogsError::Output)
    }

    /// Number of lines written so far
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
