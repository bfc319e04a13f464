use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::Level;

/// One line handed to a sink: the emission time, its severity and the
/// already prefixed text (`"<tag>: <message>"`).
#[derive(Debug, Clone)]
pub struct LogLine {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub text: String,
}

impl LogLine {
    pub fn new(level: Level, text: String) -> Self {
        Self {
            time: Utc::now(),
            level,
            text,
        }
    }

    /// `YYYY-MM-DD HH:MM:SS [LEVEL] text`
    pub fn plain(&self) -> String {
        let time = self.time.format("%Y-%m-%d %H:%M:%S");
        format!("{time} [{}] {}", self.level.label(), self.text)
    }

    /// Same layout as [`LogLine::plain`] with a colored level label.
    pub fn colored(&self) -> String {
        let time = self.time.format("%Y-%m-%d %H:%M:%S");
        let label = match self.level {
            Level::Critical => self.level.label().red().bold(),
            Level::Error => self.level.label().red(),
            Level::Warn => self.level.label().yellow(),
            Level::Info => self.level.label().green(),
            Level::Debug => self.level.label().blue(),
            Level::Trace => self.level.label().purple(),
            Level::Off => self.level.label().normal(),
        };
        format!("{time} [{label}] {}", self.text)
    }
}

/// A destination for formatted lines. Implementations are driven from a
/// single writer thread, see [`crate::spawn_log_thread`].
pub trait LogWriter {
    fn write_line(&mut self, line: &LogLine) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Prints lines to stdout with colored level labels.
#[derive(Default, Debug)]
pub struct ConsoleWriter;

impl LogWriter for ConsoleWriter {
    fn write_line(&mut self, line: &LogLine) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line.colored())?;
        stdout.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
