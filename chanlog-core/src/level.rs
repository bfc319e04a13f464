use std::{fmt, str::FromStr};

/// Severity of a log line, ordered from the most verbose to [`Level::Off`].
///
/// A channel configured at level `L` emits a line at severity `S` iff `L <= S`.
/// `Off` is above every emitting severity, so a channel at `Off` emits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace = 1,
    Debug = 2,
    Info = 3,
    Warn = 4,
    Error = 5,
    Critical = 6,
    Off = 7,
}

impl Level {
    /// Every level, in ascending order.
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
        Level::Off,
    ];

    /// Levels a message can be emitted at (everything except `Off`).
    pub const EMITTING: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
    ];

    /// Parses a canonical lowercase level name. Anything else is rejected.
    pub fn parse(name: &str) -> Option<Level> {
        Self::ALL.into_iter().find(|level| level.as_str() == name)
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Off => "off",
        }
    }

    /// Uppercase label used in output lines.
    pub fn label(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Off => "OFF",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Level::as_u8`].
    pub fn from_u8(value: u8) -> Option<Level> {
        Self::ALL.into_iter().find(|level| level.as_u8() == value)
    }

    /// True when a channel at `self` lets a line at `severity` through.
    pub fn permits(self, severity: Level) -> bool {
        severity != Level::Off && self <= severity
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a level name is not one of the canonical lowercase names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(pub String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid log level: {:?}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::parse(s).ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_levels() {
        assert_eq!(Level::parse("trace"), Some(Level::Trace));
        assert_eq!(Level::parse("debug"), Some(Level::Debug));
        assert_eq!(Level::parse("info"), Some(Level::Info));
        assert_eq!(Level::parse("warn"), Some(Level::Warn));
        assert_eq!(Level::parse("error"), Some(Level::Error));
        assert_eq!(Level::parse("critical"), Some(Level::Critical));
        assert_eq!(Level::parse("off"), Some(Level::Off));
    }

    #[test]
    fn test_invalid_levels_are_rejected() {
        for name in ["", "INFO", "Info", " info", "warning", "fatal", "*"] {
            assert_eq!(Level::parse(name), None, "{name:?} should not parse");
        }
        let err = "bogus".parse::<Level>().unwrap_err();
        assert_eq!(err, ParseLevelError("bogus".into()));
    }

    #[test]
    fn test_ordering_and_gate() {
        for window in Level::ALL.windows(2) {
            assert!(window[0] < window[1]);
            assert!(window[0].as_u8() < window[1].as_u8());
        }
        for threshold in Level::ALL {
            for severity in Level::EMITTING {
                assert_eq!(threshold.permits(severity), threshold <= severity);
            }
            assert!(!threshold.permits(Level::Off));
        }
        assert!(!Level::Off.permits(Level::Critical));
    }

    #[test]
    fn test_u8_round_trip() {
        for level in Level::ALL {
            assert_eq!(Level::from_u8(level.as_u8()), Some(level));
        }
        assert_eq!(Level::from_u8(0), None);
        assert_eq!(Level::from_u8(8), None);
    }
}
