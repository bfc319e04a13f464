//! # chanlog
//! Tagged logging channels, each with its own level, sharing one rotated log file.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! chanlog = "0.1.0"
//! ```
//!
//! ```rust
//! use chanlog::{LogConfig, LoggingSystem};
//!
//! # let dir = std::path::PathBuf::from("/tmp/chanlog_doc_usage");
//! # std::fs::create_dir_all(&dir).unwrap();
//! let logging = LoggingSystem::new();
//! logging
//!     .initialise(&LogConfig::new(&dir, "app.log").with_level("main", "debug"))
//!     .expect("Unable to start logging");
//!
//! let log = logging.channel("main").unwrap();
//! log.debug("Hello, world!");
//! chanlog::info!(log, "listening on port {}", 8080);
//! log.trace_with(|| unreachable!("trace is below debug, never evaluated"));
//!
//! logging.finalise(); // writes the stop marker and flushes
//! ```
//!
//! ## Levels
//! Levels are ordered `trace < debug < info < warn < error < critical < off`.
//! A channel emits a line iff its level is at or below the line's severity.
//! A new channel starts at the level configured for its tag, else the level
//! configured for the reserved `DEFAULT` tag, else `error`.
//!
//! ## Changing levels at runtime
//! ```rust
//! use chanlog::{LogConfig, LoggingSystem, Level};
//!
//! # let dir = std::path::PathBuf::from("/tmp/chanlog_doc_runtime");
//! # std::fs::create_dir_all(&dir).unwrap();
//! let logging = LoggingSystem::new();
//! logging.load_defaults([("network", "warn")]);
//! logging.initialise(&LogConfig::new(&dir, "app.log")).unwrap();
//!
//! let net = logging.channel("network").unwrap();
//! assert_eq!(net.level(), Level::Warn);
//!
//! logging.update_channel_level("network", "trace").unwrap();
//! assert_eq!(net.level(), Level::Trace);
//! assert_eq!(
//!     logging.list_levels().to_json().unwrap(),
//!     r#"{"levels":[{"tag":"network","category":"trace"}]}"#
//! );
//! logging.finalise();
//! ```

mod bridge;
mod channel;
mod config;
mod defaults;
mod directory;
mod error;
mod system;

pub use bridge::LogBridge;
pub use chanlog_core::{Level, ParseLevelError};
pub use channel::Channel;
pub use config::LogConfig;
pub use defaults::{DEFAULT_TAG, FLOOR_LEVEL, PANIC_TAG};
pub use directory::{LevelRecord, LevelUpdate, LevelsReport};
pub use error::{FatalError, InitError, LogError, UpdateError};
pub use system::LoggingSystem;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs a formatted message on a channel at `trace`: `trace!(chan, "x = {}", x)`.
#[macro_export]
macro_rules! trace {
    ($channel:expr, $($arg:tt)+) => {
        $channel.trace_fmt(format_args!($($arg)+))
    };
}

/// Logs a formatted message on a channel at `debug`.
#[macro_export]
macro_rules! debug {
    ($channel:expr, $($arg:tt)+) => {
        $channel.debug_fmt(format_args!($($arg)+))
    };
}

/// Logs a formatted message on a channel at `info`.
#[macro_export]
macro_rules! info {
    ($channel:expr, $($arg:tt)+) => {
        $channel.info_fmt(format_args!($($arg)+))
    };
}

/// Logs a formatted message on a channel at `warn`.
#[macro_export]
macro_rules! warn {
    ($channel:expr, $($arg:tt)+) => {
        $channel.warn_fmt(format_args!($($arg)+))
    };
}

/// Logs a formatted message on a channel at `error`.
#[macro_export]
macro_rules! error {
    ($channel:expr, $($arg:tt)+) => {
        $channel.error_fmt(format_args!($($arg)+))
    };
}

/// Logs a formatted message on a channel at `critical`.
#[macro_export]
macro_rules! critical {
    ($channel:expr, $($arg:tt)+) => {
        $channel.critical_fmt(format_args!($($arg)+))
    };
}
