//! # chanlog-core
//! Core utilities for chanlog - severity levels, the rolling file sink and
//! the writer threads feeding it.

mod config;
mod level;
mod log_writer;
mod rolling;
mod sink;
mod utils;

pub use config::{CHANLOG_SETTINGS, ChanlogSettings};
pub use level::{Level, ParseLevelError};
pub use log_writer::{ConsoleWriter, LogLine, LogWriter};
pub use rolling::{RollingConfig, RollingFile, limits};
pub use sink::Sink;
pub use utils::{LogMessage, LogSender, spawn_log_thread};
