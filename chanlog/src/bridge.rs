use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use chanlog_core::Level;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::{channel::Channel, error::LogError, system::LoggingSystem};

/// Routes records from the `log` facade (`log::info!` and friends) to
/// channels tagged with the record's target, so crates that only know `log`
/// share the same per-tag levels and sink.
///
/// A target that matches a channel the application already created reuses
/// that channel, so admin updates on the tag apply to both. Otherwise the
/// bridge creates the channel on the first record for the target.
pub struct LogBridge {
    system: LoggingSystem,
    channels: Mutex<HashMap<String, Channel>>,
}

fn severity(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug => Level::Debug,
        log::Level::Trace => Level::Trace,
    }
}

impl LogBridge {
    pub fn new(system: LoggingSystem) -> Self {
        Self {
            system,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Registers the bridge as the process-wide `log` logger.
    pub fn install(self) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Channel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The usable channel for `target` from the cache or the directory,
    /// without creating one.
    fn lookup(&self, channels: &mut HashMap<String, Channel>, target: &str) -> Option<Channel> {
        if let Some(channel) = channels.get(target)
            && channel.is_usable()
        {
            return Some(channel.clone());
        }
        let channel = self.system.find_channel(target)?;
        channels.insert(target.to_string(), channel.clone());
        Some(channel)
    }

    /// The channel for `target`, created when no usable one exists.
    fn channel(&self, target: &str) -> Result<Channel, LogError> {
        let mut channels = self.lock();
        if let Some(channel) = self.lookup(&mut channels, target) {
            return Ok(channel);
        }
        let channel = self.system.channel(target)?;
        channels.insert(target.to_string(), channel.clone());
        Ok(channel)
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let severity = severity(metadata.level());
        let target = metadata.target();
        match self.lookup(&mut self.lock(), target) {
            Some(channel) => channel.enabled(severity),
            None if self.system.is_initialised() => {
                self.system.default_level(target).permits(severity)
            }
            // records are reported on stderr
            None => true,
        }
    }

    fn log(&self, record: &Record) {
        let level = severity(record.level());
        let result = self
            .channel(record.target())
            .and_then(|channel| channel.try_emit_fmt(level, *record.args()));
        if let Err(e) = result {
            eprintln!(
                "[{}] {}: {} ({e})",
                level.label(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        self.system.flush();
    }
}
