use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
};

use chanlog_core::{Level, LogLine, Sink};

use crate::{defaults::LevelDefaults, error::LogError};

/// Separator between a channel's tag and the message.
const TAG_SUFFIX: &str = ": ";

pub(crate) struct ChannelInner {
    pub(crate) tag: String,
    prefix: String,
    pub(crate) level: AtomicU8,
    session: u64,
    current_session: Arc<AtomicU64>,
    defaults: Arc<LevelDefaults>,
    sink: Arc<Sink>,
}

impl ChannelInner {
    pub(crate) fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Off)
    }

    pub(crate) fn swap_level(&self, level: Level) -> Level {
        Level::from_u8(self.level.swap(level.as_u8(), Ordering::Relaxed)).unwrap_or(Level::Off)
    }
}

/// A leveled logging handle bound to one tag.
///
/// Cloning is cheap; clones share the same level. A line at severity `S` is
/// written iff the channel's level is `<= S`. The level can be changed at any
/// time through [`Channel::set_level`] or the system's admin operations and is
/// picked up by subsequent calls on every clone.
///
/// Calling an emit method after the system has been finalised, or on a channel
/// from an earlier session, is a programmer error and panics. The `try_*`
/// methods report it as a [`LogError`] instead.
#[derive(Clone)]
pub struct Channel {
    pub(crate) inner: Arc<ChannelInner>,
}

macro_rules! severity_methods {
    ($($level:ident => $plain:ident, $fmt:ident, $with:ident;)*) => {
        $(
            #[doc = concat!("Logs `message` at `", stringify!($level), "`.")]
            pub fn $plain(&self, message: &str) {
                self.emit(Level::$level, message)
            }

            #[doc = concat!("Logs preformatted arguments at `", stringify!($level), "`, formatting only if the level is enabled.")]
            pub fn $fmt(&self, args: fmt::Arguments<'_>) {
                self.emit_fmt(Level::$level, args)
            }

            #[doc = concat!("Logs the closure's output at `", stringify!($level), "`. The closure only runs if the level is enabled.")]
            pub fn $with<F: FnOnce() -> String>(&self, message: F) {
                self.emit_with(Level::$level, message)
            }
        )*
    };
}

impl Channel {
    pub(crate) fn new(
        tag: &str,
        level: Level,
        session: u64,
        current_session: Arc<AtomicU64>,
        defaults: Arc<LevelDefaults>,
        sink: Arc<Sink>,
    ) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                tag: tag.to_string(),
                prefix: format!("{tag}{TAG_SUFFIX}"),
                level: AtomicU8::new(level.as_u8()),
                session,
                current_session,
                defaults,
                sink,
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// The current threshold.
    pub fn level(&self) -> Level {
        self.inner.level()
    }

    /// Whether a line at `severity` would be written.
    pub fn enabled(&self, severity: Level) -> bool {
        self.level().permits(severity)
    }

    /// Sets the threshold and returns the previous one.
    pub fn set_level(&self, level: Level) -> Level {
        self.inner.swap_level(level)
    }

    /// Re-resolves the threshold from the current defaults (picking up
    /// defaults loaded after this channel was created) and returns the
    /// previous one.
    pub fn reset_level(&self) -> Level {
        let level = self.inner.defaults.resolve(&self.inner.tag);
        self.set_level(level)
    }

    /// Whether the channel's session is still the live one.
    pub fn is_usable(&self) -> bool {
        self.check().is_ok()
    }

    /// Blocks until everything queued on the shared sink is written.
    pub fn flush(&self) {
        self.inner.sink.flush();
    }

    fn check(&self) -> Result<(), LogError> {
        match self.inner.current_session.load(Ordering::Acquire) {
            0 => Err(LogError::NotInitialised),
            live if live == self.inner.session => Ok(()),
            _ => Err(LogError::InvalidHandle {
                tag: self.inner.tag.clone(),
            }),
        }
    }

    fn try_send<F>(&self, severity: Level, text: F) -> Result<(), LogError>
    where
        F: FnOnce(&str) -> String,
    {
        self.check()?;
        if self.enabled(severity) {
            let line = text(&self.inner.prefix);
            if !self.inner.sink.write(LogLine::new(severity, line)) {
                // the session ended between the check and the write
                self.check()?;
                return Err(LogError::NotInitialised);
            }
        }
        Ok(())
    }

    /// Logs `message` at `severity`.
    pub fn try_emit(&self, severity: Level, message: &str) -> Result<(), LogError> {
        self.try_send(severity, |prefix| format!("{prefix}{message}"))
    }

    /// Logs `args` at `severity`, formatting only if the gate passes.
    pub fn try_emit_fmt(
        &self,
        severity: Level,
        args: fmt::Arguments<'_>,
    ) -> Result<(), LogError> {
        self.try_send(severity, |prefix| format!("{prefix}{args}"))
    }

    /// Logs the output of `message` at `severity`. `message` is not called
    /// when the gate suppresses the line.
    pub fn try_emit_with<F: FnOnce() -> String>(
        &self,
        severity: Level,
        message: F,
    ) -> Result<(), LogError> {
        self.try_send(severity, |prefix| format!("{prefix}{}", message()))
    }

    pub fn emit(&self, severity: Level, message: &str) {
        if let Err(e) = self.try_emit(severity, message) {
            panic!("{e}");
        }
    }

    pub fn emit_fmt(&self, severity: Level, args: fmt::Arguments<'_>) {
        if let Err(e) = self.try_emit_fmt(severity, args) {
            panic!("{e}");
        }
    }

    pub fn emit_with<F: FnOnce() -> String>(&self, severity: Level, message: F) {
        if let Err(e) = self.try_emit_with(severity, message) {
            panic!("{e}");
        }
    }

    severity_methods! {
        Trace => trace, trace_fmt, trace_with;
        Debug => debug, debug_fmt, debug_with;
        Info => info, info_fmt, info_with;
        Warn => warn, warn_fmt, warn_with;
        Error => error, error_fmt, error_with;
        Critical => critical, critical_fmt, critical_with;
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("tag", &self.inner.tag)
            .field("level", &self.level())
            .field("session", &self.inner.session)
            .finish()
    }
}
