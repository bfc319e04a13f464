use std::{
    fmt,
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicU64, Ordering},
    },
};

use chanlog_core::{CHANLOG_SETTINGS, Level, LogLine, Sink};

use crate::{
    channel::Channel,
    config::LogConfig,
    defaults::{DEFAULT_TAG, LevelDefaults, PANIC_TAG},
    directory::{Directory, LevelUpdate, LevelsReport},
    error::{FatalError, InitError, LogError, UpdateError},
};

const STARTED_MARKER: &str = "LOGGER: ===== Logging system started =====";
const STOPPED_MARKER: &str = "LOGGER: ===== Logging system stopped =====";

/// State that only exists between `initialise` and `finalise`.
struct Session {
    sink: Arc<Sink>,
    panic: Channel,
}

impl Session {
    fn stop(self) {
        self.sink
            .write(LogLine::new(Level::Warn, STOPPED_MARKER.to_string()));
        self.sink.shutdown();
    }
}

struct Shared {
    defaults: Arc<LevelDefaults>,
    directory: Directory,
    /// Id of the live session, 0 when not initialised.
    current_session: Arc<AtomicU64>,
    last_session: AtomicU64,
    session: RwLock<Option<Session>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = session {
            self.current_session.store(0, Ordering::Release);
            session.stop();
        }
    }
}

/// The logging context: default levels, the channel directory and the sink.
///
/// Owned by the application's composition root and passed (or cloned, it is a
/// cheap handle) to whatever needs to create channels. Separate systems are
/// fully independent.
#[derive(Clone)]
pub struct LoggingSystem {
    shared: Arc<Shared>,
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingSystem")
            .field("initialised", &self.is_initialised())
            .finish()
    }
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                defaults: Arc::new(LevelDefaults::default()),
                directory: Directory::default(),
                current_session: Arc::new(AtomicU64::new(0)),
                last_session: AtomicU64::new(0),
                session: RwLock::new(None),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.shared
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.shared
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Merges tag defaults used by channels created from now on. Invalid
    /// level names are skipped. `DEFAULT` sets the fallback for unlisted tags.
    pub fn load_defaults<I, K, V>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        self.shared.defaults.load(entries)
    }

    /// The level a new channel tagged `tag` would start at.
    pub fn default_level(&self, tag: &str) -> Level {
        self.shared.defaults.resolve(tag)
    }

    pub fn is_initialised(&self) -> bool {
        self.shared.current_session.load(Ordering::Acquire) != 0
    }

    /// Validates `config`, opens the rolling file sink, merges
    /// `config.levels` into the defaults and starts a new session with an
    /// empty directory.
    pub fn initialise(&self, config: &LogConfig) -> Result<(), InitError> {
        let mut session = self.write();
        if session.is_some() {
            return Err(InitError::AlreadyInitialised);
        }
        let rolling = config.validate()?;
        let sink = Arc::new(Sink::rolling(rolling, config.console)?);
        self.shared.defaults.load(&config.levels);
        self.shared.directory.clear();

        let id = self.shared.last_session.fetch_add(1, Ordering::Relaxed) + 1;
        let panic = Channel::new(
            PANIC_TAG,
            Level::Critical,
            id,
            Arc::clone(&self.shared.current_session),
            Arc::clone(&self.shared.defaults),
            Arc::clone(&sink),
        );
        sink.write(LogLine::new(Level::Warn, STARTED_MARKER.to_string()));
        *session = Some(Session { sink, panic });
        self.shared.current_session.store(id, Ordering::Release);
        Ok(())
    }

    /// Writes the shutdown marker, drains and flushes the sink, and clears
    /// the directory. Existing channels become unusable. No-op when not
    /// initialised.
    pub fn finalise(&self) {
        let mut session = self.write();
        if let Some(session) = session.take() {
            self.shared.current_session.store(0, Ordering::Release);
            self.shared.directory.clear();
            session.stop();
        }
    }

    /// Blocks until every line logged so far is written out.
    pub fn flush(&self) {
        if let Some(session) = self.read().as_ref() {
            session.sink.flush();
        }
    }

    /// Creates a channel for `tag`, starting at the tag's default level, and
    /// registers it in the directory.
    pub fn channel(&self, tag: &str) -> Result<Channel, LogError> {
        if tag == DEFAULT_TAG || tag == PANIC_TAG {
            return Err(LogError::ReservedTag(tag.to_string()));
        }
        let session = self.read();
        let session = session.as_ref().ok_or(LogError::NotInitialised)?;
        let channel = Channel::new(
            tag,
            self.shared.defaults.resolve(tag),
            self.shared.current_session.load(Ordering::Acquire),
            Arc::clone(&self.shared.current_session),
            Arc::clone(&self.shared.defaults),
            Arc::clone(&session.sink),
        );
        self.shared.directory.register(&channel);
        Ok(channel)
    }

    /// The first live channel already created for `tag`, if any.
    pub(crate) fn find_channel(&self, tag: &str) -> Option<Channel> {
        self.shared.directory.find(tag)
    }

    /// Levels of all live channels in creation order.
    pub fn list_levels(&self) -> LevelsReport {
        self.shared.directory.report()
    }

    /// Sets the level of the first channel tagged `tag` and returns its
    /// previous level. When several channels share a tag only the first one
    /// created is changed.
    pub fn update_channel_level(&self, tag: &str, level: &str) -> Result<Level, UpdateError> {
        let level = Level::parse(level).ok_or_else(|| UpdateError::InvalidLevel(level.into()))?;
        self.shared.directory.update(tag, |_| level)
    }

    /// Like [`LoggingSystem::update_channel_level`], back to the tag's
    /// current default.
    pub fn reset_channel_level(&self, tag: &str) -> Result<Level, UpdateError> {
        let defaults = &self.shared.defaults;
        self.shared.directory.update(tag, |tag| defaults.resolve(tag))
    }

    /// Applies a JSON `{"tag": "...", "level": "..."}` request.
    pub fn apply_update_json(&self, body: &str) -> Result<Level, UpdateError> {
        let LevelUpdate { tag, level } = serde_json::from_str(body)?;
        self.update_channel_level(&tag, &level)
    }

    /// Writes `message` at `Critical` through the reserved `PANIC` channel,
    /// whatever the other channels' levels are. Goes to stderr when the system
    /// is not initialised.
    pub fn critical(&self, message: &str) {
        self.critical_fmt(format_args!("{message}"))
    }

    pub fn critical_fmt(&self, args: fmt::Arguments<'_>) {
        match self.read().as_ref() {
            Some(session) => session.panic.critical_fmt(args),
            None => eprintln!("{PANIC_TAG}: {args}"),
        }
    }

    /// Records a fatal condition: writes it through `PANIC`, flushes, waits
    /// `CHANLOG_PANIC_GRACE_MS`, and returns the error for the caller to
    /// propagate up to the entry point.
    pub fn fatal(&self, message: &str) -> FatalError {
        self.fatal_fmt(format_args!("{message}"))
    }

    pub fn fatal_fmt(&self, args: fmt::Arguments<'_>) -> FatalError {
        let message = args.to_string();
        {
            let session = self.read();
            match session.as_ref() {
                Some(session) => {
                    session.panic.critical(&message);
                    session.sink.flush();
                }
                None => eprintln!("{PANIC_TAG}: {message}"),
            }
        }
        std::thread::sleep(CHANLOG_SETTINGS.panic_grace());
        FatalError { message }
    }

    /// Passes `Ok` through; turns `Err(e)` into a fatal `"<message>: <e>"`.
    pub fn fatal_if<T, E: fmt::Display>(
        &self,
        message: &str,
        result: Result<T, E>,
    ) -> Result<T, FatalError> {
        result.map_err(|e| self.fatal_fmt(format_args!("{message}: {e}")))
    }

    #[cfg(test)]
    pub(crate) fn directory_len(&self) -> usize {
        self.shared.directory.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    fn setup(name: &str) -> (LoggingSystem, PathBuf) {
        let dir = PathBuf::from(format!("/tmp/chanlog_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let system = LoggingSystem::new();
        system
            .initialise(&LogConfig::new(&dir, "test.log").with_count(2))
            .unwrap();
        (system, dir.join("test.log"))
    }

    fn lines(path: &PathBuf) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l[19..].to_string())
            .collect()
    }

    #[test]
    fn test_markers() {
        let (system, path) = setup("system_markers");
        assert!(system.is_initialised());
        system.finalise();
        assert!(!system.is_initialised());
        assert_eq!(
            lines(&path),
            vec![
                " [WARN] LOGGER: ===== Logging system started =====",
                " [WARN] LOGGER: ===== Logging system stopped =====",
            ]
        );
        // second finalise is a no-op
        system.finalise();
        assert_eq!(lines(&path).len(), 2);
    }

    #[test]
    fn test_reserved_tags() {
        let (system, _) = setup("system_reserved");
        assert_eq!(
            system.channel(DEFAULT_TAG).unwrap_err(),
            LogError::ReservedTag(DEFAULT_TAG.into())
        );
        assert_eq!(
            system.channel(PANIC_TAG).unwrap_err(),
            LogError::ReservedTag(PANIC_TAG.into())
        );
        assert!(matches!(
            system.update_channel_level(PANIC_TAG, "off"),
            Err(UpdateError::UnknownTag(_))
        ));
    }

    #[test]
    fn test_directory_prunes_dropped_channels() {
        let (system, _) = setup("system_prune");
        let kept = system.channel("kept").unwrap();
        drop(system.channel("dropped").unwrap());
        let report = system.list_levels();
        assert_eq!(report.levels.len(), 1);
        assert_eq!(report.levels[0].tag, kept.tag());
        system.channel("another").unwrap();
        assert_eq!(system.directory_len(), 2);
    }

    #[test]
    fn test_critical_bypasses_channel_levels() {
        let (system, path) = setup("system_critical");
        system.load_defaults([(DEFAULT_TAG, "off")]);
        let quiet = system.channel("quiet").unwrap();
        quiet.critical("suppressed");
        system.critical("always written");
        system.critical_fmt(format_args!("code {}", 7));
        system.finalise();
        assert_eq!(
            lines(&path)[1..3],
            [
                " [CRITICAL] PANIC: always written".to_string(),
                " [CRITICAL] PANIC: code 7".to_string(),
            ]
        );
    }

    #[test]
    fn test_fatal_is_flushed_before_returning() {
        let (system, path) = setup("system_fatal");
        let err = system.fatal("disk on fire");
        assert_eq!(err.message, "disk on fire");
        assert_eq!(lines(&path).last().unwrap(), " [CRITICAL] PANIC: disk on fire");
        system.finalise();
    }

    #[test]
    fn test_fatal_if() {
        let (system, path) = setup("system_fatal_if");
        let ok: Result<u32, std::io::Error> = Ok(3);
        assert_eq!(system.fatal_if("open config", ok), Ok(3));
        assert_eq!(lines(&path).len(), 1);

        let failed: Result<u32, String> = Err("permission denied".into());
        let err = system.fatal_if("open config", failed).unwrap_err();
        assert_eq!(err.message, "open config: permission denied");
        assert_eq!(err.to_string(), "fatal: open config: permission denied");
        assert_eq!(
            lines(&path).last().unwrap(),
            " [CRITICAL] PANIC: open config: permission denied"
        );
        system.finalise();
    }

    #[test]
    fn test_fatal_without_session() {
        let system = LoggingSystem::new();
        let err = system.fatal_fmt(format_args!("early {}", "failure"));
        assert_eq!(err.message, "early failure");
    }

    #[test]
    fn test_drop_writes_stop_marker() {
        let (system, path) = setup("system_drop");
        system.channel("main").unwrap().error("bye");
        drop(system);
        assert_eq!(
            lines(&path),
            vec![
                " [WARN] LOGGER: ===== Logging system started =====",
                " [ERROR] main: bye",
                " [WARN] LOGGER: ===== Logging system stopped =====",
            ]
        );
    }
}
