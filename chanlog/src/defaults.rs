use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use chanlog_core::Level;

/// Reserved tag whose entry is the fallback for tags without their own entry.
pub const DEFAULT_TAG: &str = "DEFAULT";

/// Reserved tag of the channel behind the critical and fatal operations.
pub const PANIC_TAG: &str = "PANIC";

/// Level used when neither the tag nor [`DEFAULT_TAG`] has an entry.
pub const FLOOR_LEVEL: Level = Level::Error;

/// Tag to level defaults consulted whenever a channel is created.
#[derive(Debug, Default)]
pub struct LevelDefaults {
    levels: RwLock<HashMap<String, Level>>,
}

impl LevelDefaults {
    /// Merges `entries` into the map. Entries whose level name does not parse
    /// are skipped; valid entries overwrite earlier ones. Returns how many
    /// entries were accepted.
    ///
    /// Channels that already exist keep their level.
    pub fn load<I, K, V>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut levels = self.levels.write().unwrap_or_else(PoisonError::into_inner);
        let mut accepted = 0;
        for (tag, name) in entries {
            if let Some(level) = Level::parse(name.as_ref()) {
                levels.insert(tag.into(), level);
                accepted += 1;
            }
        }
        accepted
    }

    /// The explicit entry for `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<Level> {
        self.levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .copied()
    }

    /// `tag`'s entry, else the `DEFAULT` entry, else [`FLOOR_LEVEL`].
    pub fn resolve(&self, tag: &str) -> Level {
        let levels = self.levels.read().unwrap_or_else(PoisonError::into_inner);
        levels
            .get(tag)
            .or_else(|| levels.get(DEFAULT_TAG))
            .copied()
            .unwrap_or(FLOOR_LEVEL)
    }
}
