use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chanlog_core::Level;
use serde::{Deserialize, Serialize};

use crate::{
    channel::{Channel, ChannelInner},
    error::UpdateError,
};

/// One `{tag, level}` entry of a [`LevelsReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelRecord {
    pub tag: String,
    pub category: &'static str,
}

/// Levels of every live channel, in creation order.
///
/// Serializes as `{"levels":[{"tag":"main","category":"debug"}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelsReport {
    pub levels: Vec<LevelRecord>,
}

impl LevelsReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The reported level name for `tag` (first match).
    pub fn get(&self, tag: &str) -> Option<&'static str> {
        self.levels
            .iter()
            .find(|record| record.tag == tag)
            .map(|record| record.category)
    }
}

/// An administrative request to change a channel's level, as received from
/// whatever admin transport the application exposes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelUpdate {
    pub tag: String,
    pub level: String,
}

/// Registry of the channels created in the current session.
///
/// Holds weak references: a channel dropped by every owner disappears from
/// listings and updates.
#[derive(Default)]
pub(crate) struct Directory {
    channels: Mutex<Vec<Weak<ChannelInner>>>,
}

impl Directory {
    fn lock(&self) -> MutexGuard<'_, Vec<Weak<ChannelInner>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, channel: &Channel) {
        let mut channels = self.lock();
        channels.retain(|weak| weak.strong_count() > 0);
        channels.push(Arc::downgrade(&channel.inner));
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    /// The first live channel tagged `tag`.
    pub(crate) fn find(&self, tag: &str) -> Option<Channel> {
        self.lock()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|channel| channel.tag == tag)
            .map(|inner| Channel { inner })
    }

    /// Best-effort listing: the lock is held only to copy the list, levels are
    /// read afterwards and may race with concurrent updates.
    pub(crate) fn report(&self) -> LevelsReport {
        let snapshot: Vec<Weak<ChannelInner>> = self.lock().clone();
        let levels = snapshot
            .iter()
            .filter_map(Weak::upgrade)
            .map(|channel| LevelRecord {
                tag: channel.tag.clone(),
                category: channel.level().as_str(),
            })
            .collect();
        LevelsReport { levels }
    }

    /// Sets the level of the first live channel tagged `tag` and returns its
    /// previous level. Other channels sharing the tag are left alone. The scan
    /// and the store happen under one lock acquisition.
    pub(crate) fn update<F: FnOnce(&str) -> Level>(
        &self,
        tag: &str,
        level: F,
    ) -> Result<Level, UpdateError> {
        let channels = self.lock();
        let channel = channels
            .iter()
            .filter_map(Weak::upgrade)
            .find(|channel| channel.tag == tag)
            .ok_or_else(|| UpdateError::UnknownTag(tag.to_string()))?;
        Ok(channel.swap_level(level(tag)))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
