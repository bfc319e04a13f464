use std::{sync::LazyLock, time::Duration};

use derive_from_env::FromEnv;

/// Process tuning read once from `CHANLOG_*` environment variables.
#[derive(FromEnv)]
#[from_env(prefix = "CHANLOG")]
#[allow(non_snake_case)]
pub struct ChanlogSettings {
    // period of the writer threads' background flush
    #[from_env(default = "100")]
    pub FLUSH_INTERVAL_MS: u64,
    // grace sleep after a fatal message
    #[from_env(default = "100")]
    pub PANIC_GRACE_MS: u64,
}

impl ChanlogSettings {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.FLUSH_INTERVAL_MS)
    }

    pub fn panic_grace(&self) -> Duration {
        Duration::from_millis(self.PANIC_GRACE_MS)
    }
}

pub static CHANLOG_SETTINGS: LazyLock<ChanlogSettings> = LazyLock::new(|| {
    ChanlogSettings::from_env().expect("invalid CHANLOG_* environment variables")
});
