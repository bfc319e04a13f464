use std::path::PathBuf;

/// Errors returned by [`crate::LoggingSystem::initialise`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("logging system is already initialised")]
    AlreadyInitialised,

    #[error("invalid log configuration `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("log directory does not exist: {}", .0.display())]
    DirectoryMissing(PathBuf),

    #[error("unable to open log sink: {0}")]
    Sink(#[from] std::io::Error),
}

/// Errors from creating or using a channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    #[error("logging system is not initialised")]
    NotInitialised,

    /// The channel was created before the system was last re-initialised.
    #[error("channel `{tag}` belongs to a finalised logging session")]
    InvalidHandle { tag: String },

    #[error("tag `{0}` is reserved")]
    ReservedTag(String),
}

/// Errors from administrative level updates.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("no channel with tag `{0}`")]
    UnknownTag(String),

    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),

    #[error("malformed level update: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A caller-identified fatal condition. It has already been written to the
/// sink at `Critical` and flushed; the application entry point decides how to
/// terminate, usually with [`FatalError::exit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fatal: {message}")]
pub struct FatalError {
    pub message: String,
}

impl FatalError {
    /// Prints the message on stderr and exits the process with status 1.
    pub fn exit(self) -> ! {
        eprintln!("{self}");
        std::process::exit(1)
    }
}
