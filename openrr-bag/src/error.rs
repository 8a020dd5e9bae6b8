use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("openrr-bag: Failed to open log store {:?}: {}", path, message)]
    LogOpen { path: PathBuf, message: String },
    #[error("openrr-bag: Failed to read metadata {:?} ({}).", .0, .1)]
    Metadata(PathBuf, #[source] serde_yaml::Error),
    #[error("openrr-bag: Failed to read log store {:?} ({}).", .0, .1)]
    Read(PathBuf, #[source] rusqlite::Error),
    #[error(
        "openrr-bag: Failed to decode message on topic={} as {} ({})",
        topic,
        type_name,
        message
    )]
    Decode {
        topic: String,
        type_name: String,
        message: String,
    },
    #[error(
        "openrr-bag: Length mismatch for joint={} (index = {}, position = {}, velocity = {})",
        joint_name,
        index,
        position,
        velocity
    )]
    LengthMismatch {
        joint_name: String,
        index: usize,
        position: usize,
        velocity: usize,
    },
}

impl Error {
    pub(crate) fn log_open(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LogOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error was raised while opening the log store.
    pub fn is_log_open(&self) -> bool {
        matches!(self, Self::LogOpen { .. } | Self::Metadata(..))
    }

    /// Returns `true` if this error was raised while decoding a record.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::LengthMismatch { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
