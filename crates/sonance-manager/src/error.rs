//! Error type for engine operations.

use sonance_config::ConfigError;
use sonance_io::BackendError;
use thiserror::Error;

/// Errors reported by [`SoundManager`](crate::SoundManager).
///
/// Every variant except [`Backend`](Self::Backend) and
/// [`BackendBusy`](Self::BackendBusy) is a caller mistake; the
/// engine logs it and leaves its state unchanged.
#[derive(Debug, Error)]
pub enum SoundManagerError {
    /// `initialize` was called a second time.
    #[error("sound manager is already initialized")]
    AlreadyInitialized,

    /// The source is already registered.
    #[error("sound generator is already registered")]
    DuplicateRegistration,

    /// The source is neither registered nor pending.
    #[error("sound generator is not registered")]
    NotRegistered,

    /// The category name was not in the configured list.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// A level outside `[0, 1]`.
    #[error("{what} {value} out of range [0, 1]")]
    LevelOutOfRange {
        /// Which level was being set.
        what: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// The ducking condition was never added.
    #[error("ducking property is not present")]
    NotPresent,

    /// The ducking condition was already added.
    #[error("ducking property was already added")]
    DuplicateDuckingProperty,

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The backend was already borrowed, e.g. from inside
    /// [`with_backend`](crate::SoundManager::with_backend).
    #[error("backend is busy")]
    BackendBusy,

    /// The backend rejected an operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, SoundManagerError>;
