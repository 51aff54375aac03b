//! Error types for the duel simulation.

use thiserror::Error;

/// Result type alias using [`DuelError`].
pub type Result<T> = std::result::Result<T, DuelError>;

/// Top-level error type for all duel simulation errors.
///
/// Every variant is a setup-time or storage failure. Once a match is
/// running, frame processing cannot fail.
#[derive(Debug, Error)]
pub enum DuelError {
    /// A key binding is missing for one of a fighter's actions.
    #[error("Missing key binding for {fighter} {action}")]
    MissingKeyBinding {
        /// Which fighter.
        fighter: String,
        /// Which action (left, right, jump, attack).
        action: &'static str,
    },

    /// The same physical key is bound to more than one action.
    #[error("Key '{key}' is bound more than once ({first} and {second})")]
    DuplicateKeyBinding {
        /// The offending key identifier.
        key: String,
        /// First binding that uses the key.
        first: String,
        /// Second binding that uses the key.
        second: String,
    },

    /// An animation clip definition cannot be played.
    #[error("Invalid clip '{clip}' for {owner}: {reason}")]
    InvalidClip {
        /// Fighter or prop that owns the clip.
        owner: String,
        /// Clip name.
        clip: String,
        /// Why the clip was rejected.
        reason: String,
    },

    /// A numeric configuration value is out of range.
    #[error("Invalid config value '{field}': {reason}")]
    InvalidConfig {
        /// Field path, e.g. `physics.gravity`.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Failed to parse a RON configuration document.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse {
        /// Source path, or `<inline>` for strings.
        path: String,
        /// Parser message.
        message: String,
    },

    /// Filesystem failure while loading or saving.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Binary encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A stored artifact was written by an incompatible version.
    #[error("Version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the data.
        found: u32,
    },
}

impl From<bincode::Error> for DuelError {
    fn from(err: bincode::Error) -> Self {
        DuelError::Serialization(err.to_string())
    }
}
