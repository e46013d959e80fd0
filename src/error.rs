//! Error types for battle resolution.
//!
//! Only data-integrity failures are errors. Calling an engine operation in
//! the wrong phase is a silent no-op, not a `BattleError`.

use thiserror::Error;

/// Errors raised by serialization, configuration and history collaborators.
///
/// # Examples
///
/// ```rust
/// use duelcore::BattleError;
///
/// let err = BattleError::invalid_field("challenger.currentHp", "expected a non-negative integer");
/// assert_eq!(
///     err.to_string(),
///     "Invalid battle state at `challenger.currentHp`: expected a non-negative integer"
/// );
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BattleError {
    /// `serialize()` was called before any battle was loaded.
    #[error("No battle loaded")]
    NoBattleLoaded,

    /// A field failed validation while decoding a serialized state.
    ///
    /// `path` is the dotted/indexed location of the offending field,
    /// e.g. `battleLog[2].data.damage`.
    #[error("Invalid battle state at `{path}`: {reason}")]
    InvalidField { path: String, reason: String },

    /// The input was not parseable JSON.
    #[error("Malformed battle state JSON: {0}")]
    MalformedJson(String),

    /// Encoding a state to JSON failed.
    #[error("Failed to encode battle state: {0}")]
    Encode(String),

    /// A combat configuration value is out of bounds.
    #[error("Invalid combat configuration: {0}")]
    InvalidConfig(String),

    /// A history collaborator could not persist a finished battle.
    #[error("Failed to save battle history: {0}")]
    HistorySave(String),
}

impl BattleError {
    /// Shorthand for [`BattleError::InvalidField`].
    pub fn invalid_field(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The field path for validation errors, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::InvalidField { path, .. } => Some(path),
            _ => None,
        }
    }
}
