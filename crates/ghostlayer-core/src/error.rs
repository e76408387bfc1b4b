//! Error types for GhostLayer Core

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The pattern does not compile at all
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The pattern compiles but is likely to backtrack catastrophically
    #[error("Unsafe pattern '{pattern}': {reason}")]
    UnsafePattern {
        pattern: String,
        reason: UnsafeReason,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Persistence errors
    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for both rejection kinds of the regex safety gate
    pub fn is_pattern_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidPattern { .. } | Error::UnsafePattern { .. }
        )
    }
}

/// Why the safety gate refused a custom pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeReason {
    /// A repeated group that itself contains an unbounded quantifier, e.g. `(a+)+`
    NestedQuantifier,

    /// More `*`/`+` operators than allowed
    TooManyRepetitions { found: usize, limit: usize },

    /// More groups than allowed
    TooManyGroups { found: usize, limit: usize },

    /// More `|` alternations than allowed
    TooManyAlternations { found: usize, limit: usize },
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsafeReason::NestedQuantifier => {
                write!(f, "nested quantifiers can cause catastrophic backtracking")
            }
            UnsafeReason::TooManyRepetitions { found, limit } => {
                write!(f, "{} repetition operators (limit {})", found, limit)
            }
            UnsafeReason::TooManyGroups { found, limit } => {
                write!(f, "{} groups (limit {})", found, limit)
            }
            UnsafeReason::TooManyAlternations { found, limit } => {
                write!(f, "{} alternations (limit {})", found, limit)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
