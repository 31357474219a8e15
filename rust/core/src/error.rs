// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for lexing, parsing and indexing exchange files.

use std::fmt;
use thiserror::Error;

/// Result type for exchange-file operations
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of characters copied into a scan error preview
pub const PREVIEW_LEN: usize = 40;

/// Errors raised while scanning or parsing an exchange file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Unmatched input, unterminated literal or missing structural marker
    #[error("Scan error at line {line}: {message} (near {preview:?})")]
    Scan {
        line: usize,
        message: String,
        preview: String,
    },

    /// An entity instance name was defined twice
    #[error("Duplicate entity instance #{id} at line {line} (first defined at line {first_line})")]
    DuplicateReference {
        id: u64,
        first_line: usize,
        line: usize,
    },

    /// Grammar failure outside an entity instance body
    #[error("Structural error at line {line}: {message}")]
    Structural { line: usize, message: String },

    /// Malformed entity instance body with resynchronisation disabled
    #[error("Malformed entity instance{} at line {line}: {message}", id.map(|id| format!(" #{}", id)).unwrap_or_default())]
    Entity {
        id: Option<u64>,
        line: usize,
        message: String,
    },

    /// Keyword table registration or activation failed
    #[error("Schema registration error: {0}")]
    Schema(#[from] SchemaError),

    /// The malformed-instance budget was exhausted
    #[error("Too many malformed entity instances ({count}), parse aborted at line {line}")]
    TooManyErrors { count: usize, line: usize },

    /// The index sink rejected a row
    #[error("Index sink error at line {line}: {source}")]
    Sink {
        line: usize,
        #[source]
        source: SinkError,
    },
}

impl Error {
    /// Create a scan error with a bounded excerpt of the offending input
    pub fn scan(line: usize, message: impl Into<String>, rest: &str) -> Self {
        Error::Scan {
            line,
            message: message.into(),
            preview: preview(rest),
        }
    }

    /// Create a structural error
    pub fn structural(line: usize, message: impl Into<String>) -> Self {
        Error::Structural {
            line,
            message: message.into(),
        }
    }

    /// Line number the error was raised at, if it is tied to the input
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Scan { line, .. }
            | Error::DuplicateReference { line, .. }
            | Error::Structural { line, .. }
            | Error::Entity { line, .. }
            | Error::TooManyErrors { line, .. }
            | Error::Sink { line, .. } => Some(*line),
            Error::Schema(_) => None,
        }
    }
}

/// Errors raised by the schema keyword registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("schema '{0}' is not registered")]
    Unregistered(String),

    #[error("keyword '{keyword}' in schema '{schema}' collides with a reserved token name")]
    ReservedKeyword { schema: String, keyword: String },
}

/// Errors reported by an index sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("entity instance #{0} is already stored")]
    DuplicateEntity(u64),

    #[error("index is already committed")]
    Committed,

    #[error("{0}")]
    Backend(String),
}

/// A malformed entity instance that was skipped
///
/// Parsing resumed at the next instance boundary; `first_line..=last_line`
/// is the discarded span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResyncWarning {
    /// Instance name, when the failure happened after `#N`
    pub id: Option<u64>,
    pub first_line: usize,
    pub last_line: usize,
    pub message: String,
}

impl fmt::Display for ResyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "skipped #{} at lines {}-{}: {}",
                id, self.first_line, self.last_line, self.message
            ),
            None => write!(
                f,
                "skipped lines {}-{}: {}",
                self.first_line, self.last_line, self.message
            ),
        }
    }
}

/// First [`PREVIEW_LEN`] characters of `rest`
pub(crate) fn preview(rest: &str) -> String {
    rest.chars().take(PREVIEW_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_is_bounded() {
        let long = "x".repeat(500);
        match Error::scan(3, "unexpected character", &long) {
            Error::Scan { line, preview, .. } => {
                assert_eq!(line, 3);
                assert_eq!(preview.len(), PREVIEW_LEN);
            }
            other => panic!("Expected scan error, got {:?}", other),
        }
    }

    #[test]
    fn test_every_input_error_has_a_line() {
        let err = Error::DuplicateReference {
            id: 5,
            first_line: 2,
            line: 9,
        };
        assert_eq!(err.line(), Some(9));
        assert!(err.to_string().contains("#5"));
        assert!(err.to_string().contains("line 2"));

        let err = Error::Entity {
            id: None,
            line: 4,
            message: "expected ')'".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed entity instance at line 4: expected ')'"
        );
    }

    #[test]
    fn test_resync_warning_display() {
        let warning = ResyncWarning {
            id: Some(7),
            first_line: 10,
            last_line: 12,
            message: "expected parameter".into(),
        };
        assert_eq!(
            warning.to_string(),
            "skipped #7 at lines 10-12: expected parameter"
        );
    }
}
