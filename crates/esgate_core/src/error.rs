//! Error types for esgate.

use serde::Serialize;
use thiserror::Error;

/// A syntax error raised while tokenizing or parsing.
///
/// Gating rejections and grammar errors share this shape.  The column is
/// 1-based, matching the conventions of Esprima-compatible tools.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("Line {line_number}: {message}")]
pub struct SyntaxError {
    /// Byte offset the error is reported at.
    pub index: usize,
    /// 1-based line number.
    pub line_number: u32,
    /// 1-based column number.
    pub column: u32,
    /// Human-readable description, e.g. `Unexpected token =>`.
    pub message: String,
}

impl SyntaxError {
    /// Build an error at `index`, computing line and column from `source`.
    pub fn at(source: &str, index: usize, message: impl Into<String>) -> Self {
        let pos = crate::parser::scanner::line_info(source, index);
        Self {
            index,
            line_number: pos.line,
            column: pos.column + 1,
            message: message.into(),
        }
    }
}

/// All errors that can be produced by esgate.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text was rejected.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// An options object could not be deserialized.
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
}

/// Convenient `Result` alias for fallible esgate operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_position_is_one_based() {
        let err = SyntaxError::at("a\nbc d", 5, "Unexpected token d");
        assert_eq!(err.line_number, 2);
        assert_eq!(err.column, 4);
        assert_eq!(err.to_string(), "Line 2: Unexpected token d");
    }

    #[test]
    fn test_options_error_wraps_serde() {
        let err: Error = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid options"));
    }
}
