//! Error codes for the Dotlens diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - DOT parser errors
//! - `E2xx` - Elaboration errors
//! - `E3xx` - xdot drawing attribute errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that cannot start any DOT token.
    E002,

    /// Unterminated HTML string.
    ///
    /// An HTML string was opened with `<` but its angle brackets never balance.
    E003,

    /// Unterminated block comment.
    ///
    /// A `/*` comment has no closing `*/`.
    E004,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before the graph body was closed.
    E101,

    // =========================================================================
    // Elaboration Errors (E2xx)
    // =========================================================================
    /// Edge operator does not match the graph kind.
    ///
    /// `->` was used in an undirected graph, or `--` in a directed one.
    E200,

    /// Duplicate edge id.
    ///
    /// Two edges were declared with the same `id` attribute.
    E201,

    // =========================================================================
    // xdot Errors (E3xx)
    // =========================================================================
    /// Unknown xdot operation.
    ///
    /// A drawing attribute contains an op code that is not part of xdot.
    E300,

    /// Malformed xdot operand.
    ///
    /// A number was expected in a drawing attribute but not found.
    E301,

    /// Malformed xdot string.
    ///
    /// A string operand's byte count does not fit the attribute value.
    E302,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            // Elaboration errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            // xdot errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "unterminated HTML string",
            ErrorCode::E004 => "unterminated block comment",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            // Elaboration errors
            ErrorCode::E200 => "edge operator does not match graph kind",
            ErrorCode::E201 => "duplicate edge id",
            // xdot errors
            ErrorCode::E300 => "unknown xdot operation",
            ErrorCode::E301 => "malformed xdot operand",
            ErrorCode::E302 => "malformed xdot string",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
