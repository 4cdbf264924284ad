//! Error handling for tabledoc parsing
//!
//! Only problems that stop a parse are errors. Everything the parser can
//! recover from (a missing leading separator, a dropped row, an unclosed
//! quote) is reported as a [`Diagnostic`](crate::diagnostics::Diagnostic)
//! instead.

use thiserror::Error;

use crate::core::ast::Document;
use crate::utils::diagnostics::{Diagnostics, SourcePosition};
use crate::utils::files::FileResolveError;

/// Fatal parse error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// An include directive whose target the resolver could not provide
    #[error("unresolved include directive '{target}' at {position}: {reason}")]
    UnresolvedInclude {
        target: String,
        reason: String,
        position: SourcePosition,
    },
    /// Include directives nested deeper than the configured limit
    #[error("include '{target}' at {position} exceeds the maximum include depth of {depth}")]
    IncludeDepthExceeded {
        target: String,
        depth: usize,
        position: SourcePosition,
    },
    /// Invalid input
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// IO error (for file operations)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::Io {
            message: err.to_string(),
        }
    }
}

impl From<FileResolveError> for ParseError {
    fn from(err: FileResolveError) -> Self {
        ParseError::Io {
            message: err.to_string(),
        }
    }
}

// Convenience constructors for errors
impl ParseError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ParseError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unresolved_include(
        target: impl Into<String>,
        reason: impl Into<String>,
        position: SourcePosition,
    ) -> Self {
        ParseError::UnresolvedInclude {
            target: target.into(),
            reason: reason.into(),
            position,
        }
    }

    /// Resolved source position, when the error has one
    pub fn position(&self) -> Option<&SourcePosition> {
        match self {
            ParseError::UnresolvedInclude { position, .. }
            | ParseError::IncludeDepthExceeded { position, .. } => Some(position),
            ParseError::InvalidInput { .. } | ParseError::Io { .. } => None,
        }
    }
}

/// Result type for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse output with the diagnostics side channel
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseOutput {
    /// The parsed document tree
    pub document: Document,
    /// Warnings and non-fatal errors, in emission order
    pub diagnostics: Diagnostics,
    /// First fatal error absorbed by a failed table cell
    #[cfg_attr(feature = "serde", serde(skip))]
    pub fatal: Option<ParseError>,
}

impl ParseOutput {
    pub fn new(document: Document, diagnostics: Diagnostics) -> Self {
        Self {
            document,
            diagnostics,
            fatal: None,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.fatal.is_none()
    }
}
