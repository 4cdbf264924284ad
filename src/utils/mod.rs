//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Diagnostics and source position tracking
//! - File resolution for include directives
//! - Error types and result types

pub mod diagnostics;
pub mod error;
pub mod files;

// Re-export commonly used items
pub use diagnostics::{
    format_diagnostics, Diagnostic, DiagnosticLevel, Diagnostics, FrameId, PositionStack,
    SourcePosition,
};
pub use error::{ParseError, ParseOutput, ParseResult};
pub use files::{
    parse_include_directive, FileResolveError, FileResolver, IncludeDirective,
    MemoryFileResolver, NoopFileResolver, StdFileResolver,
};
