//! Diagnostics and source position tracking
//!
//! Every warning or error raised while parsing carries a resolved
//! `(file, line, column)`. Nested cell documents and included files are
//! parsed with their own local line numbering, so positions are recorded
//! against a frame of the [`PositionStack`] and resolved by composing each
//! frame's offset with its parent's:
//!
//! ```text
//! outer.adoc          frame 0 (file root)
//!   table cell a|     frame 1 (offset: line 11, column 3 of frame 0)
//!     nested cell a|  frame 2 (offset: line 2 of frame 1)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tabledoc::diagnostics::PositionStack;
//!
//! let mut stack = PositionStack::new(Some("doc.adoc".to_string()));
//! let cell = stack.push_nested(0, 10, 3);
//! let pos = stack.resolve(cell, 1, 1);
//! assert_eq!((pos.line, pos.column), (10, 3));
//! ```

use std::fmt;

/// Identifier of a frame on the [`PositionStack`]
pub type FrameId = usize;

/// A fully resolved position in the original sources (1-indexed)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourcePosition {
    /// File the position belongs to, `None` for anonymous input
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(file: Option<String>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file {
            Some(ref file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "line {}:{}", self.line, self.column),
        }
    }
}

/// One entry of the position stack
#[derive(Debug, Clone)]
struct Frame {
    parent: Option<FrameId>,
    /// Frames that start a new source; resolution stops there
    file_root: bool,
    file: Option<String>,
    line_offset: usize,
    /// Only applies to local line 1
    column_offset: usize,
}

/// Position stack mirroring the parse recursion
///
/// Frames are pushed when a nested cell document or an included file is
/// entered and truncated back to a mark when that parse returns, so the
/// stack is strictly LIFO with respect to the recursion.
#[derive(Debug, Clone)]
pub struct PositionStack {
    frames: Vec<Frame>,
}

impl PositionStack {
    /// Create a stack whose root frame is the top-level source
    pub fn new(file: Option<String>) -> Self {
        Self {
            frames: vec![Frame {
                parent: None,
                file_root: true,
                file,
                line_offset: 0,
                column_offset: 0,
            }],
        }
    }

    /// The root frame
    pub fn root(&self) -> FrameId {
        0
    }

    /// Push a frame whose local line 1, column 1 sits at `(line, column)`
    /// of `parent`
    pub fn push_nested(&mut self, parent: FrameId, line: usize, column: usize) -> FrameId {
        self.frames.push(Frame {
            parent: Some(parent),
            file_root: false,
            file: None,
            line_offset: line.saturating_sub(1),
            column_offset: column.saturating_sub(1),
        });
        self.frames.len() - 1
    }

    /// Push a frame for a file included from `parent`
    pub fn push_file(&mut self, parent: FrameId, file: impl Into<String>) -> FrameId {
        self.frames.push(Frame {
            parent: Some(parent),
            file_root: true,
            file: Some(file.into()),
            line_offset: 0,
            column_offset: 0,
        });
        self.frames.len() - 1
    }

    /// Current height of the stack, to be passed to [`PositionStack::truncate`]
    pub fn mark(&self) -> usize {
        self.frames.len()
    }

    /// Pop every frame pushed after `mark`
    pub fn truncate(&mut self, mark: usize) {
        self.frames.truncate(mark.max(1));
    }

    /// Number of file frames between `frame` and the root
    pub fn include_depth(&self, frame: FrameId) -> usize {
        let mut depth = 0;
        let mut current = Some(frame);
        while let Some(id) = current {
            let Some(f) = self.frames.get(id) else { break };
            if f.file_root && f.parent.is_some() {
                depth += 1;
            }
            current = f.parent;
        }
        depth
    }

    /// Resolve a frame-local position to a position in the original file
    pub fn resolve(&self, frame: FrameId, line: usize, column: usize) -> SourcePosition {
        let mut line = line;
        let mut column = column;
        let mut current = Some(frame);

        while let Some(id) = current {
            let Some(f) = self.frames.get(id) else { break };
            if line == 1 {
                column += f.column_offset;
            }
            line += f.line_offset;
            if f.file_root {
                return SourcePosition::new(f.file.clone(), line, column);
            }
            current = f.parent;
        }

        SourcePosition::new(None, line, column)
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DiagnosticLevel {
    /// Informational note
    Info,
    /// Warning - the parse recovered
    Warning,
    /// Error - content was dropped or degraded
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Human-readable message
    pub message: String,
    /// Source file, if known
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: Option<usize>,
    /// Column number (1-indexed)
    pub column: Option<usize>,
    /// Relevant source text
    pub source_text: Option<String>,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            source_text: None,
            suggestion: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    /// Add a resolved position
    pub fn at(mut self, position: &SourcePosition) -> Self {
        self.file = position.file.clone();
        self.line = Some(position.line);
        self.column = Some(position.column);
        self
    }

    /// Add source text
    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    /// Add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// The resolved position, if one was attached
    pub fn position(&self) -> Option<SourcePosition> {
        Some(SourcePosition::new(
            self.file.clone(),
            self.line?,
            self.column.unwrap_or(1),
        ))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: level: message
        //         --> file:line:column
        //         |
        //         | source text
        //         = help: suggestion

        write!(f, "{}: {}", self.level, self.message)?;

        if let Some(pos) = self.position() {
            write!(f, "\n  --> {}", pos)?;
        }

        if let Some(ref source) = self.source_text {
            write!(f, "\n  |\n  | {}", source)?;
        }

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  = help: {}", suggestion)?;
        }

        Ok(())
    }
}

/// Collected diagnostics with a summary
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostics {
    /// All diagnostics, in emission order
    pub diagnostics: Vec<Diagnostic>,
    /// Number of errors
    pub errors: usize,
    /// Number of warnings
    pub warnings: usize,
    /// Number of info messages
    pub infos: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic, mirroring it to the log
    pub fn add(&mut self, diag: Diagnostic) {
        let file = diag.file.as_deref().unwrap_or("<input>");
        let line = diag.line.unwrap_or(0);
        match diag.level {
            DiagnosticLevel::Error => {
                self.errors += 1;
                tracing::error!(file, line, "{}", diag.message);
            }
            DiagnosticLevel::Warning => {
                self.warnings += 1;
                tracing::warn!(file, line, "{}", diag.message);
            }
            DiagnosticLevel::Info => {
                self.infos += 1;
                tracing::info!(file, line, "{}", diag.message);
            }
        }
        self.diagnostics.push(diag);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Check if there are any issues at all
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics whose message contains `needle`
    pub fn matching<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.message.contains(needle))
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.errors > 0 {
            parts.push(format!(
                "{} error{}",
                self.errors,
                if self.errors == 1 { "" } else { "s" }
            ));
        }
        if self.warnings > 0 {
            parts.push(format!(
                "{} warning{}",
                self.warnings,
                if self.warnings == 1 { "" } else { "s" }
            ));
        }
        if self.infos > 0 {
            parts.push(format!(
                "{} note{}",
                self.infos,
                if self.infos == 1 { "" } else { "s" }
            ));
        }
        if parts.is_empty() {
            "no issues found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Format diagnostics for terminal output
pub fn format_diagnostics(result: &Diagnostics, use_color: bool) -> String {
    let mut output = String::new();

    for diag in &result.diagnostics {
        if use_color {
            let color = match diag.level {
                DiagnosticLevel::Error => "\x1b[31m",   // Red
                DiagnosticLevel::Warning => "\x1b[33m", // Yellow
                DiagnosticLevel::Info => "\x1b[34m",    // Blue
            };
            output.push_str(color);
            output.push_str(&format!("{}", diag));
            output.push_str("\x1b[0m\n\n");
        } else {
            output.push_str(&format!("{}\n\n", diag));
        }
    }

    if use_color {
        if result.has_errors() {
            output.push_str("\x1b[31m");
        } else if result.warnings > 0 {
            output.push_str("\x1b[33m");
        } else {
            output.push_str("\x1b[32m");
        }
    }

    output.push_str(&format!("Summary: {}", result.summary()));

    if use_color {
        output.push_str("\x1b[0m");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_root_frame() {
        let stack = PositionStack::new(Some("main.adoc".to_string()));
        let pos = stack.resolve(stack.root(), 4, 2);
        assert_eq!(pos, SourcePosition::new(Some("main.adoc".into()), 4, 2));
    }

    #[test]
    fn test_resolve_anonymous_root() {
        let stack = PositionStack::new(None);
        let pos = stack.resolve(0, 1, 1);
        assert_eq!(pos.file, None);
    }

    #[test]
    fn test_resolve_doubly_nested_frame() {
        let mut stack = PositionStack::new(Some("main.adoc".to_string()));
        // cell content starts on line 10, column 5 of the outer source
        let cell = stack.push_nested(0, 10, 5);
        // inner cell content starts on line 3 (column 2) of the outer cell
        let inner = stack.push_nested(cell, 3, 2);

        let first = stack.resolve(inner, 1, 1);
        assert_eq!((first.line, first.column), (12, 2));

        let later = stack.resolve(inner, 2, 4);
        assert_eq!((later.line, later.column), (13, 4));
    }

    #[test]
    fn test_column_offset_of_first_line_composes() {
        let mut stack = PositionStack::new(None);
        let cell = stack.push_nested(0, 2, 5);
        let inner = stack.push_nested(cell, 1, 3);
        let pos = stack.resolve(inner, 1, 1);
        // column 3 of the cell's first line is column 7 of line 2
        assert_eq!((pos.line, pos.column), (2, 7));
    }

    #[test]
    fn test_file_frame_stops_resolution() {
        let mut stack = PositionStack::new(Some("main.adoc".to_string()));
        let cell = stack.push_nested(0, 20, 1);
        let included = stack.push_file(cell, "part.adoc");
        let pos = stack.resolve(included, 3, 1);
        assert_eq!(pos, SourcePosition::new(Some("part.adoc".into()), 3, 1));
        assert_eq!(stack.include_depth(included), 1);
    }

    #[test]
    fn test_truncate_is_lifo() {
        let mut stack = PositionStack::new(None);
        let mark = stack.mark();
        stack.push_nested(0, 2, 1);
        stack.push_nested(1, 2, 1);
        stack.truncate(mark);
        assert_eq!(stack.mark(), mark);
    }

    #[test]
    fn test_summary_format() {
        let mut result = Diagnostics::new();
        result.add(Diagnostic::error("dropped row"));
        result.add(Diagnostic::warning("recovered"));

        let summary = result.summary();
        assert!(summary.contains("1 error"));
        assert!(summary.contains("1 warning"));
    }

    #[test]
    fn test_diagnostic_display_has_position() {
        let pos = SourcePosition::new(Some("a.adoc".into()), 3, 7);
        let diag = Diagnostic::warning("missing leading separator").at(&pos);
        let text = diag.to_string();
        assert!(text.contains("a.adoc:3:7"));
        assert!(text.starts_with("warning"));
    }
}
