//! Parse-wide state
//!
//! One [`ParseContext`] exists per call to a parse entry point. It is passed
//! by mutable reference through every document parse, including the nested
//! parses of asciidoc cells, and carries everything that is shared across
//! that recursion: the position stack, diagnostics, the anchor catalog and
//! the callout counter. Attribute scopes and footnotes are per document and
//! live elsewhere.

use crate::core::options::ParseOptions;
use crate::features::refs::{RefCatalog, RefEntry, RefKind};
use crate::utils::diagnostics::{
    Diagnostic, DiagnosticLevel, Diagnostics, FrameId, PositionStack, SourcePosition,
};
use crate::utils::error::ParseError;
use crate::utils::files::FileResolver;

pub struct ParseContext<'r> {
    resolver: &'r dyn FileResolver,
    pub options: ParseOptions,
    pub positions: PositionStack,
    pub diagnostics: Diagnostics,
    pub references: RefCatalog,
    /// Last callout ordinal handed out
    callouts: u32,
    /// First fatal error absorbed by a failed cell
    fatal: Option<ParseError>,
    /// Current nested document depth, for logging
    depth: usize,
}

impl<'r> ParseContext<'r> {
    pub fn new(resolver: &'r dyn FileResolver, options: ParseOptions) -> Self {
        Self {
            resolver,
            positions: PositionStack::new(options.file_name.clone()),
            options,
            diagnostics: Diagnostics::new(),
            references: RefCatalog::new(),
            callouts: 0,
            fatal: None,
            depth: 0,
        }
    }

    pub fn resolver(&self) -> &'r dyn FileResolver {
        self.resolver
    }

    /// Resolve a frame-local position
    pub fn position(&self, frame: FrameId, line: usize, column: usize) -> SourcePosition {
        self.positions.resolve(frame, line, column)
    }

    /// Record a diagnostic at a frame-local position
    pub fn report(
        &mut self,
        level: DiagnosticLevel,
        frame: FrameId,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) {
        self.report_at(Diagnostic::new(level, message), frame, line, column);
    }

    /// Record a prepared diagnostic at a frame-local position
    pub fn report_at(&mut self, diagnostic: Diagnostic, frame: FrameId, line: usize, column: usize) {
        let position = self.position(frame, line, column);
        self.diagnostics.add(diagnostic.at(&position));
    }

    pub fn warn(&mut self, frame: FrameId, line: usize, column: usize, message: impl Into<String>) {
        self.report(DiagnosticLevel::Warning, frame, line, column, message);
    }

    pub fn error(&mut self, frame: FrameId, line: usize, column: usize, message: impl Into<String>) {
        self.report(DiagnosticLevel::Error, frame, line, column, message);
    }

    pub fn info(&mut self, frame: FrameId, line: usize, column: usize, message: impl Into<String>) {
        self.report(DiagnosticLevel::Info, frame, line, column, message);
    }

    /// Next number of the callout sequence shared by every document
    pub fn next_callout(&mut self) -> u32 {
        self.callouts += 1;
        self.callouts
    }

    /// Keep the first fatal error swallowed by a failed cell
    pub fn record_fatal(&mut self, err: ParseError) {
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
    }

    pub fn take_fatal(&mut self) -> Option<ParseError> {
        self.fatal.take()
    }

    /// Register an anchor in the outermost catalog; duplicates warn
    pub fn register_anchor(
        &mut self,
        id: &str,
        kind: RefKind,
        reftext: Option<String>,
        position: SourcePosition,
    ) {
        let entry = RefEntry {
            id: id.to_string(),
            kind,
            reftext,
            position: position.clone(),
        };
        if !self.references.register(entry) {
            self.diagnostics.add(
                Diagnostic::warning(format!("id assigned to anchor already in use: {}", id))
                    .at(&position),
            );
        }
    }

    pub fn record_reference(&mut self, target: &str, position: SourcePosition) {
        self.references.record_reference(target, position);
    }

    /// Warn about every cross-reference without a matching anchor
    pub fn validate_references(&mut self) {
        let unresolved: Vec<_> = self.references.unresolved().cloned().collect();
        for xref in unresolved {
            self.diagnostics.add(
                Diagnostic::warning(format!("possible invalid reference: {}", xref.target))
                    .at(&xref.position),
            );
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter_nested(&mut self) {
        self.depth += 1;
        tracing::debug!(depth = self.depth, "entering nested document");
    }

    pub(crate) fn leave_nested(&mut self) {
        tracing::debug!(depth = self.depth, "leaving nested document");
        self.depth = self.depth.saturating_sub(1);
    }
}
