//! Record splitting
//!
//! Turns the source lines between the table delimiters into a flat
//! sequence of raw cells and blank line markers. Rows do not exist yet at
//! this stage; the grid assembler builds them from the column count.

use super::cell::split_cell_spec;
use super::model::{TableCellFormat, TableFormat};
use crate::core::context::ParseContext;
use crate::core::document::SourceLine;
use crate::utils::diagnostics::{Diagnostic, FrameId};

/// Cell text as read from the source, before content parsing
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub format: TableCellFormat,
    pub text: String,
    pub frame: FrameId,
    /// Frame-local line where the cell text starts
    pub line: usize,
    /// Column of the first character after the separator
    pub column: usize,
    /// Index of the starting line within the table body
    pub index: usize,
}

impl RawCell {
    fn open(format: TableCellFormat, source: &SourceLine, column: usize, index: usize) -> Self {
        Self {
            format,
            text: String::new(),
            frame: source.frame,
            line: source.line,
            column,
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplitEvent {
    Cell(RawCell),
    BlankLine { index: usize },
}

/// Split the table body according to its format
pub fn split_records(
    ctx: &mut ParseContext,
    lines: &[SourceLine],
    format: TableFormat,
    separator: char,
) -> Vec<SplitEvent> {
    match format {
        TableFormat::Psv => split_psv(ctx, lines, separator),
        TableFormat::Dsv | TableFormat::Csv => split_delimited(ctx, lines, format, separator),
    }
}

// ============================================================================
// PSV
// ============================================================================

struct PsvState {
    events: Vec<SplitEvent>,
    open: Option<RawCell>,
    /// Blank lines seen while a cell was open
    pending_blanks: Vec<usize>,
}

impl PsvState {
    /// Emit the open cell; trailing blank lines follow it
    fn close(&mut self, trailing_blanks: bool) {
        if let Some(cell) = self.open.take() {
            self.events.push(SplitEvent::Cell(cell));
        }
        let blanks = std::mem::take(&mut self.pending_blanks);
        if trailing_blanks {
            self.events
                .extend(blanks.into_iter().map(|index| SplitEvent::BlankLine { index }));
        }
    }
}

fn split_psv(ctx: &mut ParseContext, lines: &[SourceLine], sep: char) -> Vec<SplitEvent> {
    let mut state = PsvState {
        events: Vec::new(),
        open: None,
        pending_blanks: Vec::new(),
    };

    for (index, source) in lines.iter().enumerate() {
        let line = source.text.as_str();

        if line.trim().is_empty() {
            match state.open.as_mut() {
                Some(cell) => {
                    cell.text.push('\n');
                    state.pending_blanks.push(index);
                }
                None => state.events.push(SplitEvent::BlankLine { index }),
            }
            continue;
        }

        if let Some(cell) = state.open.as_mut() {
            cell.text.push('\n');
        }

        let chars: Vec<char> = line.chars().collect();
        let mut segment = String::new();
        let mut first_boundary = true;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\\' && chars.get(i + 1) == Some(&sep) {
                if i + 2 == chars.len() {
                    // a trailing escaped separator stays as written
                    segment.push('\\');
                }
                segment.push(sep);
                i += 2;
                continue;
            }

            if c != sep {
                segment.push(c);
                i += 1;
                continue;
            }

            let (before, spec) = split_cell_spec(&segment, first_boundary);
            match state.open.as_mut() {
                Some(cell) => {
                    let trailing = first_boundary && before.trim().is_empty();
                    cell.text.push_str(before);
                    state.close(trailing);
                }
                None if !before.trim().is_empty() => {
                    missing_separator(ctx, source, sep);
                    let mut cell = RawCell::open(TableCellFormat::default(), source, 1, index);
                    cell.text.push_str(before);
                    state.events.push(SplitEvent::Cell(cell));
                }
                None => {}
            }

            state.open = Some(RawCell::open(
                spec.unwrap_or_default(),
                source,
                i + 2,
                index,
            ));
            segment.clear();
            first_boundary = false;
            i += 1;
        }

        match state.open.as_mut() {
            Some(cell) => {
                if first_boundary && !segment.trim().is_empty() {
                    // content continued on this line
                    state.pending_blanks.clear();
                }
                cell.text.push_str(&segment);
            }
            None => {
                missing_separator(ctx, source, sep);
                let mut cell = RawCell::open(TableCellFormat::default(), source, 1, index);
                cell.text.push_str(&segment);
                state.open = Some(cell);
            }
        }
    }

    state.close(true);
    state.events
}

fn missing_separator(ctx: &mut ParseContext, source: &SourceLine, sep: char) {
    let diagnostic =
        Diagnostic::warning("table missing leading separator; recovering automatically")
            .with_source(source.text.as_str())
            .with_suggestion(format!("start the first cell of the line with '{}'", sep));
    ctx.report_at(diagnostic, source.frame, source.line, 1);
}

// ============================================================================
// DSV / CSV
// ============================================================================

fn split_delimited(
    ctx: &mut ParseContext,
    lines: &[SourceLine],
    format: TableFormat,
    sep: char,
) -> Vec<SplitEvent> {
    let mut events = Vec::new();
    let mut current: Option<RawCell> = None;
    let mut in_quotes = false;

    for (index, source) in lines.iter().enumerate() {
        let line = source.text.as_str();

        if !in_quotes && line.trim().is_empty() {
            events.push(SplitEvent::BlankLine { index });
            continue;
        }

        let mut cell = match current.take() {
            Some(mut cell) if in_quotes => {
                cell.text.push('\n');
                cell
            }
            _ => RawCell::open(TableCellFormat::default(), source, 1, index),
        };

        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            if in_quotes {
                if c == '"' {
                    if chars.get(i + 1) == Some(&'"') {
                        cell.text.push('"');
                        i += 2;
                        continue;
                    }
                    in_quotes = false;
                } else {
                    cell.text.push(c);
                }
                i += 1;
                continue;
            }

            if format == TableFormat::Dsv && c == '\\' && chars.get(i + 1) == Some(&sep) {
                cell.text.push(sep);
                i += 2;
                continue;
            }

            if c == sep {
                events.push(SplitEvent::Cell(cell));
                cell = RawCell::open(TableCellFormat::default(), source, i + 2, index);
            } else if c == '"' && cell.text.trim().is_empty() {
                cell.text.clear();
                in_quotes = true;
            } else {
                cell.text.push(c);
            }
            i += 1;
        }

        if in_quotes {
            current = Some(cell);
        } else {
            // end of record
            events.push(SplitEvent::Cell(cell));
        }
    }

    if let Some(cell) = current {
        ctx.error(
            cell.frame,
            cell.line,
            cell.column,
            format!("unclosed quote in {} table cell", format.name()),
        );
        events.push(SplitEvent::Cell(cell));
    }

    events
}
