//! Cell content classification
//!
//! Each real cell gets its effective style and is parsed accordingly:
//!
//! | style                        | content                               |
//! |------------------------------|---------------------------------------|
//! | default, header              | paragraphs with normal substitutions  |
//! | emphasis, strong, monospace  | same, each paragraph wrapped          |
//! | literal                      | one verbatim block                    |
//! | asciidoc                     | independent nested document           |

use lazy_static::lazy_static;
use regex::Regex;

use super::grid::{GridRow, Slot};
use super::model::{
    Cell, CellContent, CellStyle, HorizontalAlign, TableCell, TableColumn, TableRow,
    VerticalAlign,
};
use super::splitter::RawCell;
use crate::core::ast::{Document, Element, Inline, LiteralBlock, Paragraph};
use crate::core::context::ParseContext;
use crate::core::scope::AttributeScope;
use crate::data::constants::CELL_BACKGROUND;
use crate::features::refs::RefKind;
use crate::utils::diagnostics::{Diagnostic, FrameId};
use crate::utils::error::ParseResult;

lazy_static! {
    static ref LEADING_ANCHOR: Regex =
        Regex::new(r"^\[\[([A-Za-z_:][\w:.-]*)(?:,\s*([^\]]+?))?\]\]").unwrap();
}

/// The document a table belongs to, as seen by its cells
pub trait CellHost<'r> {
    /// Parse-wide state
    fn context(&mut self) -> &mut ParseContext<'r>;

    /// Attribute scope of the owning document
    fn scope(&self) -> &AttributeScope;

    /// Paragraphs with normal substitutions, split on blank lines
    ///
    /// `line` and `column` locate the first character of `text` in `frame`.
    fn normal_paragraphs(
        &mut self,
        text: &str,
        frame: FrameId,
        line: usize,
        column: usize,
    ) -> Vec<Paragraph>;

    /// Parse `text` as a nested document starting at `(line, column)` of
    /// `frame`
    fn nested_document(
        &mut self,
        text: &str,
        frame: FrameId,
        line: usize,
        column: usize,
    ) -> ParseResult<Document>;
}

/// Which part of the table a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Body,
    Footer,
}

/// Parse the content of every real cell of a row, in order
pub fn parse_row<'r>(
    host: &mut dyn CellHost<'r>,
    row: GridRow,
    columns: &[TableColumn],
    kind: RowKind,
) -> ParseResult<TableRow> {
    let mut cells = Vec::with_capacity(row.slots.len());
    for (index, slot) in row.slots.into_iter().enumerate() {
        let raw = match slot {
            Slot::Placeholder => {
                cells.push(TableCell::Placeholder);
                continue;
            }
            Slot::Cell(raw) => raw,
        };
        let column = columns.get(index).cloned().unwrap_or_else(TableColumn::new);

        // header cells never take the column style
        let style = match kind {
            RowKind::Header => raw.format.style.unwrap_or(CellStyle::Header),
            RowKind::Body | RowKind::Footer => raw.format.style.or(column.style).unwrap_or_default(),
        };
        let halign: HorizontalAlign = raw.format.horizontal_align.or(column.halign).unwrap_or_default();
        let valign: VerticalAlign = raw.format.vertical_align.or(column.valign).unwrap_or_default();

        cells.push(TableCell::Real(parse_cell(host, raw, style, halign, valign)?));
    }
    Ok(TableRow {
        cells,
        followed_by_blank: row.followed_by_blank,
    })
}

/// Parse one cell with its effective style
pub fn parse_cell<'r>(
    host: &mut dyn CellHost<'r>,
    raw: RawCell,
    style: CellStyle,
    halign: HorizontalAlign,
    valign: VerticalAlign,
) -> ParseResult<Cell> {
    let location = host.context().position(raw.frame, raw.line, raw.column);

    let content = match style {
        CellStyle::Literal => literal_content(host, &raw),
        CellStyle::AsciiDoc => asciidoc_content(host, &raw)?,
        CellStyle::Default | CellStyle::Header => {
            CellContent::Elements(formatted_paragraphs(host, &raw, |nodes| nodes))
        }
        CellStyle::Emphasis => {
            CellContent::Elements(formatted_paragraphs(host, &raw, |n| vec![Inline::Emphasis(n)]))
        }
        CellStyle::Strong => {
            CellContent::Elements(formatted_paragraphs(host, &raw, |n| vec![Inline::Strong(n)]))
        }
        CellStyle::Monospace => {
            CellContent::Elements(formatted_paragraphs(host, &raw, |n| vec![Inline::Monospace(n)]))
        }
    };

    Ok(Cell {
        format: raw.format,
        style,
        halign,
        valign,
        content,
        background: host.scope().get(CELL_BACKGROUND).map(str::to_string),
        source: raw.text,
        location,
    })
}

/// Strip leading whitespace, returning the rest and where it starts
fn trim_start_located(raw: &RawCell) -> (&str, usize, usize) {
    let text = raw.text.as_str();
    let trimmed = text.trim_start();
    let skipped = &text[..text.len() - trimmed.len()];
    match skipped.rfind('\n') {
        Some(nl) => (
            trimmed,
            raw.line + skipped.matches('\n').count(),
            skipped[nl + 1..].chars().count() + 1,
        ),
        None => (trimmed, raw.line, raw.column + skipped.chars().count()),
    }
}

fn formatted_paragraphs<'r>(
    host: &mut dyn CellHost<'r>,
    raw: &RawCell,
    wrap: impl Fn(Vec<Inline>) -> Vec<Inline>,
) -> Vec<Element> {
    let (text, line, column) = trim_start_located(raw);
    host.normal_paragraphs(text.trim_end(), raw.frame, line, column)
        .into_iter()
        .map(|mut p| {
            p.content = wrap(std::mem::take(&mut p.content));
            Element::Paragraph(p)
        })
        .collect()
}

fn literal_content<'r>(host: &mut dyn CellHost<'r>, raw: &RawCell) -> CellContent {
    let mut text = raw.text.strip_prefix('\n').unwrap_or(&raw.text);
    let (line, column) = if text.len() < raw.text.len() {
        (raw.line + 1, 1)
    } else {
        (raw.line, raw.column)
    };

    let indent = text.len() - text.trim_start_matches([' ', '\t']).len();
    if let Some(caps) = LEADING_ANCHOR.captures(&text[indent..]) {
        let reftext = caps.get(2).map(|m| m.as_str().trim().to_string());
        let position = host.context().position(raw.frame, line, column + indent);
        host.context()
            .register_anchor(&caps[1], RefKind::Inline, reftext, position);
        text = &text[indent + caps[0].len()..];
    }

    let content = text.trim_end();
    if content.is_empty() {
        return CellContent::Elements(Vec::new());
    }
    let location = host.context().position(raw.frame, line, column);
    CellContent::Elements(vec![Element::Literal(LiteralBlock {
        title: None,
        content: content.to_string(),
        location,
    })])
}

fn asciidoc_content<'r>(host: &mut dyn CellHost<'r>, raw: &RawCell) -> ParseResult<CellContent> {
    // a newline right after the separator keeps the next line's indentation
    let (text, line, column) = match raw.text.strip_prefix('\n') {
        Some(rest) => (rest, raw.line + 1, 1),
        None => {
            let rest = raw.text.trim_start_matches([' ', '\t']);
            let skipped = raw.text.len() - rest.len();
            (rest, raw.line, raw.column + skipped)
        }
    };

    match host.nested_document(text.trim_end(), raw.frame, line, column) {
        Ok(doc) => Ok(CellContent::Document(Box::new(doc))),
        Err(err) if !host.context().options.abort_on_cell_failure => {
            let ctx = host.context();
            let mut diag = Diagnostic::error(format!("failed to parse table cell: {}", err));
            if let Some(position) = err.position() {
                diag = diag.at(position);
            }
            ctx.diagnostics.add(diag);
            let message = err.to_string();
            ctx.record_fatal(err);
            Ok(CellContent::Failed { message })
        }
        Err(err) => Err(err),
    }
}
