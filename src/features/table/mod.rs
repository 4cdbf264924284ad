//! Table blocks
//!
//! A table is parsed in stages:
//! 1. `splitter`: source lines to raw cells and blank line markers
//! 2. `grid`: raw cells to rows, following spans and the column count
//! 3. `header`: decide whether the first row is a header
//! 4. `content`: parse each cell according to its style
//!
//! Column and cell specifiers are handled by `colspec` and `cell`.

pub mod cell;
pub mod colspec;
pub mod content;
pub mod grid;
pub mod header;
pub mod model;
pub mod splitter;

#[cfg(test)]
mod tests;

pub use colspec::{assign_percentages, columns_to_spec, default_columns, parse_column_spec};
pub use content::{CellHost, RowKind};
pub use model::{
    Cell, CellContent, CellSpan, CellStyle, ColumnWidth, HeaderMode, HorizontalAlign, Table,
    TableCell, TableCellFormat, TableColumn, TableFormat, TableOptions, TableRow, VerticalAlign,
};

use crate::core::document::SourceLine;
use crate::features::attributes::AttributeList;
use crate::utils::diagnostics::FrameId;
use crate::utils::error::ParseResult;

/// Where a table block starts and how it was introduced
#[derive(Debug, Clone)]
pub struct TableSource {
    /// First character of the delimiter line (`|`, `,`, `:` or `!`)
    pub delimiter: char,
    /// Block attributes preceding the delimiter
    pub attributes: AttributeList,
    pub frame: FrameId,
    /// Frame-local line of the opening delimiter
    pub line: usize,
}

/// Parse the lines between the table delimiters
///
/// Cell content is parsed through `host`, which owns the attribute scope
/// and footnotes of the document the table belongs to.
pub fn parse_table<'r>(
    host: &mut dyn CellHost<'r>,
    source: TableSource,
    lines: &[SourceLine],
) -> ParseResult<Table> {
    let TableSource {
        delimiter,
        attributes,
        frame,
        line,
    } = source;
    let ctx = host.context();
    let location = ctx.position(frame, line, 1);

    let mut format = TableFormat::from_delimiter(delimiter);
    if let Some(name) = attributes.named("format") {
        match TableFormat::from_name(name) {
            Some(f) => format = f,
            None => ctx.warn(frame, line, 1, format!("invalid table format: {}", name)),
        }
    }

    let default_separator = match (format, delimiter) {
        (TableFormat::Psv, '!') => '!',
        _ => format.default_separator(),
    };
    let separator = match attributes.named("separator") {
        Some(value) => match parse_separator(value) {
            Some(c) => c,
            None => {
                ctx.warn(frame, line, 1, format!("invalid table separator: {}", value));
                default_separator
            }
        },
        None => default_separator,
    };

    tracing::debug!(
        format = format.name(),
        separator = %separator,
        lines = lines.len(),
        "parsing table"
    );

    let events = splitter::split_records(ctx, lines, format, separator);

    let options = TableOptions::from_attributes(&attributes);
    let mut columns = match attributes.table_columns() {
        Some(cols) => cols.columns.clone(),
        None => default_columns(grid::infer_column_count(&events)),
    };
    assign_percentages(&mut columns, options.autowidth);

    let rows = grid::assemble_rows(ctx, events, columns.len());
    let header_mode = header::detect_header(&options, lines, &rows);

    let mut rows = rows.into_iter();
    let header_row = match header_mode {
        HeaderMode::NoHeader => None,
        HeaderMode::ImplicitHeader | HeaderMode::ExplicitHeader => rows.next(),
    };
    let mut body_rows: Vec<_> = rows.collect();
    let footer_row = if options.footer { body_rows.pop() } else { None };

    let header = header_row
        .map(|row| content::parse_row(host, row, &columns, RowKind::Header))
        .transpose()?;
    let body = body_rows
        .into_iter()
        .map(|row| content::parse_row(host, row, &columns, RowKind::Body))
        .collect::<ParseResult<Vec<_>>>()?;
    let footer = footer_row
        .map(|row| content::parse_row(host, row, &columns, RowKind::Footer))
        .transpose()?;

    Ok(Table {
        attributes,
        format,
        separator,
        column_count: columns.len(),
        columns,
        header_mode,
        header,
        body,
        footer,
        location,
    })
}

/// A single character, or `\t` for a tab
fn parse_separator(value: &str) -> Option<char> {
    if value == "\\t" {
        return Some('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
