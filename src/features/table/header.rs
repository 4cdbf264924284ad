//! Header row detection

use super::grid::GridRow;
use super::model::{HeaderMode, TableOptions};
use crate::core::document::SourceLine;

/// Decide the header mode once, from options and source layout
///
/// An explicit `header` or `footer` option disables detection. Otherwise
/// the first row is an implicit header when the table's first line holds
/// the whole row on its own and is followed by a blank line.
pub fn detect_header(options: &TableOptions, lines: &[SourceLine], rows: &[GridRow]) -> HeaderMode {
    if options.header {
        return HeaderMode::ExplicitHeader;
    }
    if options.footer || options.noheader {
        return HeaderMode::NoHeader;
    }

    let Some(first_row) = rows.first() else {
        return HeaderMode::NoHeader;
    };
    let Some(first_line) = lines.first() else {
        return HeaderMode::NoHeader;
    };
    if first_line.text.trim().is_empty() {
        return HeaderMode::NoHeader;
    }

    let single_line = first_row
        .cells()
        .all(|cell| cell.index == 0 && !cell.text.trim_end().contains('\n'));
    let blank_follows = lines
        .get(1)
        .map(|line| line.text.trim().is_empty())
        .unwrap_or(false);

    if single_line && blank_follows {
        HeaderMode::ImplicitHeader
    } else {
        HeaderMode::NoHeader
    }
}
