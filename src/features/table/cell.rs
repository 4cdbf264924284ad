//! Cell format prefixes
//!
//! In PSV tables the text directly in front of a separator may end with a
//! format prefix for the cell that separator opens:
//!
//! ```text
//! |A 2+|spans two columns .3+^.>s|spans three rows
//! ```
//!
//! A prefix is either a repeat (`N*`) or a span (`C+`, `.R+`, `C.R+`),
//! followed by optional alignments and a style letter. It must be
//! preceded by whitespace, unless the segment starts its line.

use lazy_static::lazy_static;
use regex::Regex;

use super::model::{CellSpan, CellStyle, HorizontalAlign, TableCellFormat, VerticalAlign};
use crate::core::value::MaybeSet;

lazy_static! {
    static ref CELL_SPEC: Regex = Regex::new(
        r"(?:^|[ \t])((?:(\d+)\*|(\d+)?(?:\.(\d+))?\+)?([<^>])?(?:\.([<^>]))?([adehlms])?)$"
    )
    .unwrap();
}

/// Split the trailing format prefix off a segment
///
/// `line_start` tells whether the segment begins at the start of a source
/// line. Returns the remaining text and the parsed prefix, if any.
pub fn split_cell_spec(segment: &str, line_start: bool) -> (&str, Option<TableCellFormat>) {
    let Some(caps) = CELL_SPEC.captures(segment) else {
        return (segment, None);
    };
    let Some(spec) = caps.get(1).filter(|m| !m.as_str().is_empty()) else {
        return (segment, None);
    };
    // mid-line, `|a|` is a cell containing "a"
    if spec.start() == 0 && !line_start {
        return (segment, None);
    }
    // a bare `+` or `.+` is not a span
    if spec.as_str().starts_with('+') || spec.as_str().starts_with(".+") {
        return (segment, None);
    }

    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<usize>().ok());
    let letter = |i: usize| caps.get(i).and_then(|m| m.as_str().chars().next());

    let mut format = TableCellFormat::default();
    if let Some(n) = number(2) {
        if n == 0 {
            return (segment, None);
        }
        format.multiplier = MaybeSet::Set(n);
    }
    if spec.as_str().contains('+') {
        let column = number(3);
        let row = number(4);
        if column == Some(0) || row == Some(0) {
            return (segment, None);
        }
        format.span = CellSpan {
            column: column.into(),
            row: row.into(),
        };
    }
    format.horizontal_align = letter(5).and_then(HorizontalAlign::from_char).into();
    format.vertical_align = letter(6).and_then(VerticalAlign::from_char).into();
    format.style = letter(7).and_then(CellStyle::from_letter).into();

    (&segment[..spec.start()], Some(format))
}
