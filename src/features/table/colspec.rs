//! Column specifier resolution
//!
//! Grammar of one comma (or semicolon) separated token:
//!
//! ```text
//! [N*] [<|^|>] [.<|.^|.>] [width | width% | ~] [a|d|e|h|l|m|s]
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use super::model::{CellStyle, ColumnWidth, HorizontalAlign, TableColumn, VerticalAlign};
use crate::core::value::MaybeSet;

lazy_static! {
    static ref COLUMN_TOKEN: Regex =
        Regex::new(r"^(?:(\d+)\*)?([<^>])?(?:\.([<^>]))?(\d+%?|~)?([adehlms])?$").unwrap();
}

/// Resolve a `cols` value into column descriptors
///
/// Returns `None` when the value holds no tokens at all, which callers
/// treat exactly like a missing `cols` attribute.
pub fn parse_column_spec(spec: &str) -> Option<Vec<TableColumn>> {
    let columns: Vec<TableColumn> = spec
        .split([',', ';'])
        .map(|token| token.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|token| !token.is_empty())
        .flat_map(|token| parse_column_token(&token))
        .collect();

    if columns.is_empty() {
        None
    } else {
        Some(columns)
    }
}

/// Expand a single token; malformed tokens become one default column
pub fn parse_column_token(token: &str) -> Vec<TableColumn> {
    let Some(caps) = COLUMN_TOKEN.captures(token) else {
        tracing::debug!(token, "malformed column specifier, using defaults");
        return vec![TableColumn::new()];
    };

    let multiplier = match caps.get(1) {
        Some(m) => match m.as_str().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                tracing::debug!(token, "invalid column multiplier, using defaults");
                return vec![TableColumn::new()];
            }
        },
        None => 1,
    };

    let width = caps.get(4).and_then(|m| {
        let w = m.as_str();
        if w == "~" {
            Some(ColumnWidth::Auto)
        } else if let Some(p) = w.strip_suffix('%') {
            p.parse().ok().map(ColumnWidth::Percentage)
        } else {
            w.parse().ok().map(ColumnWidth::Proportional)
        }
    });

    let column = TableColumn {
        multiplier,
        halign: caps
            .get(2)
            .and_then(|m| m.as_str().chars().next())
            .and_then(HorizontalAlign::from_char)
            .into(),
        valign: caps
            .get(3)
            .and_then(|m| m.as_str().chars().next())
            .and_then(VerticalAlign::from_char)
            .into(),
        width: width.into(),
        percentage: None,
        style: caps
            .get(5)
            .and_then(|m| m.as_str().chars().next())
            .and_then(CellStyle::from_letter)
            .into(),
    };

    vec![column; multiplier]
}

/// Default descriptors for a table without a usable `cols` attribute
pub fn default_columns(count: usize) -> Vec<TableColumn> {
    vec![TableColumn::new(); count]
}

/// Write resolved columns back out in canonical specifier syntax
///
/// Columns expanded from one `N*` token are folded back into it, so
/// resolving the result yields the same column list again.
pub fn columns_to_spec(columns: &[TableColumn]) -> String {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < columns.len() {
        let col = &columns[i];
        let multiplier = col.multiplier.max(1);
        let mut token = String::new();

        if let MaybeSet::Set(h) = col.halign {
            token.push(h.to_char());
        }
        if let MaybeSet::Set(v) = col.valign {
            token.push('.');
            token.push(v.to_char());
        }
        match col.width {
            MaybeSet::Set(ColumnWidth::Proportional(w)) => token.push_str(&w.to_string()),
            MaybeSet::Set(ColumnWidth::Percentage(p)) => token.push_str(&format!("{}%", p)),
            MaybeSet::Set(ColumnWidth::Auto) => token.push('~'),
            MaybeSet::Unset => {}
        }
        if let MaybeSet::Set(style) = col.style {
            token.push(style.letter());
        }

        // an empty token would be dropped on the way back in
        if multiplier > 1 || token.is_empty() {
            token.insert_str(0, &format!("{}*", multiplier));
        }

        tokens.push(token);
        i += multiplier;
    }
    tokens.join(",")
}

/// Compute each column's share of the table width
///
/// Explicit percentages are taken as written; proportional widths split
/// what remains. Values are rounded to four decimals and the last
/// proportional column absorbs the rounding error.
pub fn assign_percentages(columns: &mut [TableColumn], autowidth: bool) {
    if autowidth {
        for col in columns.iter_mut() {
            col.percentage = None;
        }
        return;
    }

    let mut fixed = 0.0;
    let mut units = 0u64;
    for col in columns.iter() {
        match col.width {
            MaybeSet::Set(ColumnWidth::Percentage(p)) => fixed += p as f64,
            MaybeSet::Set(ColumnWidth::Auto) => {}
            MaybeSet::Set(ColumnWidth::Proportional(w)) => units += w as u64,
            MaybeSet::Unset => units += 1,
        }
    }

    let available = (100.0 - fixed).max(0.0);
    let last_proportional = columns
        .iter()
        .rposition(|c| !matches!(c.width, MaybeSet::Set(ColumnWidth::Auto | ColumnWidth::Percentage(_))));

    let mut assigned = 0.0;
    for (i, col) in columns.iter_mut().enumerate() {
        col.percentage = match col.width {
            MaybeSet::Set(ColumnWidth::Auto) => None,
            MaybeSet::Set(ColumnWidth::Percentage(p)) => Some(p as f64),
            width => {
                let w = match width {
                    MaybeSet::Set(ColumnWidth::Proportional(w)) => w as f64,
                    _ => 1.0,
                };
                let share = if Some(i) == last_proportional {
                    round4(available - assigned)
                } else if units == 0 {
                    0.0
                } else {
                    round4(available * w / units as f64)
                };
                assigned += share;
                Some(share)
            }
        };
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
