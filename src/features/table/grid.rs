//! Grid assembly
//!
//! Folds the splitter's flat cell sequence into rows of exactly
//! `column_count` positions. Column spans emit placeholders in the same
//! row; row spans are tracked per column and turned into placeholders when
//! the following rows are assembled.

use super::splitter::{RawCell, SplitEvent};
use crate::core::context::ParseContext;
use crate::utils::diagnostics::Diagnostic;

/// Grid position before content parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Cell(RawCell),
    Placeholder,
}

impl Slot {
    pub fn as_cell(&self) -> Option<&RawCell> {
        match self {
            Slot::Cell(cell) => Some(cell),
            Slot::Placeholder => None,
        }
    }
}

/// A complete row of slots
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridRow {
    pub slots: Vec<Slot>,
    pub followed_by_blank: bool,
}

impl GridRow {
    pub fn cells(&self) -> impl Iterator<Item = &RawCell> {
        self.slots.iter().filter_map(Slot::as_cell)
    }
}

/// Span-aware row builder
///
/// Keeps a virtual grid state so that row-spanning cells reserve their
/// columns in the rows below them.
pub struct TableGrid {
    column_count: usize,
    /// Remaining rows each column is covered by a row span
    col_coverage: Vec<usize>,
    /// Coverage when the current row started, restored if the row is dropped
    row_start_coverage: Vec<usize>,
    current: Vec<Slot>,
    cursor: usize,
    pub rows: Vec<GridRow>,
}

impl TableGrid {
    pub fn new(column_count: usize) -> Self {
        TableGrid {
            column_count,
            col_coverage: vec![0; column_count],
            row_start_coverage: vec![0; column_count],
            current: Vec::new(),
            cursor: 0,
            rows: Vec::new(),
        }
    }

    /// Feed one splitter event
    pub fn process(&mut self, ctx: &mut ParseContext, event: SplitEvent) {
        match event {
            SplitEvent::Cell(cell) => {
                for _ in 0..cell.format.repeat() {
                    self.place(ctx, cell.clone());
                }
            }
            SplitEvent::BlankLine { .. } => {
                if self.current.is_empty() {
                    if let Some(row) = self.rows.last_mut() {
                        row.followed_by_blank = true;
                    }
                }
            }
        }
    }

    /// Close the grid; an unfinished row with real cells is dropped
    pub fn finish(self, ctx: &mut ParseContext) -> Vec<GridRow> {
        if let Some(first) = self.current.iter().find_map(Slot::as_cell) {
            ctx.error(
                first.frame,
                first.line,
                first.column,
                "dropping cells from incomplete row detected at end of table",
            );
        }
        self.rows
    }

    fn place(&mut self, ctx: &mut ParseContext, cell: RawCell) {
        if self.column_count == 0 {
            return;
        }

        // Positions reserved by row spans from above, possibly whole rows
        self.fill_covered();
        while self.cursor == self.column_count {
            self.close_row();
            self.fill_covered();
        }

        let colspan = cell.format.colspan();
        let rows_to_cover = cell.format.rowspan().saturating_sub(1);
        let end = self.cursor + colspan;

        if end > self.column_count {
            let diagnostic = Diagnostic::error(format!(
                "cell spans {} columns but only {} remain in the row; dropping row",
                colspan,
                self.column_count - self.cursor
            ))
            .with_suggestion("add columns to the cols attribute or reduce the span");
            ctx.report_at(diagnostic, cell.frame, cell.line, cell.column);
            self.drop_row();
            return;
        }
        if self.col_coverage[self.cursor..end].iter().any(|&c| c > 0) {
            ctx.error(
                cell.frame,
                cell.line,
                cell.column,
                "cell overlaps a cell spanning rows from above; dropping row",
            );
            self.drop_row();
            return;
        }

        // Mark coverage for all columns this cell spans
        for col in self.cursor..end {
            self.col_coverage[col] = rows_to_cover;
        }
        self.current.push(Slot::Cell(cell));
        for _ in 1..colspan {
            self.current.push(Slot::Placeholder);
        }
        self.cursor = end;

        self.fill_covered();
        if self.cursor == self.column_count {
            self.close_row();
        }
    }

    /// Emit placeholders for covered columns at the cursor
    fn fill_covered(&mut self) {
        while self.cursor < self.column_count && self.col_coverage[self.cursor] > 0 {
            self.col_coverage[self.cursor] -= 1;
            self.current.push(Slot::Placeholder);
            self.cursor += 1;
        }
    }

    fn close_row(&mut self) {
        self.rows.push(GridRow {
            slots: std::mem::take(&mut self.current),
            followed_by_blank: false,
        });
        self.cursor = 0;
        self.row_start_coverage = self.col_coverage.clone();
    }

    fn drop_row(&mut self) {
        self.current.clear();
        self.cursor = 0;
        self.col_coverage = self.row_start_coverage.clone();
    }
}

/// Assemble rows from splitter events
pub fn assemble_rows(
    ctx: &mut ParseContext,
    events: Vec<SplitEvent>,
    column_count: usize,
) -> Vec<GridRow> {
    let mut grid = TableGrid::new(column_count);
    for event in events {
        grid.process(ctx, event);
    }
    grid.finish(ctx)
}

/// Column count implied by the first line holding cells
pub fn infer_column_count(events: &[SplitEvent]) -> usize {
    let mut first_index = None;
    let mut count = 0;
    for event in events {
        if let SplitEvent::Cell(cell) = event {
            match first_index {
                None => first_index = Some(cell.index),
                Some(index) if index != cell.index => break,
                Some(_) => {}
            }
            count += cell.format.width();
        }
    }
    count
}
