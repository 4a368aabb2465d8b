//! Sheet planning: the grid layout state machine.
//!
//! Writing is split in two phases. `plan_table` walks an adapted table and
//! records everything a worksheet needs (typed cell writes, shared style
//! handles, merge rectangles, column widths, row heights, and the outer
//! border paint) into a [`SheetPlan`]. The flush in [`crate::xlsx`] then
//! replays the plan against `rust_xlsxwriter`. Geometry stays testable
//! without ever re-reading an XLSX file.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tablecast_engine::style::{side, ComputedStyle, Side};
use tablecast_engine::table::{Table, TableCell};
use tablecast_engine::{CellType, StyleError, TextRun};

/// Default row height in points; multi-line content grows in units of this.
pub const ROW_HEIGHT: f64 = 15.0;

/// Border edges, indexable into [`PlannedCell::edge_overrides`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top = 0,
    Bottom = 1,
    Left = 2,
    Right = 3,
}

/// What gets written at one grid position, already resolved by type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellWrite {
    Blank,
    Text(String),
    Rich(Vec<TextRun>),
    Number(f64),
    Bool(bool),
    Formula(String),
}

/// One grid position scheduled for writing.
#[derive(Debug, Clone)]
pub struct PlannedCell {
    pub value: CellWrite,
    pub style: Arc<ComputedStyle>,
    /// Outer-border paint per edge; `None` keeps the style's own side.
    pub edge_overrides: [Option<Side>; 4],
}

/// An inclusive merge rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRegion {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl MergeRegion {
    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

/// Everything one worksheet needs, accumulated across tables.
#[derive(Debug, Default)]
pub struct SheetPlan {
    pub cells: BTreeMap<(u32, u16), PlannedCell>,
    pub merges: Vec<MergeRegion>,
    pub col_widths: HashMap<u16, f64>,
    pub row_heights: HashMap<u32, f64>,
}

impl SheetPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a prior merge claims this position.
    fn is_covered(&self, row: u32, col: u16) -> bool {
        self.merges.iter().any(|merge| merge.contains(row, col))
    }

    fn grow_col_width(&mut self, col: u16, width: f64) {
        let entry = self.col_widths.entry(col).or_insert(0.0);
        if width > *entry {
            *entry = width;
        }
    }

    fn grow_row_height(&mut self, row: u32, height: f64) {
        let entry = self.row_heights.entry(row).or_insert(ROW_HEIGHT);
        if height > *entry {
            *entry = height;
        }
    }
}

/// Write one adapted table into the plan starting at `start_row`, column 0.
///
/// Returns the first free row below the written block. After all rows are
/// placed, the table's own border sides are painted along the four outer
/// edges of the block, never onto interior seams.
pub fn plan_table(
    plan: &mut SheetPlan,
    table: &Table,
    start_row: u32,
) -> Result<u32, StyleError> {
    let first_col: u16 = 0;
    let mut row = start_row;
    let mut cols_written: u16 = 0;

    for table_row in table.rows() {
        let mut col = first_col;
        plan.row_heights.entry(row).or_insert(ROW_HEIGHT);
        for cell in &table_row.cells {
            col = plan_cell(plan, cell, row, col);
            col += 1;
        }
        cols_written = cols_written.max(col);
        row += 1;
    }

    if row > start_row && cols_written > first_col {
        paint_external_borders(plan, table, start_row, row - 1, first_col, cols_written - 1)?;
    }

    Ok(row)
}

/// Place one cell at or after (row, col); returns the column it landed on.
fn plan_cell(plan: &mut SheetPlan, cell: &TableCell, row: u32, mut col: u16) -> u16 {
    let text = cell.plain_text();
    let line_lengths: Vec<usize> = text.split('\n').map(|line| line.chars().count()).collect();
    let content_width = (line_lengths.iter().copied().max().unwrap_or(0) + 2) as f64;
    let content_height = line_lengths.len() as f64 * ROW_HEIGHT;

    let colspan = cell.colspan.max(1);
    let rowspan = cell.rowspan.max(1);

    // Skip positions claimed by an earlier merge, widening each skipped
    // column so the spanning content still fits above it.
    while plan.is_covered(row, col) {
        plan.grow_col_width(col, span_width(content_width, colspan));
        col += 1;
    }

    if colspan > 1 || rowspan > 1 {
        plan.merges.push(MergeRegion {
            first_row: row,
            first_col: col,
            last_row: row + rowspan - 1,
            last_col: col + colspan as u16 - 1,
        });
    }

    plan.cells.insert(
        (row, col),
        PlannedCell {
            value: cell_write(cell, text),
            style: Arc::clone(&cell.style),
            edge_overrides: [None, None, None, None],
        },
    );

    // Every column under the span shares the divided content width.
    for spanned in col..col + colspan as u16 {
        plan.grow_col_width(spanned, span_width(content_width, colspan));
    }
    plan.grow_row_height(row, content_height);

    col
}

/// Per-column share of a spanned cell's content width.
fn span_width(content_width: f64, colspan: u32) -> f64 {
    (content_width / colspan as f64).floor() + 1.0
}

/// Decide the typed write for a cell from its inferred data type.
fn cell_write(cell: &TableCell, text: String) -> CellWrite {
    match cell.cell_type {
        CellType::Formula => CellWrite::Formula(text.trim().to_string()),
        CellType::Null => CellWrite::Blank,
        CellType::Numeric => match text.trim().parse::<f64>() {
            Ok(number) => CellWrite::Number(number),
            Err(_) => {
                log::warn!("numeric cell {text:?} does not parse; writing as text");
                text_write(cell, text)
            }
        },
        CellType::Bool => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => CellWrite::Bool(true),
            "false" | "0" => CellWrite::Bool(false),
            _ => text_write(cell, text),
        },
        _ => text_write(cell, text),
    }
}

fn text_write(cell: &TableCell, text: String) -> CellWrite {
    if cell.is_rich() {
        CellWrite::Rich(cell.runs.clone())
    } else if text.is_empty() {
        CellWrite::Blank
    } else {
        CellWrite::Text(text)
    }
}

/// Paint the table's own border sides onto the outer edges of the written
/// block. Each affected cell keeps its own border on the other three sides.
fn paint_external_borders(
    plan: &mut SheetPlan,
    table: &Table,
    first_row: u32,
    last_row: u32,
    first_col: u16,
    last_col: u16,
) -> Result<(), StyleError> {
    let top = side(&table.store, "top")?;
    if top.is_visible() {
        for col in first_col..=last_col {
            set_edge(plan, first_row, col, Edge::Top, &top);
        }
    }

    let bottom = side(&table.store, "bottom")?;
    if bottom.is_visible() {
        for col in first_col..=last_col {
            set_edge(plan, last_row, col, Edge::Bottom, &bottom);
        }
    }

    let left = side(&table.store, "left")?;
    if left.is_visible() {
        for row in first_row..=last_row {
            set_edge(plan, row, first_col, Edge::Left, &left);
        }
    }

    let right = side(&table.store, "right")?;
    if right.is_visible() {
        for row in first_row..=last_row {
            set_edge(plan, row, last_col, Edge::Right, &right);
        }
    }

    Ok(())
}

/// Override one edge of a planned cell. Positions covered by a merge carry
/// no cell of their own; the merge anchor's format spans the whole region.
fn set_edge(plan: &mut SheetPlan, row: u32, col: u16, edge: Edge, side: &Side) {
    if let Some(cell) = plan.cells.get_mut(&(row, col)) {
        cell.edge_overrides[edge as usize] = Some(side.clone());
    }
}
