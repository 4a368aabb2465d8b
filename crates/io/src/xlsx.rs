//! XLSX output: replay a [`SheetPlan`] against `rust_xlsxwriter`, plus the
//! document-level conversion entry points.

use std::path::Path;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};
use scraper::Html;
use tablecast_engine::style::{BorderStyle, FillPattern, HorizontalAlign, Side, VerticalAlign};
use tablecast_engine::table::adapt_tables;
use tablecast_engine::{StyleCache, TextRun};

use crate::error::WriteError;
use crate::plan::{plan_table, CellWrite, Edge, PlannedCell, SheetPlan};

/// Statistics from one document conversion.
#[derive(Debug, Default)]
pub struct ConvertReport {
    pub tables_written: usize,
    pub cells_written: usize,
    pub merges_written: usize,
    pub styles_interned: usize,
}

impl ConvertReport {
    /// One-line summary suitable for display.
    pub fn summary(&self) -> String {
        format!(
            "{} table{} · {} cells · {} merged regions · {} styles",
            self.tables_written,
            if self.tables_written == 1 { "" } else { "s" },
            self.cells_written,
            self.merges_written,
            self.styles_interned,
        )
    }
}

/// Convert a pre-inlined HTML document into a new worksheet of `workbook`.
///
/// All top-level tables land on one sheet, separated by a blank row. The
/// style cache is owned by the caller so several documents can share (or
/// deliberately not share) interned styles.
pub fn document_to_workbook(
    html: &str,
    workbook: &mut Workbook,
    cache: &mut StyleCache,
) -> Result<ConvertReport, WriteError> {
    let document = Html::parse_document(html);
    let tables = adapt_tables(&document, cache)?;

    let mut plan = SheetPlan::new();
    let mut report = ConvertReport::default();
    let mut row = 0;
    for table in &tables {
        row = plan_table(&mut plan, table, row)?;
        row += 1; // blank separator row between tables
        report.tables_written += 1;
    }
    report.cells_written = plan.cells.len();
    report.merges_written = plan.merges.len();
    report.styles_interned = cache.len();

    let worksheet = workbook.add_worksheet();
    flush_plan(&plan, worksheet)?;
    Ok(report)
}

/// Convert a raw HTML document to an XLSX file at `path`.
///
/// `<br>` tags become newlines before parsing so line breaks survive into
/// wrapped spreadsheet text.
pub fn document_to_xlsx(html: &str, path: &Path) -> Result<ConvertReport, WriteError> {
    let html = normalize_line_breaks(html);
    let mut workbook = Workbook::new();
    let mut cache = StyleCache::new();
    let report = document_to_workbook(&html, &mut workbook, &mut cache)?;
    workbook.save(path)?;
    Ok(report)
}

/// Replace `<br>` variants with newline characters in raw markup.
pub fn normalize_line_breaks(html: &str) -> String {
    html.replace("<br>", "\n")
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
}

/// Write a finished plan into a worksheet.
///
/// Merges go first: `merge_range` blanks the whole rectangle with the
/// anchor's format, then the cell writes below put each anchor's typed
/// value back.
pub fn flush_plan(plan: &SheetPlan, worksheet: &mut Worksheet) -> Result<(), WriteError> {
    for merge in &plan.merges {
        let format = plan
            .cells
            .get(&(merge.first_row, merge.first_col))
            .map(cell_format)
            .unwrap_or_else(Format::new);
        worksheet.merge_range(
            merge.first_row,
            merge.first_col,
            merge.last_row,
            merge.last_col,
            "",
            &format,
        )?;
    }

    for (&(row, col), cell) in &plan.cells {
        let format = cell_format(cell);
        match &cell.value {
            CellWrite::Blank => {
                worksheet.write_blank(row, col, &format)?;
            }
            CellWrite::Text(text) => {
                worksheet.write_string_with_format(row, col, text, &format)?;
            }
            CellWrite::Number(number) => {
                worksheet.write_number_with_format(row, col, *number, &format)?;
            }
            CellWrite::Bool(value) => {
                worksheet.write_boolean_with_format(row, col, *value, &format)?;
            }
            CellWrite::Formula(formula) => {
                worksheet.write_formula_with_format(row, col, formula.as_str(), &format)?;
            }
            CellWrite::Rich(runs) => {
                write_rich(worksheet, row, col, runs, &format)?;
            }
        }
    }

    for (&col, &width) in &plan.col_widths {
        worksheet.set_column_width(col, width)?;
    }
    for (&row, &height) in &plan.row_heights {
        worksheet.set_row_height(row, height)?;
    }

    Ok(())
}

/// Write a run sequence as a rich string. A single run degrades to a plain
/// string write with the run's font folded into the cell format.
fn write_rich(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    runs: &[TextRun],
    format: &Format,
) -> Result<(), WriteError> {
    match runs {
        [] => {
            worksheet.write_blank(row, col, format)?;
        }
        [run] => {
            let format = apply_run(format.clone(), run);
            worksheet.write_string_with_format(row, col, &run.text, &format)?;
        }
        _ => {
            let run_formats: Vec<Format> = runs
                .iter()
                .map(|run| apply_run(Format::new(), run))
                .collect();
            let pairs: Vec<(&Format, &str)> = run_formats
                .iter()
                .zip(runs.iter().map(|run| run.text.as_str()))
                .collect();
            worksheet.write_rich_string_with_format(row, col, &pairs, format)?;
        }
    }
    Ok(())
}

fn apply_run(mut format: Format, run: &TextRun) -> Format {
    if run.bold {
        format = format.set_bold();
    }
    if let Some(color) = xlsx_color(run.color.as_deref()) {
        format = format.set_font_color(color);
    }
    if let Some(size) = run.size {
        format = format.set_font_size(size);
    }
    format
}

/// Build the `rust_xlsxwriter` format for one planned cell: the computed
/// style's font/alignment/fill/format plus its border sides, with outer
/// border paint taking an edge over the style's own side.
fn cell_format(cell: &PlannedCell) -> Format {
    let style = cell.style.as_ref();
    let mut format = Format::new();

    if style.font.bold {
        format = format.set_bold();
    }
    if style.font.italic {
        format = format.set_italic();
    }
    if let Some(size) = style.font.size {
        format = format.set_font_size(size);
    }
    if let Some(ref family) = style.font.family {
        format = format.set_font_name(family);
    }
    if let Some(color) = xlsx_color(style.font.color.as_deref()) {
        format = format.set_font_color(color);
    }

    format = match style.horizontal {
        HorizontalAlign::General => format,
        HorizontalAlign::Left => format.set_align(FormatAlign::Left),
        HorizontalAlign::Center => format.set_align(FormatAlign::Center),
        HorizontalAlign::Right => format.set_align(FormatAlign::Right),
        HorizontalAlign::Justify => format.set_align(FormatAlign::Justify),
        HorizontalAlign::Distributed => format.set_align(FormatAlign::Distributed),
        HorizontalAlign::Fill => format.set_align(FormatAlign::Fill),
        HorizontalAlign::CenterContinuous => format.set_align(FormatAlign::CenterAcross),
    };
    format = match style.vertical {
        VerticalAlign::Top => format.set_align(FormatAlign::Top),
        VerticalAlign::Center => format.set_align(FormatAlign::VerticalCenter),
        VerticalAlign::Bottom => format.set_align(FormatAlign::Bottom),
        VerticalAlign::Justify => format.set_align(FormatAlign::VerticalJustify),
        VerticalAlign::Distributed => format.set_align(FormatAlign::VerticalDistributed),
    };
    if style.wrap_text {
        format = format.set_text_wrap();
    }

    if style.fill.pattern == FillPattern::Solid {
        if let Some(color) = xlsx_color(style.fill.background.as_deref()) {
            format = format.set_background_color(color);
        }
    }

    if let Some(ref number_format) = style.number_format {
        format = format.set_num_format(number_format);
    }

    let sides = [
        (Edge::Top, &style.border.top),
        (Edge::Bottom, &style.border.bottom),
        (Edge::Left, &style.border.left),
        (Edge::Right, &style.border.right),
    ];
    for (edge, own) in sides {
        let side = cell.edge_overrides[edge as usize].as_ref().unwrap_or(own);
        format = apply_side(format, edge, side);
    }

    format
}

fn apply_side(format: Format, edge: Edge, side: &Side) -> Format {
    let border = border_style(side.style);
    let mut format = match edge {
        Edge::Top => format.set_border_top(border),
        Edge::Bottom => format.set_border_bottom(border),
        Edge::Left => format.set_border_left(border),
        Edge::Right => format.set_border_right(border),
    };
    if let Some(color) = xlsx_color(side.color.as_deref()) {
        format = match edge {
            Edge::Top => format.set_border_top_color(color),
            Edge::Bottom => format.set_border_bottom_color(color),
            Edge::Left => format.set_border_left_color(color),
            Edge::Right => format.set_border_right_color(color),
        };
    }
    format
}

fn border_style(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::None => FormatBorder::None,
        BorderStyle::Thin => FormatBorder::Thin,
        BorderStyle::Medium => FormatBorder::Medium,
        BorderStyle::Thick => FormatBorder::Thick,
        BorderStyle::Dotted => FormatBorder::Dotted,
        BorderStyle::Dashed => FormatBorder::Dashed,
        BorderStyle::Double => FormatBorder::Double,
    }
}

/// Parse a normalized hex color into an XLSX color. Tokens that never
/// resolved to hex pass through the engine unchanged and are skipped here.
fn xlsx_color(color: Option<&str>) -> Option<Color> {
    let color = color?;
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() == 6 {
        if let Ok(rgb) = u32::from_str_radix(hex, 16) {
            return Some(Color::RGB(rgb));
        }
    }
    log::warn!("ignoring unresolvable color token {color:?}");
    None
}
