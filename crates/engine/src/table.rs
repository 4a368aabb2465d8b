//! Document tree adapter: wraps HTML table markup into an owned tree with
//! cascade stores, resolved styles, cell types, and rich-text runs.
//!
//! The adapter consumes a `scraper`-parsed document whose CSS has already
//! been inlined into `style` attributes. Legacy presentational attributes
//! (`bgcolor`, `align`, `border`, ...) are migrated into equivalent CSS
//! declarations before each element's store is built, placed ahead of the
//! inline `style` text so author CSS wins on conflict.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::cascade::CascadeStore;
use crate::classify::{self, CellType};
use crate::css;
use crate::error::StyleError;
use crate::richtext::{self, TextRun};
use crate::style::{ComputedStyle, StyleCache};

/// Legacy presentational attributes recognized on any element.
const LEGACY_STYLE_ATTRS: [(&str, &str); 4] = [
    ("bgcolor", "background-color"),
    ("align", "text-align"),
    ("color", "color"),
    ("size", "font-size"),
];

/// A top-level HTML table, adapted and ready for a grid writer.
pub struct Table {
    pub store: Arc<CascadeStore>,
    pub head: Option<TableSection>,
    pub body: TableSection,
}

/// A `thead`/`tbody` (or the table itself when no `tbody` exists).
pub struct TableSection {
    pub store: Arc<CascadeStore>,
    pub rows: Vec<TableRow>,
}

pub struct TableRow {
    pub store: Arc<CascadeStore>,
    pub cells: Vec<TableCell>,
}

/// One `td`/`th`: resolved style, inferred type and number format, rich
/// runs, and merge spans.
pub struct TableCell {
    pub store: Arc<CascadeStore>,
    pub style: Arc<ComputedStyle>,
    pub cell_type: CellType,
    pub number_format: Option<String>,
    pub runs: Vec<TextRun>,
    pub colspan: u32,
    pub rowspan: u32,
}

impl Table {
    /// Adapt one table element. Cell styles are resolved through `cache` as
    /// the tree is built, so the finished tree is ready to write.
    pub fn from_element(el: ElementRef, cache: &mut StyleCache) -> Result<Self, StyleError> {
        // The table migrates its own attribute set (bgcolor, cellpadding,
        // border), not the generic one.
        let legacy = table_legacy_declarations(el)?;
        let store = node_store(el, &legacy, None);

        let head = child_elements(el)
            .find(|c| c.value().name() == "thead")
            .map(|h| TableSection::from_element(h, &store, true, cache))
            .transpose()?;

        let body = match child_elements(el).find(|c| c.value().name() == "tbody") {
            Some(b) => TableSection::from_element(b, &store, true, cache)?,
            // No tbody: the table element doubles as the body. Its legacy
            // attributes were already migrated into `store` above.
            None => TableSection::from_element(el, &store, false, cache)?,
        };

        Ok(Table { store, head, body })
    }

    /// Head rows (if any) followed by body rows, in writing order.
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.head
            .iter()
            .flat_map(|head| head.rows.iter())
            .chain(self.body.rows.iter())
    }
}

impl TableSection {
    fn from_element(
        el: ElementRef,
        parent: &Arc<CascadeStore>,
        migrate_attrs: bool,
        cache: &mut StyleCache,
    ) -> Result<Self, StyleError> {
        let legacy = if migrate_attrs {
            legacy_declarations(el)
        } else {
            String::new()
        };
        let store = node_store(el, &legacy, Some(Arc::clone(parent)));

        let mut rows = Vec::new();
        for child in child_elements(el) {
            if child.value().name() == "tr" {
                rows.push(TableRow::from_element(child, &store, cache)?);
            }
        }
        Ok(TableSection { store, rows })
    }
}

impl TableRow {
    fn from_element(
        el: ElementRef,
        parent: &Arc<CascadeStore>,
        cache: &mut StyleCache,
    ) -> Result<Self, StyleError> {
        let store = node_store(el, &legacy_declarations(el), Some(Arc::clone(parent)));

        let mut cells = Vec::new();
        for child in child_elements(el) {
            let name = child.value().name();
            if name == "td" || name == "th" {
                cells.push(TableCell::from_element(child, &store, cache)?);
            }
        }
        Ok(TableRow { store, cells })
    }
}

impl TableCell {
    fn from_element(
        el: ElementRef,
        parent: &Arc<CascadeStore>,
        cache: &mut StyleCache,
    ) -> Result<Self, StyleError> {
        let runs = richtext::runs_for_cell(el);
        let plain: String = runs.iter().map(|run| run.text.as_str()).collect();

        let classes: Vec<&str> = el
            .value()
            .attr("class")
            .unwrap_or_default()
            .split_whitespace()
            .collect();
        let cell_type = classify::classify(&classes);
        let number_format = classify::number_format(&classes, cell_type, &plain);

        let store = node_store(el, &legacy_declarations(el), Some(Arc::clone(parent)));
        let style = cache.resolve(&store, number_format.as_deref())?;

        Ok(TableCell {
            store,
            style,
            cell_type,
            number_format,
            runs,
            colspan: span_attr(el, "colspan"),
            rowspan: span_attr(el, "rowspan"),
        })
    }

    /// The cell's rendered text, all runs concatenated.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// True when any run carries its own formatting.
    pub fn is_rich(&self) -> bool {
        self.runs
            .iter()
            .any(|run| run.bold || run.color.is_some() || run.size.is_some())
    }
}

/// All top-level tables in a parsed document; tables nested inside another
/// table are excluded.
pub fn find_tables(document: &Html) -> Vec<ElementRef<'_>> {
    let selector = Selector::parse("table").expect("static selector");
    document
        .select(&selector)
        .filter(|table| {
            !table
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| ancestor.value().name() == "table")
        })
        .collect()
}

/// Adapt every top-level table of a document.
pub fn adapt_tables(document: &Html, cache: &mut StyleCache) -> Result<Vec<Table>, StyleError> {
    let elements = find_tables(document);
    if elements.is_empty() {
        log::warn!("document contains no top-level tables");
    }
    elements
        .into_iter()
        .map(|el| Table::from_element(el, cache))
        .collect()
}

fn child_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Build an element's store: migrated legacy declarations first, then the
/// inline `style` text, so inline style wins via last-write-wins.
fn node_store(el: ElementRef, legacy: &str, parent: Option<Arc<CascadeStore>>) -> Arc<CascadeStore> {
    let inline = el.value().attr("style").unwrap_or_default();
    let combined = format!("{legacy}{inline}");
    CascadeStore::from_style(&combined, parent)
}

fn legacy_declarations(el: ElementRef) -> String {
    let mut declarations = String::new();
    for (attr, property) in LEGACY_STYLE_ATTRS {
        if let Some(value) = el.value().attr(attr) {
            declarations.push_str(&format!("{property}: {value};"));
        }
    }
    declarations
}

/// The table element's own legacy attribute map. A `border` attribute whose
/// value has no digits is a structural failure.
fn table_legacy_declarations(el: ElementRef) -> Result<String, StyleError> {
    let mut declarations = String::new();
    if let Some(value) = el.value().attr("bgcolor") {
        declarations.push_str(&format!("background-color: {value};"));
    }
    if let Some(value) = el.value().attr("cellpadding") {
        declarations.push_str(&format!("padding: {value}px;"));
    }
    if let Some(value) = el.value().attr("border") {
        let width = css::extract_first_int(value)?;
        for edge in ["top", "bottom", "left", "right"] {
            declarations.push_str(&format!(
                "border-{edge}-width: {width}px; \
                 border-{edge}-style: solid; \
                 border-{edge}-color: #000000;"
            ));
        }
    }
    Ok(declarations)
}

/// Parse a span attribute: missing, non-numeric, or non-positive means 1.
fn span_attr(el: ElementRef, name: &str) -> u32 {
    el.value()
        .attr(name)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|&span| span >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapt(html: &str) -> (Vec<Table>, StyleCache) {
        let document = Html::parse_document(html);
        let mut cache = StyleCache::new();
        let tables = adapt_tables(&document, &mut cache).unwrap();
        (tables, cache)
    }

    #[test]
    fn test_rows_and_cells_in_document_order() {
        let (tables, _) = adapt(
            "<table>
               <tr><th>a</th><td>b</td><th>c</th></tr>
               <tr><td>d</td></tr>
             </table>",
        );
        let table = &tables[0];
        assert_eq!(table.body.rows.len(), 2);
        let texts: Vec<String> = table.body.rows[0]
            .cells
            .iter()
            .map(|c| c.plain_text())
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn test_thead_and_tbody_split() {
        let (tables, _) = adapt(
            "<table>
               <thead><tr><th>h</th></tr></thead>
               <tbody><tr><td>b</td></tr></tbody>
             </table>",
        );
        let table = &tables[0];
        let head = table.head.as_ref().unwrap();
        assert_eq!(head.rows.len(), 1);
        assert_eq!(table.body.rows.len(), 1);
        assert_eq!(table.rows().count(), 2);
    }

    #[test]
    fn test_nested_tables_excluded() {
        let (tables, _) = adapt(
            "<table><tr><td>outer</td></tr></table>
             <div><table><tr><td><table><tr><td>inner</td></tr></table></td></tr></table></div>",
        );
        // The table nested inside a cell is not scanned; its host is.
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn test_span_attributes() {
        let (tables, _) = adapt(
            r#"<table><tr>
                 <td colspan="2" rowspan="3">a</td>
                 <td colspan="x">b</td>
                 <td colspan="0">c</td>
               </tr></table>"#,
        );
        let cells = &tables[0].body.rows[0].cells;
        assert_eq!((cells[0].colspan, cells[0].rowspan), (2, 3));
        assert_eq!(cells[1].colspan, 1);
        assert_eq!(cells[2].colspan, 1);
    }

    #[test]
    fn test_legacy_attributes_migrate() {
        let (tables, _) = adapt(
            r#"<table><tr><td bgcolor="red" align="center">x</td></tr></table>"#,
        );
        let cell = &tables[0].body.rows[0].cells[0];
        assert_eq!(cell.store.get("background-color"), Some("red"));
        assert_eq!(cell.store.get("text-align"), Some("center"));
        assert_eq!(
            cell.style.fill.background.as_deref(),
            Some("ff0000")
        );
    }

    #[test]
    fn test_inline_style_beats_legacy_attribute() {
        let (tables, _) = adapt(
            r#"<table><tr><td bgcolor="red" style="background-color: blue">x</td></tr></table>"#,
        );
        let cell = &tables[0].body.rows[0].cells[0];
        assert_eq!(cell.store.get("background-color"), Some("blue"));
    }

    #[test]
    fn test_table_border_attribute_expands() {
        let (tables, _) = adapt(r#"<table border="2"><tr><td>x</td></tr></table>"#);
        let table = &tables[0];
        assert_eq!(table.store.get("border-top-width"), Some("2px"));
        assert_eq!(table.store.get("border-left-style"), Some("solid"));
        assert_eq!(table.store.get("border-bottom-color"), Some("#000000"));
    }

    #[test]
    fn test_table_border_attribute_without_digits_fails() {
        let document =
            Html::parse_document(r#"<table border="yes"><tr><td>x</td></tr></table>"#);
        let mut cache = StyleCache::new();
        assert!(adapt_tables(&document, &mut cache).is_err());
    }

    #[test]
    fn test_cellpadding_maps_to_padding() {
        let (tables, _) = adapt(r#"<table cellpadding="4"><tr><td>x</td></tr></table>"#);
        assert_eq!(tables[0].store.get("padding"), Some("4px"));
    }

    #[test]
    fn test_cell_inherits_table_declarations() {
        let (tables, _) = adapt(
            r#"<table style="color: red"><tr><td>x</td></tr></table>"#,
        );
        let cell = &tables[0].body.rows[0].cells[0];
        assert_eq!(cell.store.get("color"), Some("red"));
        assert_eq!(cell.style.font.color.as_deref(), Some("ff0000"));
    }

    #[test]
    fn test_equal_cells_share_one_style() {
        let (tables, cache) = adapt(
            "<table><tr><td>a</td><td>b</td></tr></table>",
        );
        let cells = &tables[0].body.rows[0].cells;
        assert!(Arc::ptr_eq(&cells[0].style, &cells[1].style));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_classified_cell_gets_number_format() {
        let (tables, _) = adapt(
            r#"<table><tr><td class="TYPE_INTEGER">1200</td></tr></table>"#,
        );
        let cell = &tables[0].body.rows[0].cells[0];
        assert_eq!(cell.cell_type, CellType::Numeric);
        assert_eq!(cell.number_format.as_deref(), Some("#,##0"));
        assert_eq!(cell.style.number_format.as_deref(), Some("#,##0"));
    }
}
