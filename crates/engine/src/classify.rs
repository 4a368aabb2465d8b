//! Cell classification: logical data types and number formats inferred
//! from marker classes on `td`/`th` elements.
//!
//! Marker classes are semantic hints (`class="TYPE_INTEGER"`), not visual
//! styling. Classification and number-format inference read the same
//! markers but are independent: a `TYPE_FORMULA TYPE_CURRENCY` cell is a
//! formula that still gets the currency format.

use serde::{Deserialize, Serialize};

/// Simple USD currency format.
pub const FORMAT_CURRENCY_USD_SIMPLE: &str = "\"$\"#,##0.00_-";
/// Whole percentage.
pub const FORMAT_PERCENTAGE: &str = "0%";
/// US-style date.
pub const FORMAT_DATE_MM_DD_YYYY: &str = "mm/dd/yyyy";
/// Thousands-grouped integer.
pub const FORMAT_INTEGER_GROUPED: &str = "#,##0";
/// Thousands-grouped decimal with up to two fraction digits.
pub const FORMAT_DECIMAL_GROUPED: &str = "#,##0.##";

/// Logical cell data type.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CellType {
    #[default]
    String,
    Formula,
    Numeric,
    Bool,
    Currency,
    Percentage,
    Null,
    Inline,
    Error,
    FormulaCacheString,
    Integer,
    Date,
}

/// Marker classes eligible for classification, in declared order.
///
/// The order doubles as the tie-break when several non-numeric markers
/// co-occur: the first match wins. `TYPE_DATE` is deliberately absent; it
/// only drives the number format.
const TYPE_MARKERS: [(&str, CellType); 11] = [
    ("TYPE_STRING", CellType::String),
    ("TYPE_FORMULA", CellType::Formula),
    ("TYPE_NUMERIC", CellType::Numeric),
    ("TYPE_BOOL", CellType::Bool),
    ("TYPE_CURRENCY", CellType::Currency),
    ("TYPE_PERCENTAGE", CellType::Percentage),
    ("TYPE_NULL", CellType::Null),
    ("TYPE_INLINE", CellType::Inline),
    ("TYPE_ERROR", CellType::Error),
    ("TYPE_FORMULA_CACHE_STRING", CellType::FormulaCacheString),
    ("TYPE_INTEGER", CellType::Integer),
];

/// Classify a cell from its class tokens.
///
/// Precedence: `TYPE_FORMULA` beats everything; currency, integer, and
/// percentage markers collapse to [`CellType::Numeric`]; otherwise the
/// first matched marker in declared order wins; no marker means
/// [`CellType::String`].
pub fn classify(classes: &[&str]) -> CellType {
    let matched: Vec<CellType> = TYPE_MARKERS
        .iter()
        .filter(|(marker, _)| classes.iter().any(|c| c == marker))
        .map(|&(_, cell_type)| cell_type)
        .collect();

    if matched.contains(&CellType::Formula) {
        return CellType::Formula;
    }
    if matched
        .iter()
        .any(|t| matches!(t, CellType::Currency | CellType::Integer | CellType::Percentage))
    {
        return CellType::Numeric;
    }
    matched.first().copied().unwrap_or(CellType::String)
}

/// Derive the spreadsheet number format for a cell.
///
/// Explicit markers win; a numeric cell without one falls back to an
/// integer or decimal format depending on whether its text parses as an
/// integer.
pub fn number_format(classes: &[&str], cell_type: CellType, text: &str) -> Option<String> {
    let has = |marker: &str| classes.iter().any(|c| *c == marker);

    if has("TYPE_CURRENCY") {
        return Some(FORMAT_CURRENCY_USD_SIMPLE.to_string());
    }
    if has("TYPE_INTEGER") {
        return Some(FORMAT_INTEGER_GROUPED.to_string());
    }
    if has("TYPE_PERCENTAGE") {
        return Some(FORMAT_PERCENTAGE.to_string());
    }
    if has("TYPE_DATE") {
        return Some(FORMAT_DATE_MM_DD_YYYY.to_string());
    }
    if cell_type == CellType::Numeric {
        let format = if text.trim().parse::<i64>().is_ok() {
            FORMAT_INTEGER_GROUPED
        } else {
            FORMAT_DECIMAL_GROUPED
        };
        return Some(format.to_string());
    }
    None
}
