//! Rich text: building an ordered run sequence from a cell's inline markup.
//!
//! A run is a contiguous span of text with one inline style. The builder is
//! a plain depth-first recursion that returns an owned run list per element;
//! the caller merges its own tag's emphasis onto nested runs that have not
//! set the attribute themselves.

use scraper::{ElementRef, Node};
use serde::{Deserialize, Serialize};

use crate::cascade::CascadeStore;
use crate::css;

/// One contiguous span of identically-styled text inside a cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    /// Normalized hex, no leading `#`.
    pub color: Option<String>,
    pub size: Option<f64>,
}

/// Style contributed by one enclosing inline tag.
#[derive(Debug, Clone, Default)]
struct RunStyle {
    bold: bool,
    color: Option<String>,
    size: Option<f64>,
}

/// Build the ordered run sequence for a cell element.
pub fn runs_for_cell(cell: ElementRef) -> Vec<TextRun> {
    runs_for_element(cell)
}

fn runs_for_element(el: ElementRef) -> Vec<TextRun> {
    let style = tag_style(el);
    let mut runs = Vec::new();

    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let mut child_runs = runs_for_element(child_el);
            for run in &mut child_runs {
                inherit(run, &style);
            }
            runs.append(&mut child_runs);
        } else if let Node::Text(text) = child.value() {
            let text = collapse_spaces(text);
            if text.is_empty() {
                continue;
            }
            runs.push(TextRun {
                text,
                bold: style.bold,
                color: style.color.clone(),
                size: style.size,
            });
        }
    }

    runs
}

/// The style override an element's tag contributes to its own text.
fn tag_style(el: ElementRef) -> RunStyle {
    match el.value().name() {
        "font" => font_style(el),
        "b" => RunStyle {
            bold: true,
            ..RunStyle::default()
        },
        _ => RunStyle::default(),
    }
}

/// Color and size of a `<font>` tag. Inline `style` declarations win over
/// the legacy `color`/`size` attributes.
fn font_style(el: ElementRef) -> RunStyle {
    let store = CascadeStore::from_style(el.value().attr("style").unwrap_or(""), None);

    let color = store
        .get("color")
        .map(str::to_string)
        .or_else(|| el.value().attr("color").map(str::to_string));
    let size = store
        .get("font-size")
        .map(str::to_string)
        .or_else(|| el.value().attr("size").map(str::to_string));

    RunStyle {
        bold: false,
        color: color.as_deref().and_then(css::normalize_color),
        size: size
            .as_deref()
            .and_then(|s| css::extract_first_int(s).ok())
            .map(f64::from),
    }
}

/// Propagate an enclosing tag's emphasis onto a nested run: bold first,
/// else color. An attribute the run already carries is never overwritten.
fn inherit(run: &mut TextRun, enclosing: &RunStyle) {
    if enclosing.bold && !run.bold {
        run.bold = true;
    } else if enclosing.color.is_some() && run.color.is_none() {
        run.color = enclosing.color.clone();
    }
}

/// Collapse runs of two or more spaces to a single space. Newlines survive:
/// `<br>` substitution happens before parsing and must reach the sheet.
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !last_was_space {
                out.push(c);
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}
