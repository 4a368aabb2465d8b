//! Computed styles: the immutable style bundle, border side computation,
//! and the interning cache that deduplicates equivalent cascade chains.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cascade::CascadeStore;
use crate::css;
use crate::error::StyleError;

/// Line style of one border edge.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dotted,
    Dashed,
    Double,
}

/// Color and line style of one border edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Side {
    pub color: Option<String>,
    pub style: BorderStyle,
}

impl Side {
    /// True when the side would actually draw something.
    pub fn is_visible(&self) -> bool {
        self.style != BorderStyle::None || self.color.is_some()
    }
}

/// All border sides of a cell.
///
/// `diagonal` and `outline` are carried for completeness; HTML input never
/// produces them, and the XLSX flush consumes the four edges only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Border {
    pub top: Side,
    pub right: Side,
    pub bottom: Side,
    pub left: Side,
    pub diagonal: Side,
    pub outline: Side,
}

/// Horizontal text alignment.
///
/// `General` is the intermediate default of the resolution rules but is
/// never emitted by them: absent or unrecognized `text-align` lands on
/// `Left`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum HorizontalAlign {
    General,
    #[default]
    Left,
    Center,
    Right,
    Justify,
    Distributed,
    Fill,
    CenterContinuous,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
    Justify,
    Distributed,
}

/// Font descriptor of a computed style.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Font {
    pub family: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    /// Normalized hex, no leading `#`.
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FillPattern {
    #[default]
    None,
    Solid,
}

/// Cell fill. Solid only when a non-transparent background color cascades
/// onto the element.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fill {
    pub pattern: FillPattern,
    pub background: Option<String>,
    pub foreground: Option<String>,
}

/// A fully resolved, immutable style bundle.
///
/// Created once per distinct cascade signature by [`StyleCache::resolve`]
/// and shared (`Arc`) by every cell that resolves to the same signature.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComputedStyle {
    /// `Style N` by interning order.
    pub name: String,
    pub font: Font,
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub wrap_text: bool,
    pub fill: Fill,
    pub border: Border,
    pub number_format: Option<String>,
}

/// Compute the [`Side`] for one border edge from cascaded declarations.
///
/// `dotted`, `dashed`, and `double` return directly with the edge color.
/// `solid` reads the edge width and maps it onto line weight: 0 -> none,
/// 1 -> thin, 2 -> medium, 3+ -> thick; a solid edge whose width has no
/// digits is a [`StyleError::MissingInteger`]. Any other (or absent) style
/// yields no line, keeping whatever color was found.
pub fn side(store: &CascadeStore, edge: &str) -> Result<Side, StyleError> {
    let color = store.get_color(&format!("border-{edge}-color"));
    let style = store
        .get(&format!("border-{edge}-style"))
        .map(|s| s.to_ascii_lowercase());

    let style = match style.as_deref() {
        Some("dotted") => BorderStyle::Dotted,
        Some("dashed") => BorderStyle::Dashed,
        Some("double") => BorderStyle::Double,
        Some("solid") => {
            let width = store
                .get(&format!("border-{edge}-width"))
                .unwrap_or_default();
            match css::extract_first_int(width)? {
                0 => BorderStyle::None,
                1 => BorderStyle::Thin,
                2 => BorderStyle::Medium,
                _ => BorderStyle::Thick,
            }
        }
        _ => BorderStyle::None,
    };

    Ok(Side { color, style })
}

/// Cache key: the materialized cascade chain plus the number format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StyleKey {
    entries: Vec<(String, String)>,
    number_format: Option<String>,
}

/// Interning cache for computed styles, owned by one conversion run.
///
/// Keys are structural: two elements whose whole ancestor chains cascade to
/// the same effective declarations (and number format) share one
/// `Arc<ComputedStyle>`, regardless of where they sit in the document.
/// Independent runs get independent caches, so their style names never
/// collide.
#[derive(Debug, Default)]
pub struct StyleCache {
    styles: FxHashMap<StyleKey, Arc<ComputedStyle>>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct styles interned so far.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Resolve the computed style for a cascade chain, interning the result.
    ///
    /// Resolving the same chain and number format twice returns the
    /// identical shared instance, not merely an equal one.
    pub fn resolve(
        &mut self,
        store: &CascadeStore,
        number_format: Option<&str>,
    ) -> Result<Arc<ComputedStyle>, StyleError> {
        let key = StyleKey {
            entries: store.effective_entries().into_iter().collect(),
            number_format: number_format.map(str::to_string),
        };
        if let Some(style) = self.styles.get(&key) {
            return Ok(Arc::clone(style));
        }

        let name = format!("Style {}", self.styles.len() + 1);
        let style = Arc::new(compute_style(store, number_format, name)?);
        self.styles.insert(key, Arc::clone(&style));
        Ok(style)
    }
}

fn compute_style(
    store: &CascadeStore,
    number_format: Option<&str>,
    name: String,
) -> Result<ComputedStyle, StyleError> {
    let font = Font {
        family: store.get("font-family").map(str::to_string),
        size: store.get("font-size").and_then(css::parse_dimension),
        bold: matches!(store.get("font-weight"), Some("bold") | Some("700")),
        italic: store.get("font-style") == Some("italic"),
        color: store.get_color("color"),
    };

    let horizontal = match store.get("text-align") {
        Some("right") => HorizontalAlign::Right,
        Some("center") => HorizontalAlign::Center,
        Some("justify") => HorizontalAlign::Justify,
        Some("distributed") => HorizontalAlign::Distributed,
        Some("fill") => HorizontalAlign::Fill,
        Some("centerContinuous") => HorizontalAlign::CenterContinuous,
        _ => HorizontalAlign::Left,
    };
    let vertical = match store.get("vertical-align") {
        Some("bottom") => VerticalAlign::Bottom,
        Some("center") => VerticalAlign::Center,
        Some("justify") => VerticalAlign::Justify,
        Some("distributed") => VerticalAlign::Distributed,
        _ => VerticalAlign::Top,
    };

    let fill = match store.get_color("background-color") {
        Some(background) if background != "transparent" => Fill {
            pattern: FillPattern::Solid,
            background: Some(background),
            foreground: store.get_color("foreground-color"),
        },
        _ => Fill::default(),
    };

    let border = Border {
        top: side(store, "top")?,
        right: side(store, "right")?,
        bottom: side(store, "bottom")?,
        left: side(store, "left")?,
        diagonal: side(store, "diagonal")?,
        outline: side(store, "outline")?,
    };

    Ok(ComputedStyle {
        name,
        font,
        horizontal,
        vertical,
        wrap_text: true,
        fill,
        border,
        number_format: number_format.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(style: &str) -> Arc<CascadeStore> {
        CascadeStore::from_style(style, None)
    }

    #[test]
    fn test_side_solid_width_mapping() {
        for (width, expected) in [
            (0, BorderStyle::None),
            (1, BorderStyle::Thin),
            (2, BorderStyle::Medium),
            (3, BorderStyle::Thick),
            (7, BorderStyle::Thick),
        ] {
            let s = store(&format!(
                "border-top-style: solid; border-top-width: {width}px"
            ));
            assert_eq!(side(&s, "top").unwrap().style, expected, "width {width}");
        }
    }

    #[test]
    fn test_side_dotted_bypasses_width() {
        // No width declared anywhere: dotted/dashed/double never read it.
        let s = store("border-left-style: dotted; border-left-color: red");
        let side = side(&s, "left").unwrap();
        assert_eq!(side.style, BorderStyle::Dotted);
        assert_eq!(side.color, Some("ff0000".to_string()));
    }

    #[test]
    fn test_side_solid_without_width_fails() {
        let s = store("border-top-style: solid");
        assert!(matches!(
            side(&s, "top"),
            Err(StyleError::MissingInteger { .. })
        ));
    }

    #[test]
    fn test_side_unknown_style_keeps_color() {
        let s = store("border-top-style: groove; border-top-color: #abc");
        let side = side(&s, "top").unwrap();
        assert_eq!(side.style, BorderStyle::None);
        assert_eq!(side.color, Some("aabbcc".to_string()));
        assert!(side.is_visible());
    }

    #[test]
    fn test_side_absent_is_invisible() {
        let side = side(&store(""), "top").unwrap();
        assert_eq!(side, Side::default());
        assert!(!side.is_visible());
    }

    #[test]
    fn test_side_style_is_case_insensitive() {
        let s = store("border-top-style: DASHED");
        assert_eq!(side(&s, "top").unwrap().style, BorderStyle::Dashed);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut cache = StyleCache::new();
        let s = store("font-weight: bold; color: red");
        let first = cache.resolve(&s, None).unwrap();
        let second = cache.resolve(&s, None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resolve_dedupes_equivalent_chains() {
        // Different markup shapes, identical effective declarations.
        let mut cache = StyleCache::new();
        let parent = CascadeStore::from_style("color: red", None);
        let chained = CascadeStore::from_style("font-weight: bold", Some(parent));
        let flat = store("color: red; font-weight: bold");

        let a = cache.resolve(&chained, None).unwrap();
        let b = cache.resolve(&flat, None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_resolve_number_format_splits_entries() {
        let mut cache = StyleCache::new();
        let s = store("color: red");
        let plain = cache.resolve(&s, None).unwrap();
        let formatted = cache.resolve(&s, Some("#,##0")).unwrap();
        assert!(!Arc::ptr_eq(&plain, &formatted));
        assert_eq!(formatted.number_format.as_deref(), Some("#,##0"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_styles_are_named_in_interning_order() {
        let mut cache = StyleCache::new();
        let first = cache.resolve(&store("color: red"), None).unwrap();
        let second = cache.resolve(&store("color: blue"), None).unwrap();
        assert_eq!(first.name, "Style 1");
        assert_eq!(second.name, "Style 2");
    }

    #[test]
    fn test_font_resolution() {
        let mut cache = StyleCache::new();
        let s = store(
            "font-family: Arial; font-size: 2em; font-weight: 700; \
             font-style: italic; color: #1a2b3c",
        );
        let style = cache.resolve(&s, None).unwrap();
        assert_eq!(style.font.family.as_deref(), Some("Arial"));
        assert_eq!(style.font.size, Some(32.0));
        assert!(style.font.bold);
        assert!(style.font.italic);
        assert_eq!(style.font.color.as_deref(), Some("1a2b3c"));
    }

    #[test]
    fn test_alignment_defaults_to_left_and_top() {
        let mut cache = StyleCache::new();
        let style = cache.resolve(&store(""), None).unwrap();
        assert_eq!(style.horizontal, HorizontalAlign::Left);
        assert_eq!(style.vertical, VerticalAlign::Top);
        assert!(style.wrap_text);
    }

    #[test]
    fn test_unrecognized_alignment_falls_back() {
        let mut cache = StyleCache::new();
        let s = store("text-align: start; vertical-align: baseline");
        let style = cache.resolve(&s, None).unwrap();
        assert_eq!(style.horizontal, HorizontalAlign::Left);
        assert_eq!(style.vertical, VerticalAlign::Top);
    }

    #[test]
    fn test_recognized_alignment() {
        let mut cache = StyleCache::new();
        let s = store("text-align: center; vertical-align: bottom");
        let style = cache.resolve(&s, None).unwrap();
        assert_eq!(style.horizontal, HorizontalAlign::Center);
        assert_eq!(style.vertical, VerticalAlign::Bottom);
    }

    #[test]
    fn test_fill_requires_opaque_background() {
        let mut cache = StyleCache::new();

        let none = cache.resolve(&store(""), None).unwrap();
        assert_eq!(none.fill, Fill::default());

        let transparent = cache
            .resolve(&store("background-color: transparent"), None)
            .unwrap();
        assert_eq!(transparent.fill, Fill::default());

        let solid = cache
            .resolve(&store("background-color: yellow"), None)
            .unwrap();
        assert_eq!(solid.fill.pattern, FillPattern::Solid);
        assert_eq!(solid.fill.background.as_deref(), Some("ffff00"));
    }

    #[test]
    fn test_resolve_inherits_through_chain() {
        let mut cache = StyleCache::new();
        let table = CascadeStore::from_style("color: red", None);
        let row = CascadeStore::from_style("", Some(table));
        let cell = CascadeStore::from_style("font-weight: bold", Some(row));
        let style = cache.resolve(&cell, None).unwrap();
        assert_eq!(style.font.color.as_deref(), Some("ff0000"));
        assert!(style.font.bold);
    }
}
