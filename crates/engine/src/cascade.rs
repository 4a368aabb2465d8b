//! The cascade store: per-element declarations with inherited lookup.
//!
//! Every adapted table node owns one [`CascadeStore`] holding the
//! declarations written on that element, linked to its container's store.
//! A property lookup walks the chain toward the table root, which mirrors
//! how the HTML ancestor chain inherits style. Stores are frozen at
//! construction (shorthand expansion happens before the snapshot is taken),
//! so the materialized chain used as a style-cache key is stable.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::css::{self, parse_declarations};

/// The four border edges shorthands expand onto.
const EDGES: [&str; 4] = ["top", "bottom", "left", "right"];

/// An immutable declaration snapshot with a parent link for inherited lookup.
#[derive(Debug)]
pub struct CascadeStore {
    props: BTreeMap<String, String>,
    parent: Option<Arc<CascadeStore>>,
}

impl CascadeStore {
    /// Build a store from a raw declaration string.
    ///
    /// Duplicate properties are last-write-wins, and the `border*` /
    /// `background` shorthands are expanded into longhands before the store
    /// freezes.
    pub fn from_style(style: &str, parent: Option<Arc<CascadeStore>>) -> Arc<CascadeStore> {
        let mut props = BTreeMap::new();
        for (property, value) in parse_declarations(style) {
            props.insert(property, value);
        }
        expand_border(&mut props);
        expand_background(&mut props);
        Arc::new(CascadeStore { props, parent })
    }

    /// Look up a property: own value first, then the ancestor chain.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.props.get(key) {
            Some(value) => Some(value.as_str()),
            None => self.parent.as_ref().and_then(|parent| parent.get(key)),
        }
    }

    /// Look up a property with an explicit default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up a property and normalize it as a color token.
    pub fn get_color(&self, key: &str) -> Option<String> {
        self.get(key).and_then(css::normalize_color)
    }

    pub fn parent(&self) -> Option<&Arc<CascadeStore>> {
        self.parent.as_ref()
    }

    /// Materialize the whole chain: own entries override ancestors'.
    ///
    /// Two elements whose chains materialize identically are
    /// indistinguishable to the resolver, which is exactly the equality the
    /// style cache keys on.
    pub fn effective_entries(&self) -> BTreeMap<String, String> {
        let mut entries = match &self.parent {
            Some(parent) => parent.effective_entries(),
            None => BTreeMap::new(),
        };
        for (key, value) in &self.props {
            entries.insert(key.clone(), value.clone());
        }
        entries
    }
}

/// Expand `border`, `border-width`, `border-style`, `border-color`, and the
/// per-edge `border-{edge}` shorthands into longhand declarations.
///
/// Synthesized longhands overwrite same-named longhands already present,
/// matching last-write-wins over the combined declaration string.
fn expand_border(props: &mut BTreeMap<String, String>) {
    let mut expanded: Vec<(String, String)> = Vec::new();

    for (key, value) in props.iter() {
        match key.as_str() {
            "border" => expand_edge_shorthand(&mut expanded, &EDGES, value),
            "border-top" => expand_edge_shorthand(&mut expanded, &["top"], value),
            "border-bottom" => expand_edge_shorthand(&mut expanded, &["bottom"], value),
            "border-left" => expand_edge_shorthand(&mut expanded, &["left"], value),
            "border-right" => expand_edge_shorthand(&mut expanded, &["right"], value),
            "border-width" => {
                if let Ok(width) = css::extract_first_int(value) {
                    for edge in EDGES {
                        expanded.push((format!("border-{edge}-width"), format!("{width}px")));
                    }
                }
            }
            "border-style" => {
                if let Some(style) = value.split_whitespace().next() {
                    for edge in EDGES {
                        expanded.push((format!("border-{edge}-style"), style.to_string()));
                    }
                }
            }
            "border-color" => {
                if let Some(color) = value.split_whitespace().next() {
                    for edge in EDGES {
                        expanded.push((format!("border-{edge}-color"), color.to_string()));
                    }
                }
            }
            _ => {}
        }
    }

    for (key, value) in expanded {
        props.insert(key, value);
    }
}

/// Expand one `border`/`border-{edge}` value onto the given edges.
///
/// Positional tokens are (width, style, color) with defaults `solid` and
/// `#000000`. A leading token with no digits is reinterpreted as the style
/// keyword itself (`border: dotted`), in which case no width longhand is
/// emitted.
fn expand_edge_shorthand(out: &mut Vec<(String, String)>, edges: &[&str], value: &str) {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return;
    };

    match css::extract_first_int(first) {
        Ok(width) => {
            let style = tokens.get(1).copied().unwrap_or("solid");
            let color = tokens.get(2).copied().unwrap_or("#000000");
            for edge in edges {
                out.push((format!("border-{edge}-width"), format!("{width}px")));
                out.push((format!("border-{edge}-style"), style.to_string()));
                out.push((format!("border-{edge}-color"), color.to_string()));
            }
        }
        Err(_) => {
            let color = tokens.get(1).copied().unwrap_or("#000000");
            for edge in edges {
                out.push((format!("border-{edge}-style"), first.to_string()));
                out.push((format!("border-{edge}-color"), color.to_string()));
            }
        }
    }
}

/// Expand the `background` shorthand: its first token is the color.
fn expand_background(props: &mut BTreeMap<String, String>) {
    let color = props
        .get("background")
        .and_then(|value| value.split_whitespace().next())
        .map(str::to_string);
    if let Some(color) = color {
        props.insert("background-color".to_string(), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_falls_back_to_parent() {
        let parent = CascadeStore::from_style("color: red", None);
        let child = CascadeStore::from_style("font-weight: bold", Some(parent));
        assert_eq!(child.get("color"), Some("red"));
        assert_eq!(child.get("font-weight"), Some("bold"));
        assert_eq!(child.get("font-style"), None);
    }

    #[test]
    fn test_own_value_shadows_parent() {
        let parent = CascadeStore::from_style("color: red", None);
        let child = CascadeStore::from_style("color: blue", Some(parent));
        assert_eq!(child.get("color"), Some("blue"));
    }

    #[test]
    fn test_get_or_default() {
        let store = CascadeStore::from_style("", None);
        assert_eq!(store.get_or("vertical-align", "top"), "top");
    }

    #[test]
    fn test_get_color_normalizes() {
        let parent = CascadeStore::from_style("background-color: red", None);
        let child = CascadeStore::from_style("", Some(parent));
        assert_eq!(
            child.get_color("background-color"),
            Some("ff0000".to_string())
        );
    }

    #[test]
    fn test_effective_entries_materializes_chain() {
        let root = CascadeStore::from_style("color: red; padding: 2px", None);
        let child = CascadeStore::from_style("color: blue", Some(root));
        let entries = child.effective_entries();
        assert_eq!(entries.get("color"), Some(&"blue".to_string()));
        assert_eq!(entries.get("padding"), Some(&"2px".to_string()));
    }

    #[test]
    fn test_expand_border_full_shorthand() {
        let store = CascadeStore::from_style("border: 1px solid red", None);
        assert_eq!(store.get("border-top-width"), Some("1px"));
        assert_eq!(store.get("border-bottom-style"), Some("solid"));
        assert_eq!(store.get("border-left-color"), Some("red"));
        assert_eq!(store.get("border-right-width"), Some("1px"));
    }

    #[test]
    fn test_expand_border_defaults() {
        let store = CascadeStore::from_style("border: 2px", None);
        assert_eq!(store.get("border-top-style"), Some("solid"));
        assert_eq!(store.get("border-top-color"), Some("#000000"));
    }

    #[test]
    fn test_expand_border_keyword_fallback() {
        // No leading width: the first token is the style and no width
        // longhand appears.
        let store = CascadeStore::from_style("border: dotted", None);
        assert_eq!(store.get("border-top-style"), Some("dotted"));
        assert_eq!(store.get("border-top-color"), Some("#000000"));
        assert_eq!(store.get("border-top-width"), None);
    }

    #[test]
    fn test_expand_border_width_and_style() {
        let store = CascadeStore::from_style("border-style: solid; border-width: 2px", None);
        assert_eq!(store.get("border-top-style"), Some("solid"));
        assert_eq!(store.get("border-top-width"), Some("2px"));
        assert_eq!(store.get("border-right-width"), Some("2px"));
    }

    #[test]
    fn test_expand_single_edge() {
        let store = CascadeStore::from_style("border-bottom: 3px dashed #abc", None);
        assert_eq!(store.get("border-bottom-width"), Some("3px"));
        assert_eq!(store.get("border-bottom-style"), Some("dashed"));
        assert_eq!(store.get("border-bottom-color"), Some("#abc"));
        assert_eq!(store.get("border-top-width"), None);
    }

    #[test]
    fn test_expand_background() {
        let store = CascadeStore::from_style("background: yellow none", None);
        assert_eq!(store.get("background-color"), Some("yellow"));
    }

    #[test]
    fn test_expansion_does_not_cross_the_chain() {
        // A shorthand on the parent is expanded in the parent's own store
        // and reaches the child through inheritance, not re-expansion.
        let parent = CascadeStore::from_style("border: 1px", None);
        let child = CascadeStore::from_style("", Some(parent));
        assert_eq!(child.get("border-top-width"), Some("1px"));
    }
}
