//! Highlight themes, loaded from JSON.
//!
//! A theme maps highlight short names (see
//! [`HighlightKind::short_name`](crate::highlight::HighlightKind::short_name))
//! to CSS color values. In document mode a user-supplied theme is
//! rendered as one `<style>` block in the head; the builtin theme emits
//! nothing.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// A parsed highlight theme.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Theme {
    /// Optional display name of the theme.
    #[serde(default)]
    pub name: Option<String>,
    /// Highlight short name to CSS color value.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

/// The theme source was not valid theme JSON.
#[derive(Debug, Error)]
#[error("highlight theme conversion failed: {0}")]
pub struct ThemeError(#[from] serde_json::Error);

impl Theme {
    /// Parses a theme from JSON bytes.
    pub fn from_json(source: &[u8]) -> Result<Theme, ThemeError> {
        Ok(serde_json::from_slice(source)?)
    }

    /// Renders the theme as CSS rules targeting `<h->` elements.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for (short_name, color) in &self.colors {
            css.push_str("h-[data-h=\"");
            css.push_str(short_name);
            css.push_str("\"]{color:");
            css.push_str(color);
            css.push_str("}\n");
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_colors() {
        let theme =
            Theme::from_json(br##"{"name": "dark", "colors": {"kw": "#00f", "str": "#0a0"}}"##)
                .unwrap();
        assert_eq!(theme.name.as_deref(), Some("dark"));
        assert_eq!(theme.colors["str"], "#0a0");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Theme::from_json(b"{nope").is_err());
    }

    #[test]
    fn css_rendering() {
        let theme = Theme::from_json(br##"{"colors": {"kw": "#00f"}}"##).unwrap();
        assert_eq!(theme.to_css(), "h-[data-h=\"kw\"]{color:#00f}\n");
    }
}
