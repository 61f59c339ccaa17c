//! Parsing of the class legend text format.
//!
//! A legend is UTF-8 text with one entry per line:
//!
//! ```text
//! # comment
//! person:red
//! car
//! ```
//!
//! A line holding a `:` is `class_name:color`, split on the first `:`. Any other
//! non-blank line is a bare class name. There is no escaping for `:` or `#`.

mod palette;
mod resolver;

use std::collections::HashMap;

pub use palette::{Color, PALETTE, PaletteColor};
pub use resolver::LegendSource;

/// One non-comment line of a legend, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendLine {
    /// 1-based line number in the source text.
    pub line: usize,
    pub class_name: String,
    pub color: Option<String>,
}

/// Output of [`parse_legend`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLegend {
    /// Class names in file order. Duplicates are kept.
    pub class_names: Vec<String>,
    /// Colors of the entries that named one.
    pub colors: HashMap<String, String>,
}

impl ParsedLegend {
    /// True when the text held no entries, which callers treat as "no configuration".
    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.class_names.len()
    }
}

/// Split legend text into its entry lines, skipping blanks and comments.
pub fn legend_lines(content: &str) -> Vec<LegendLine> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (class_name, color) = match line.split_once(':') {
                Some((name, color)) => (name.trim().to_string(), Some(color.trim().to_string())),
                None => (line.to_string(), None),
            };
            Some(LegendLine {
                line: index + 1,
                class_name,
                color,
            })
        })
        .collect()
}

pub fn parse_legend(content: &str) -> ParsedLegend {
    let mut parsed = ParsedLegend::default();
    for entry in legend_lines(content) {
        if let Some(color) = entry.color {
            parsed.colors.insert(entry.class_name.clone(), color);
        }
        parsed.class_names.push(entry.class_name);
    }
    parsed
}

/// Parse the older color-only file (`class_name:color` per line).
///
/// Lines without a `:` carry no color and are skipped. Anything after a second
/// `:` is dropped.
pub fn parse_legacy_colors(content: &str) -> HashMap<String, String> {
    let mut colors = HashMap::new();
    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split(':');
        if let (Some(class_name), Some(color)) = (parts.next(), parts.next()) {
            colors.insert(class_name.trim().to_string(), color.trim().to_string());
        }
    }
    colors
}
