use std::collections::HashMap;

use super::{ParsedLegend, PaletteColor, parse_legacy_colors, parse_legend, palette::Color};

/// Class legend of a project together with where its colors come from.
///
/// Color precedence for a class is fixed: the legend's own `name:color` entry,
/// then the legacy color file when the project has one, then the palette entry
/// at the class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegendSource {
    Unified(ParsedLegend),
    WithLegacyColors {
        legend: ParsedLegend,
        legacy: HashMap<String, String>,
    },
}

impl LegendSource {
    /// Build the legend from a project's stored texts. An empty legacy text
    /// counts as absent.
    pub fn from_texts(class_names: &str, color_config: Option<&str>) -> Self {
        let legend = parse_legend(class_names);
        match color_config.filter(|text| !text.trim().is_empty()) {
            Some(text) => LegendSource::WithLegacyColors {
                legend,
                legacy: parse_legacy_colors(text),
            },
            None => LegendSource::Unified(legend),
        }
    }

    pub fn legend(&self) -> &ParsedLegend {
        match self {
            LegendSource::Unified(legend) => legend,
            LegendSource::WithLegacyColors { legend, .. } => legend,
        }
    }

    /// Display name for a model class id. Ids past the end of the legend get a
    /// generated `Class <id>` name.
    pub fn class_name(&self, class_id: usize) -> String {
        self.legend()
            .class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("Class {}", class_id))
    }

    /// Color name stored with a detection. Palette names come back in their
    /// lowercase form; names outside the palette are kept as written.
    pub fn resolve_color(&self, class_name: &str, class_index: usize) -> String {
        if let Some(color) = self.legend().colors.get(class_name) {
            return normalize_color(color);
        }
        if let LegendSource::WithLegacyColors { legacy, .. } = self {
            if let Some(color) = legacy.get(class_name) {
                return normalize_color(color);
            }
        }
        PaletteColor::for_index(class_index).name().to_string()
    }

    /// Pixel value to draw a resolved color with. Names outside the palette
    /// (the legacy file is never validated) fall back to the palette entry at
    /// the class index.
    pub fn color_rgb(color: &str, class_index: usize) -> Color {
        color
            .parse::<PaletteColor>()
            .unwrap_or_else(|_| PaletteColor::for_index(class_index))
            .rgb()
    }
}

impl Default for LegendSource {
    fn default() -> Self {
        LegendSource::Unified(ParsedLegend::default())
    }
}

fn normalize_color(color: &str) -> String {
    match color.parse::<PaletteColor>() {
        Ok(palette) => palette.name().to_string(),
        Err(_) => color.to_string(),
    }
}
