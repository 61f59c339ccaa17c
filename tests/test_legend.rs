//! Tests for legend parsing and color resolution.
//!
//! Tests cover:
//! - The `class` / `class:color` line format with comments and blanks
//! - The older color-only file format
//! - Color precedence between legend, legacy file and palette
//! - Generated names for class ids past the end of the legend

mod common;

use detectdesk::legend::{PALETTE, legend_lines, parse_legacy_colors, parse_legend};

use common::*;

#[test]
fn test_parse_legend_mixed_lines() {
    let legend = parse_legend("# header\nperson:red\n\n  car  \nbus : Blue \n");

    assert_eq!(legend.class_names, vec!["person", "car", "bus"]);
    assert_eq!(legend.colors.len(), 2);
    assert_eq!(legend.colors["person"], "red");
    // Colors keep their case until validation or resolution
    assert_eq!(legend.colors["bus"], "Blue");
    assert!(!legend.colors.contains_key("car"));
}

#[test]
fn test_parse_legend_splits_on_first_colon() {
    let legend = parse_legend("a:b:c");
    assert_eq!(legend.class_names, vec!["a"]);
    assert_eq!(legend.colors["a"], "b:c");
}

#[test]
fn test_parse_legend_empty_text() {
    assert!(parse_legend("").is_empty());
    assert!(parse_legend("\n   \n# only a comment\n").is_empty());
}

#[test]
fn test_legend_lines_track_line_numbers() {
    let lines = legend_lines("# c\n\nperson:red\ncar");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].line, 3);
    assert_eq!(lines[0].color.as_deref(), Some("red"));
    assert_eq!(lines[1].line, 4);
    assert_eq!(lines[1].color, None);
}

#[test]
fn test_parse_legacy_colors() {
    let colors = parse_legacy_colors("person: green\ncar\n# truck:red\nbus:yellow:extra\n");
    assert_eq!(colors.len(), 2);
    assert_eq!(colors["person"], "green");
    assert_eq!(colors["bus"], "yellow");
}

#[test]
fn test_resolve_color_from_legend_then_palette() {
    // 1. person has a legend color, car falls back to palette index 1
    let legend = LegendSource::from_texts("person:red\ncar", None);
    assert!(matches!(legend, LegendSource::Unified(_)));

    assert_eq!(legend.resolve_color("person", 0), "red");
    assert_eq!(legend.resolve_color("car", 1), "blue");
}

#[test]
fn test_legacy_colors_fill_in_after_legend() {
    // 1. Legend color wins over legacy, legacy wins over palette
    let legend = LegendSource::from_texts("person:red\ncar\nbus", Some("person:teal\ncar:green"));
    assert!(matches!(legend, LegendSource::WithLegacyColors { .. }));

    assert_eq!(legend.resolve_color("person", 0), "red");
    assert_eq!(legend.resolve_color("car", 1), "green");
    assert_eq!(legend.resolve_color("bus", 2), PALETTE[2].name());
}

#[test]
fn test_blank_legacy_text_is_absent() {
    let legend = LegendSource::from_texts("person", Some("  \n"));
    assert!(matches!(legend, LegendSource::Unified(_)));
}

#[test]
fn test_palette_wraps_around() {
    assert_eq!(PALETTE.len(), 18);
    assert_eq!(PaletteColor::for_index(0), PaletteColor::Red);
    assert_eq!(PaletteColor::for_index(17), PaletteColor::Aqua);
    assert_eq!(PaletteColor::for_index(18), PaletteColor::Red);
    assert_eq!(PaletteColor::for_index(19), PaletteColor::Blue);
}

#[test]
fn test_palette_color_parsing() {
    assert_eq!("RED".parse::<PaletteColor>().ok(), Some(PaletteColor::Red));
    assert_eq!("Navy".parse::<PaletteColor>().ok(), Some(PaletteColor::Navy));

    let err = "chartreuse".parse::<PaletteColor>().unwrap_err();
    assert_eq!(err.to_string(), "Invalid color: chartreuse");
}

#[test]
fn test_class_name_past_legend_end() {
    let legend = LegendSource::from_texts("person\ncar", None);
    assert_eq!(legend.class_name(1), "car");
    assert_eq!(legend.class_name(7), "Class 7");
}

#[test]
fn test_unknown_legacy_color_draws_with_palette() {
    // The legacy file is never validated, so its names may be anything
    let legend = LegendSource::from_texts("person", Some("person:chartreuse"));
    let color = legend.resolve_color("person", 0);
    assert_eq!(color, "chartreuse");
    assert_eq!(LegendSource::color_rgb(&color, 1), PaletteColor::Blue.rgb());
    assert_eq!(LegendSource::color_rgb("Red", 1), PaletteColor::Red.rgb());
}

#[test]
fn test_empty_legend_walks_palette_in_order() {
    let legend = LegendSource::from_texts("", None);
    for (index, color) in PALETTE.iter().enumerate() {
        assert_eq!(legend.resolve_color(&legend.class_name(index), index), color.name());
    }
    assert_eq!(legend.resolve_color(&legend.class_name(18), 18), "red");
}

#[test]
fn test_resolved_palette_colors_are_lowercase() {
    // 1. Legend and legacy colors in mixed case
    let legend = LegendSource::from_texts("cat:RED\ncar\nbus", Some("car:Green\nbus:Chartreuse"));

    // 2. Palette names resolve to their canonical form, others are kept
    assert_eq!(legend.resolve_color("cat", 0), "red");
    assert_eq!(legend.resolve_color("car", 1), "green");
    assert_eq!(legend.resolve_color("bus", 2), "Chartreuse");
}
