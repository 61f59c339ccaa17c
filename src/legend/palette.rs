use std::{fmt, str::FromStr};

use image::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba([color.r, color.g, color.b, 255])
    }
}

/// The fixed set of colors a legend may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Cyan,
    Magenta,
    Lime,
    Pink,
    Brown,
    Gray,
    Navy,
    Olive,
    Teal,
    Maroon,
    Fuchsia,
    Aqua,
}

/// Fallback order. A class without an explicit color gets `PALETTE[index % PALETTE.len()]`.
pub const PALETTE: [PaletteColor; 18] = [
    PaletteColor::Red,
    PaletteColor::Blue,
    PaletteColor::Green,
    PaletteColor::Yellow,
    PaletteColor::Purple,
    PaletteColor::Orange,
    PaletteColor::Cyan,
    PaletteColor::Magenta,
    PaletteColor::Lime,
    PaletteColor::Pink,
    PaletteColor::Brown,
    PaletteColor::Gray,
    PaletteColor::Navy,
    PaletteColor::Olive,
    PaletteColor::Teal,
    PaletteColor::Maroon,
    PaletteColor::Fuchsia,
    PaletteColor::Aqua,
];

impl PaletteColor {
    /// Palette entry used for a class index that has no configured color.
    pub fn for_index(index: usize) -> Self {
        PALETTE[index % PALETTE.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaletteColor::Red => "red",
            PaletteColor::Blue => "blue",
            PaletteColor::Green => "green",
            PaletteColor::Yellow => "yellow",
            PaletteColor::Purple => "purple",
            PaletteColor::Orange => "orange",
            PaletteColor::Cyan => "cyan",
            PaletteColor::Magenta => "magenta",
            PaletteColor::Lime => "lime",
            PaletteColor::Pink => "pink",
            PaletteColor::Brown => "brown",
            PaletteColor::Gray => "gray",
            PaletteColor::Navy => "navy",
            PaletteColor::Olive => "olive",
            PaletteColor::Teal => "teal",
            PaletteColor::Maroon => "maroon",
            PaletteColor::Fuchsia => "fuchsia",
            PaletteColor::Aqua => "aqua",
        }
    }

    /// CSS color value for the name.
    pub fn rgb(&self) -> Color {
        let (r, g, b) = match self {
            PaletteColor::Red => (255, 0, 0),
            PaletteColor::Blue => (0, 0, 255),
            PaletteColor::Green => (0, 128, 0),
            PaletteColor::Yellow => (255, 255, 0),
            PaletteColor::Purple => (128, 0, 128),
            PaletteColor::Orange => (255, 165, 0),
            PaletteColor::Cyan => (0, 255, 255),
            PaletteColor::Magenta => (255, 0, 255),
            PaletteColor::Lime => (0, 255, 0),
            PaletteColor::Pink => (255, 192, 203),
            PaletteColor::Brown => (165, 42, 42),
            PaletteColor::Gray => (128, 128, 128),
            PaletteColor::Navy => (0, 0, 128),
            PaletteColor::Olive => (128, 128, 0),
            PaletteColor::Teal => (0, 128, 128),
            PaletteColor::Maroon => (128, 0, 0),
            PaletteColor::Fuchsia => (255, 0, 255),
            PaletteColor::Aqua => (0, 255, 255),
        };
        Color { r, g, b }
    }

    /// Comma separated list of every palette name, in palette order.
    pub fn names() -> String {
        PALETTE
            .iter()
            .map(|color| color.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PaletteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaletteColor {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.to_lowercase();
        PALETTE
            .iter()
            .copied()
            .find(|color| color.name() == lowered)
            .ok_or_else(|| anyhow::anyhow!("Invalid color: {}", value))
    }
}
