use std::path::Path;

use ab_glyph::FontArc;
use anyhow::Context;
use tracing::{debug, warn};

/// Bold sans fonts commonly present on Linux and macOS hosts.
pub const SYSTEM_FONT_CANDIDATES: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
];

// DejaVu Sans Bold, see assets/LICENSE-font.txt
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

pub fn load_font<P: AsRef<Path>>(path: P) -> anyhow::Result<FontArc> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read font file {:?}", path))?;
    FontArc::try_from_vec(bytes).map_err(|e| anyhow::anyhow!("Invalid font {:?}: {}", path, e))
}

/// The font compiled into the binary.
pub fn bundled_font() -> anyhow::Result<FontArc> {
    FontArc::try_from_slice(BUNDLED_FONT)
        .map_err(|e| anyhow::anyhow!("Invalid bundled font: {}", e))
}

/// Pick the label font: the configured path first, then the system
/// candidates, then the bundled font.
pub fn find_font(configured: Option<&Path>) -> anyhow::Result<FontArc> {
    if let Some(path) = configured {
        match load_font(path) {
            Ok(font) => return Ok(font),
            Err(e) => warn!("Falling back from configured font: {:#}", e),
        }
    }
    for candidate in SYSTEM_FONT_CANDIDATES {
        if let Ok(font) = load_font(candidate) {
            debug!("Using label font {}", candidate);
            return Ok(font);
        }
    }
    debug!("No system label font found, using the bundled font");
    bundled_font()
}
