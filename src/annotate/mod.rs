mod font;

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgba};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};

pub use font::{SYSTEM_FONT_CANDIDATES, bundled_font, find_font, load_font};

use crate::{
    inference::{Detection, RawDetection},
    legend::LegendSource,
};

pub const BOX_THICKNESS: i32 = 4;
pub const LABEL_FONT_SIZE: f32 = 24.0;
// Used when the font cannot measure a label.
const FALLBACK_CHAR_WIDTH: u32 = 12;
const FALLBACK_TEXT_HEIGHT: u32 = 20;
const LABEL_VERTICAL_PADDING: i32 = 5;
const LABEL_HORIZONTAL_PADDING: i32 = 10;
const TEXT_OFFSET: (i32, i32) = (5, 2);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// An annotated copy of an image and the records of what was drawn on it.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub image: DynamicImage,
    pub detections: Vec<Detection>,
}

#[derive(Clone)]
pub struct Annotator {
    font: FontArc,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator").finish_non_exhaustive()
    }
}

impl Annotator {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Annotator using the font compiled into the binary, so output does not
    /// depend on the host's fonts.
    pub fn bundled() -> anyhow::Result<Self> {
        Ok(Self::new(bundled_font()?))
    }

    /// Pixel size of a label. Labels the font cannot measure get an
    /// approximate size.
    pub fn label_size(&self, label: &str) -> (u32, u32) {
        let (width, height) = text_size(PxScale::from(LABEL_FONT_SIZE), &self.font, label);
        if label.is_empty() || (width > 0 && height > 0) {
            (width, height)
        } else {
            (
                label.chars().count() as u32 * FALLBACK_CHAR_WIDTH,
                FALLBACK_TEXT_HEIGHT,
            )
        }
    }

    /// Draw every detection onto a copy of `image`.
    ///
    /// Records come back in the order of `raw`. With no detections the copy is
    /// pixel-identical to the input.
    pub fn annotate(
        &self,
        image: &DynamicImage,
        raw: &[RawDetection],
        legend: &LegendSource,
    ) -> Annotated {
        let mut canvas = image.clone();
        let mut detections = Vec::with_capacity(raw.len());

        for detection in raw {
            let class_name = legend.class_name(detection.class_id);
            let color = legend.resolve_color(&class_name, detection.class_id);
            let rgba: Rgba<u8> = LegendSource::color_rgb(&color, detection.class_id).into();
            let bbox = detection.pixel_box();

            draw_box(&mut canvas, bbox, rgba);
            let label = format!("{}: {:.2}", class_name, detection.confidence);
            self.draw_label(&mut canvas, bbox, &label, rgba);

            detections.push(Detection {
                class_name,
                confidence: detection.confidence,
                bbox,
                color,
            });
        }

        Annotated {
            image: canvas,
            detections,
        }
    }

    fn draw_label(&self, canvas: &mut DynamicImage, bbox: [i32; 4], label: &str, color: Rgba<u8>) {
        let [x1, y1, _, _] = bbox;
        let (text_width, text_height) = self.label_size(label);
        let top = (y1 - text_height as i32 - LABEL_VERTICAL_PADDING).max(0);
        let width = text_width as i32 + LABEL_HORIZONTAL_PADDING + 1;
        let height = y1 - top + 1;
        if width <= 0 || height <= 0 {
            return;
        }
        draw_filled_rect_mut(
            canvas,
            Rect::at(x1, top).of_size(width as u32, height as u32),
            color,
        );

        draw_text_mut(
            canvas,
            TEXT_COLOR,
            x1 + TEXT_OFFSET.0,
            top + TEXT_OFFSET.1,
            PxScale::from(LABEL_FONT_SIZE),
            &self.font,
            label,
        );
    }
}

/// Outline `[x1, y1, x2, y2]` (inclusive) with a line growing inwards.
fn draw_box(canvas: &mut DynamicImage, bbox: [i32; 4], color: Rgba<u8>) {
    let [x1, y1, x2, y2] = bbox;
    for t in 0..BOX_THICKNESS {
        let width = x2 - x1 + 1 - 2 * t;
        let height = y2 - y1 + 1 - 2 * t;
        if width <= 0 || height <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            canvas,
            Rect::at(x1 + t, y1 + t).of_size(width as u32, height as u32),
            color,
        );
    }
}
