//! The seam between the application and the object-detection model.
//!
//! Inference itself is delegated: a [`DetectorLoader`] turns a stored model
//! artifact into a [`Detector`], and a detector turns an image into raw
//! `(box, class id, confidence)` triples. Everything downstream (naming,
//! coloring, drawing, storage) works on [`RawDetection`] values only.

pub mod backends;
mod record;

use std::path::Path;

use anyhow::Result;
use image::DynamicImage;

pub use record::{Detection, DetectionCodecError, decode_detections, encode_detections};

/// One model output in image pixel coordinates, `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
}

impl RawDetection {
    pub fn new(bbox: [f32; 4], confidence: f32, class_id: usize) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }

    /// Box corners truncated to whole pixels.
    pub fn pixel_box(&self) -> [i32; 4] {
        self.bbox.map(|v| v as i32)
    }
}

/// A loaded model ready to run on images.
pub trait Detector: Send {
    /// Run the model on one image. The order of the returned detections is
    /// whatever the model produced and is preserved downstream.
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<RawDetection>>;
}

/// Loads model artifacts. The application runs read-only when no loader is
/// available.
pub trait DetectorLoader: Send + Sync {
    /// Backend identifier, shown in logs.
    fn name(&self) -> &'static str;

    /// Artifact file extensions this loader accepts, without the dot.
    fn artifact_extensions(&self) -> &'static [&'static str];

    fn load(&self, model_path: &Path) -> Result<Box<dyn Detector>>;
}
