use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use image::{DynamicImage, imageops::FilterType};
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::inference::{Detector, DetectorLoader, RawDetection};

const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.45;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Loads YOLOv8-style ONNX exports (one `[1, 4 + classes, anchors]` output
/// with center/size boxes in input pixels).
#[derive(Debug, Clone)]
pub struct TractLoader {
    input_size: u32,
    confidence: f32,
    iou: f32,
}

impl TractLoader {
    pub fn new() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            confidence: DEFAULT_CONFIDENCE,
            iou: DEFAULT_IOU,
        }
    }

    pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
        self.confidence = confidence;
        self.iou = iou;
        self
    }

    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = input_size;
        self
    }
}

impl Default for TractLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorLoader for TractLoader {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn artifact_extensions(&self) -> &'static [&'static str] {
        &["onnx"]
    }

    fn load(&self, model_path: &Path) -> Result<Box<dyn Detector>> {
        info!("Loading ONNX model {}", model_path.display());
        let size = self.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        Ok(Box::new(TractDetector {
            model,
            input_size: self.input_size,
            confidence: self.confidence,
            iou: self.iou,
        }))
    }
}

struct TractDetector {
    model: Plan,
    input_size: u32,
    confidence: f32,
    iou: f32,
}

impl TractDetector {
    fn build_input(&self, image: &DynamicImage) -> Tensor {
        let size = self.input_size;
        let resized = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();
        tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        )
        .into_tensor()
    }
}

impl Detector for TractDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<RawDetection>> {
        let (width, height) = (image.width() as f32, image.height() as f32);
        let input = self.build_input(image);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("expected a [1, 4 + classes, anchors] output")?;
        let (_, rows, anchors) = view.dim();
        if rows <= 4 {
            bail!("model output has {} rows, expected at least 5", rows);
        }

        let scale_x = width / self.input_size as f32;
        let scale_y = height / self.input_size as f32;
        let mut candidates = Vec::new();
        for anchor in 0..anchors {
            let (class_id, score) = (4..rows)
                .map(|row| (row - 4, view[[0, row, anchor]]))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            if score < self.confidence {
                continue;
            }
            let cx = view[[0, 0, anchor]];
            let cy = view[[0, 1, anchor]];
            let w = view[[0, 2, anchor]];
            let h = view[[0, 3, anchor]];
            candidates.push(RawDetection::new(
                [
                    ((cx - w / 2.0) * scale_x).clamp(0.0, width),
                    ((cy - h / 2.0) * scale_y).clamp(0.0, height),
                    ((cx + w / 2.0) * scale_x).clamp(0.0, width),
                    ((cy + h / 2.0) * scale_y).clamp(0.0, height),
                ],
                score.min(1.0),
                class_id,
            ));
        }
        let kept = non_max_suppression(candidates, self.iou);
        debug!("{} detections after NMS", kept.len());
        Ok(kept)
    }
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);
    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - intersection;
    if union <= 0.0 { 0.0 } else { intersection / union }
}

/// Greedy per-class suppression, highest confidence first.
fn non_max_suppression(mut candidates: Vec<RawDetection>, threshold: f32) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        let overlaps = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
