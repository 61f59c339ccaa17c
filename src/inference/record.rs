use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A detection after naming and coloring, as stored with an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in pixels.
    pub bbox: [i32; 4],
    pub color: String,
}

#[derive(Debug, Error)]
pub enum DetectionCodecError {
    #[error("malformed detection list: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("detection {index} has confidence {confidence} outside 0..=1")]
    Confidence { index: usize, confidence: f32 },
}

fn check_confidences(detections: &[Detection]) -> Result<(), DetectionCodecError> {
    for (index, detection) in detections.iter().enumerate() {
        // NaN fails the range check too
        if !(0.0..=1.0).contains(&detection.confidence) {
            return Err(DetectionCodecError::Confidence {
                index,
                confidence: detection.confidence,
            });
        }
    }
    Ok(())
}

/// Encode a detection list for the `detection_results` column. Anything
/// encoded here decodes back to the same list.
pub fn encode_detections(detections: &[Detection]) -> Result<String, DetectionCodecError> {
    check_confidences(detections)?;
    Ok(serde_json::to_string(detections)?)
}

/// Decode a stored detection list. Only a JSON array of detection records is
/// accepted; extra or missing fields are an error.
pub fn decode_detections(text: &str) -> Result<Vec<Detection>, DetectionCodecError> {
    let detections: Vec<Detection> = serde_json::from_str(text)?;
    check_confidences(&detections)?;
    Ok(detections)
}
