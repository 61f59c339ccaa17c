#[cfg(feature = "backend-tract")]
pub mod tract;

#[cfg(feature = "backend-tract")]
pub use tract::TractLoader;

use super::DetectorLoader;

/// Loader compiled into this build, if any.
pub fn default_loader(confidence: f32, iou: f32) -> Option<Box<dyn DetectorLoader>> {
    #[cfg(feature = "backend-tract")]
    {
        Some(Box::new(
            TractLoader::new().with_thresholds(confidence, iou),
        ))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        let _ = (confidence, iou);
        None
    }
}
