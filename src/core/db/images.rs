use time::OffsetDateTime;

use crate::inference::{Detection, DetectionCodecError, decode_detections};

#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: i64,
    pub project_id: i64,
    /// Upload bytes, unchanged.
    pub original_image: Vec<u8>,
    /// Annotated image as PNG.
    pub processed_image: Vec<u8>,
    /// Encoded detection list, see [`crate::inference::encode_detections`].
    pub detection_results: String,
    pub uploaded_at: OffsetDateTime,
    pub(super) _guard: (),
}

impl ImageRecord {
    pub fn detections(&self) -> Result<Vec<Detection>, DetectionCodecError> {
        decode_detections(&self.detection_results)
    }
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub original_image: Vec<u8>,
    pub processed_image: Vec<u8>,
    pub detection_results: String,
}

pub trait ImageRepository {
    fn add_image(&self, project_id: i64, image: NewImage) -> impl Future<Output = anyhow::Result<ImageRecord>>;
    /// Images of a project, newest first.
    fn get_images(&self, project_id: i64) -> impl Future<Output = anyhow::Result<Vec<ImageRecord>>>;
    fn get_image_by_id(&self, id: i64) -> impl Future<Output = anyhow::Result<Option<ImageRecord>>>;
    fn count_images(&self, project_id: i64) -> impl Future<Output = anyhow::Result<u64>>;
    /// Returns whether a row was removed.
    fn delete_image(&self, id: i64) -> impl Future<Output = anyhow::Result<bool>>;
    /// Returns how many rows were removed. Unknown ids are skipped.
    fn delete_images(&self, ids: &[i64]) -> impl Future<Output = anyhow::Result<u64>>;
}
