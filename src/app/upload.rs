use std::{io::Cursor, path::Path};

use anyhow::Context;
use image::ImageFormat;
use tracing::{info, warn};

use crate::{
    core::db::{ImageRecord, ImageRepository, NewImage, ProjectRepository},
    inference::{Detection, Detector, encode_detections},
    legend::LegendSource,
    validation::{ImageValidation, ImageValidationError, validate_image_bytes},
};

use super::{AppContext, AppError};

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub file_name: String,
    pub validation: ImageValidation,
    pub record: ImageRecord,
    pub detections: Vec<Detection>,
}

/// A file that failed validation and was never processed.
#[derive(Debug)]
pub struct RejectedUpload {
    pub file_name: String,
    pub error: ImageValidationError,
}

/// A valid file whose detection or rendering failed.
#[derive(Debug)]
pub struct FailedUpload {
    pub file_name: String,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub processed: Vec<ProcessedImage>,
    pub rejected: Vec<RejectedUpload>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.rejected.len() + self.failed.len()
    }
}

/// Read files from disk for an upload batch. Files that cannot be read are
/// returned as rejections instead of failing the batch.
pub fn read_uploads<P: AsRef<Path>>(paths: &[P]) -> (Vec<Upload>, Vec<RejectedUpload>) {
    let mut uploads = Vec::with_capacity(paths.len());
    let mut rejected = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(path) {
            Ok(bytes) => uploads.push(Upload { file_name, bytes }),
            Err(e) => {
                let error = if e.kind() == std::io::ErrorKind::NotFound {
                    ImageValidationError::NotFound(path.to_path_buf())
                } else {
                    ImageValidationError::Io(e)
                };
                warn!("Could not read {:?}: {}", path, error);
                rejected.push(RejectedUpload { file_name, error });
            }
        }
    }
    (uploads, rejected)
}

struct Rendered {
    processed_png: Vec<u8>,
    detections: Vec<Detection>,
    detection_results: String,
}

impl AppContext {
    /// Validate, detect, annotate and store a batch of uploads for a project.
    ///
    /// All files are validated first. Invalid files are reported and skipped
    /// while the others proceed, and a file whose detection fails does not stop
    /// the rest of the batch.
    pub async fn upload_images(
        &self,
        project_id: i64,
        uploads: Vec<Upload>,
    ) -> Result<UploadReport, AppError> {
        let loader = self.require_loader()?;
        let project = self
            .store
            .get_project_by_id(project_id)
            .await?
            .ok_or(AppError::ProjectNotFound(project_id))?;

        let mut report = UploadReport::default();
        let mut accepted = Vec::new();
        for upload in uploads {
            match validate_image_bytes(&upload.file_name, &upload.bytes) {
                Ok(validation) => accepted.push((upload, validation)),
                Err(error) => {
                    warn!("Rejected {}: {}", upload.file_name, error);
                    report.rejected.push(RejectedUpload {
                        file_name: upload.file_name,
                        error,
                    });
                }
            }
        }
        if accepted.is_empty() {
            return Ok(report);
        }

        let mut detector = loader
            .load(&project.model_path)
            .map_err(|e| AppError::ModelLoad {
                path: project.model_path.clone(),
                reason: format!("{:#}", e),
            })?;
        let legend = LegendSource::from_texts(&project.class_names, project.color_config.as_deref());

        for (upload, validation) in accepted {
            let rendered = match self.render(detector.as_mut(), &upload.bytes, &legend) {
                Ok(rendered) => rendered,
                Err(error) => {
                    warn!("Processing {} failed: {:#}", upload.file_name, error);
                    report.failed.push(FailedUpload {
                        file_name: upload.file_name,
                        error,
                    });
                    continue;
                }
            };
            let record = self
                .store
                .add_image(
                    project.id,
                    NewImage {
                        original_image: upload.bytes,
                        processed_image: rendered.processed_png,
                        detection_results: rendered.detection_results,
                    },
                )
                .await?;
            info!(
                "Processed {} into image {} with {} detections",
                upload.file_name,
                record.id,
                rendered.detections.len()
            );
            report.processed.push(ProcessedImage {
                file_name: upload.file_name,
                validation,
                record,
                detections: rendered.detections,
            });
        }
        Ok(report)
    }

    fn render(
        &self,
        detector: &mut dyn Detector,
        bytes: &[u8],
        legend: &LegendSource,
    ) -> anyhow::Result<Rendered> {
        let image = image::load_from_memory(bytes).context("Failed to decode image")?;
        let raw = detector.detect(&image).context("Detection failed")?;
        let annotated = self.annotator.annotate(&image, &raw, legend);

        let mut processed_png = Vec::new();
        annotated
            .image
            .write_to(&mut Cursor::new(&mut processed_png), ImageFormat::Png)
            .context("Failed to encode annotated image")?;
        let detection_results = encode_detections(&annotated.detections)?;

        Ok(Rendered {
            processed_png,
            detections: annotated.detections,
            detection_results,
        })
    }
}
