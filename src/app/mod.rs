//! User actions of the detection tool.
//!
//! Each action runs to completion on its own. State that the interactive
//! front end used to keep in session globals (which item is selected, whether a
//! delete was confirmed) is passed in explicitly with the request.

mod delete;
mod project;
mod upload;

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::{
    annotate::{Annotator, find_font},
    config::Settings,
    core::db::{ImageRecord, ImageRepository, StoreDb},
    inference::DetectorLoader,
    validation::LegendError,
};

pub use delete::{Confirmation, ImageDeleteOutcome, ProjectDeleteOutcome};
pub use project::{CreateProjectForm, CreatedProject, ProjectSummary};
pub use upload::{
    FailedUpload, ProcessedImage, RejectedUpload, Upload, UploadReport, read_uploads,
};

/// Whether detection can run. Without a detector backend only browsing and
/// deleting existing data is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    ReadOnly,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("object detection is unavailable, running in read-only mode")]
    ReadOnly,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Legend(#[from] LegendError),
    #[error("model artifact type '{extension}' is not supported (expected one of: {expected})")]
    UnsupportedArtifact { extension: String, expected: String },
    #[error("project {0} not found")]
    ProjectNotFound(i64),
    #[error("failed to load model {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct AppContext {
    store: StoreDb,
    loader: Option<Box<dyn DetectorLoader>>,
    annotator: Annotator,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("store", &self.store)
            .field("loader", &self.loader.as_ref().map(|l| l.name()))
            .field("annotator", &self.annotator)
            .finish()
    }
}

impl AppContext {
    pub fn new(store: StoreDb, loader: Option<Box<dyn DetectorLoader>>, annotator: Annotator) -> Self {
        Self {
            store,
            loader,
            annotator,
        }
    }

    /// Open the store described by `settings` and pick the label font.
    pub async fn open(
        settings: &Settings,
        loader: Option<Box<dyn DetectorLoader>>,
    ) -> anyhow::Result<Self> {
        let store = StoreDb::new(&settings.database, &settings.models_dir).await?;
        let annotator = Annotator::new(find_font(settings.font.as_deref())?);
        let context = Self::new(store, loader, annotator);
        info!(
            "Opened {:?} in {:?} mode",
            settings.database,
            context.mode()
        );
        Ok(context)
    }

    pub fn mode(&self) -> Mode {
        if self.loader.is_some() {
            Mode::Full
        } else {
            Mode::ReadOnly
        }
    }

    pub fn store(&self) -> &StoreDb {
        &self.store
    }

    fn require_loader(&self) -> Result<&dyn DetectorLoader, AppError> {
        self.loader.as_deref().ok_or(AppError::ReadOnly)
    }

    /// Images of a project, newest first.
    pub async fn images(&self, project_id: i64) -> Result<Vec<ImageRecord>, AppError> {
        Ok(self.store.get_images(project_id).await?)
    }

    pub async fn image(&self, id: i64) -> Result<Option<ImageRecord>, AppError> {
        Ok(self.store.get_image_by_id(id).await?)
    }
}
