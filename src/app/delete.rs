use tracing::info;

use crate::core::db::{DeletedProject, ImageRepository, ProjectRepository};

use super::{AppContext, AppError};

/// Whether the user has confirmed a destructive action in this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Unconfirmed,
    Confirmed,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Unconfirmed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDeleteOutcome {
    /// Nothing was deleted; the caller should ask before retrying confirmed.
    NeedsConfirmation { count: usize },
    Deleted { count: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectDeleteOutcome {
    NeedsConfirmation { name: String, image_count: u64 },
    Deleted(DeletedProject),
    /// The project was already gone.
    NotFound,
}

impl AppContext {
    /// Delete one or many images.
    pub async fn delete_images(
        &self,
        ids: &[i64],
        confirmation: Confirmation,
    ) -> Result<ImageDeleteOutcome, AppError> {
        if confirmation == Confirmation::Unconfirmed {
            return Ok(ImageDeleteOutcome::NeedsConfirmation { count: ids.len() });
        }
        let count = match ids {
            [id] => u64::from(self.store.delete_image(*id).await?),
            _ => self.store.delete_images(ids).await?,
        };
        info!("Deleted {} of {} requested images", count, ids.len());
        Ok(ImageDeleteOutcome::Deleted { count })
    }

    /// Delete a project with its images and model artifact. Deleting a
    /// project that is already gone is a no-op.
    pub async fn delete_project(
        &self,
        id: i64,
        confirmation: Confirmation,
    ) -> Result<ProjectDeleteOutcome, AppError> {
        if confirmation == Confirmation::Unconfirmed {
            return Ok(match self.project(id).await? {
                Some(summary) => ProjectDeleteOutcome::NeedsConfirmation {
                    name: summary.project.name,
                    image_count: summary.image_count,
                },
                None => ProjectDeleteOutcome::NotFound,
            });
        }
        Ok(match self.store.delete_project(id).await? {
            Some(deleted) => ProjectDeleteOutcome::Deleted(deleted),
            None => ProjectDeleteOutcome::NotFound,
        })
    }
}
