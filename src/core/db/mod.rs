mod images;
mod project;
mod state;

use std::{path::Path, sync::Arc};

use anyhow::Context;
use sqlx::{Connection, FromRow};
use state::StoreState;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};

pub use images::{ImageRecord, ImageRepository, NewImage};
pub use project::{DeletedProject, NewProject, Project, ProjectRepository};

/// SQLite store holding projects and their processed images, plus the
/// directory model artifacts are written to.
#[derive(Debug, Clone)]
pub struct StoreDb {
    state: Arc<StoreState>,
}

impl StoreDb {
    /// Open (creating if needed) the database and run migrations.
    pub async fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        db_file: P,
        models_dir: Q,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(StoreState::new(db_file, models_dir).await?),
        })
    }
}

/// Whole-second UTC timestamp, so stored values sort as text.
fn now_timestamp() -> anyhow::Result<(OffsetDateTime, String)> {
    let now = OffsetDateTime::now_utc().replace_nanosecond(0)?;
    let text = now.format(&Rfc3339)?;
    Ok((now, text))
}

fn parse_timestamp(value: &str) -> anyhow::Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .with_context(|| format!("Invalid stored timestamp {:?}", value))
}

#[derive(FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    creator: String,
    model_path: String,
    class_names: String,
    color_config: Option<String>,
    created_at: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = anyhow::Error;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            name: row.name,
            creator: row.creator,
            model_path: row.model_path.into(),
            class_names: row.class_names,
            color_config: row.color_config.filter(|c| !c.is_empty()),
            created_at: parse_timestamp(&row.created_at)?,
            _guard: (),
        })
    }
}

#[derive(FromRow)]
struct ImageRow {
    id: i64,
    project_id: i64,
    original_image: Vec<u8>,
    processed_image: Vec<u8>,
    detection_results: String,
    uploaded_at: String,
}

impl TryFrom<ImageRow> for ImageRecord {
    type Error = anyhow::Error;

    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        Ok(ImageRecord {
            id: row.id,
            project_id: row.project_id,
            original_image: row.original_image,
            processed_image: row.processed_image,
            detection_results: row.detection_results,
            uploaded_at: parse_timestamp(&row.uploaded_at)?,
            _guard: (),
        })
    }
}

const PROJECT_COLUMNS: &str =
    "id, name, creator, model_path, class_names, color_config, created_at";
const IMAGE_COLUMNS: &str =
    "id, project_id, original_image, processed_image, detection_results, uploaded_at";

impl ProjectRepository for StoreDb {
    async fn add_project(&self, project: NewProject) -> anyhow::Result<Project> {
        // The artifact is written before the row exists. A crash in between
        // leaves an orphaned file behind.
        let model_path = self
            .state
            .store_model_artifact(
                &project.name,
                &project.creator,
                &project.model_extension,
                &project.model_bytes,
            )
            .await?;
        let model_path_str = model_path.to_string_lossy().into_owned();
        let (created_at, created_at_str) = now_timestamp()?;
        let color_config = project.color_config.filter(|c| !c.trim().is_empty());

        let inserted: anyhow::Result<i64> = async {
            let mut conn = self.state.conn().await?;
            let id = sqlx::query_scalar::<_, i64>(
                r#"INSERT INTO projects (name, creator, model_path, class_names, color_config, created_at)
                VALUES (?, ?, ?, ?, ?, ?) RETURNING id"#,
            )
            .bind(&project.name)
            .bind(&project.creator)
            .bind(&model_path_str)
            .bind(&project.class_names)
            .bind(&color_config)
            .bind(&created_at_str)
            .fetch_one(&mut conn)
            .await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>(id)
        }
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(e) => {
                // The insert error is what the caller needs to see
                if let Err(cleanup) = self.state.delete_model_artifact(&model_path).await {
                    warn!(
                        "Failed to remove model artifact {:?} after a failed insert: {:#}",
                        model_path, cleanup
                    );
                }
                return Err(e.context("Failed to insert project"));
            }
        };
        info!("Created project {} ({:?} by {:?})", id, project.name, project.creator);

        Ok(Project {
            id,
            name: project.name,
            creator: project.creator,
            model_path,
            class_names: project.class_names,
            color_config,
            created_at,
            _guard: (),
        })
    }

    async fn get_projects(&self) -> anyhow::Result<Vec<Project>> {
        let mut conn = self.state.conn().await?;
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, id DESC",
            PROJECT_COLUMNS
        ))
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        rows.into_iter().map(Project::try_from).collect()
    }

    async fn get_project_by_id(&self, id: i64) -> anyhow::Result<Option<Project>> {
        let mut conn = self.state.conn().await?;
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE id = ?",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut conn)
        .await?;
        conn.close().await?;
        row.map(Project::try_from).transpose()
    }

    async fn delete_project(&self, id: i64) -> anyhow::Result<Option<DeletedProject>> {
        let Some(project) = self.get_project_by_id(id).await? else {
            debug!("Project {} already deleted", id);
            return Ok(None);
        };

        let mut conn = self.state.conn().await?;
        let mut tx = conn.begin().await?;
        let images_removed = sqlx::query("DELETE FROM images WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        conn.close().await?;

        let artifact_removed = self.state.delete_model_artifact(&project.model_path).await?;
        info!(
            "Deleted project {} with {} images (artifact removed: {})",
            id, images_removed, artifact_removed
        );
        Ok(Some(DeletedProject {
            images_removed,
            artifact_removed,
        }))
    }
}

impl ImageRepository for StoreDb {
    async fn add_image(&self, project_id: i64, image: NewImage) -> anyhow::Result<ImageRecord> {
        let (uploaded_at, uploaded_at_str) = now_timestamp()?;
        let mut conn = self.state.conn().await?;
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO images (project_id, original_image, processed_image, detection_results, uploaded_at)
            VALUES (?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(project_id)
        .bind(&image.original_image)
        .bind(&image.processed_image)
        .bind(&image.detection_results)
        .bind(&uploaded_at_str)
        .fetch_one(&mut conn)
        .await
        .with_context(|| format!("Failed to store image for project {}", project_id))?;
        conn.close().await?;
        debug!("Stored image {} for project {}", id, project_id);

        Ok(ImageRecord {
            id,
            project_id,
            original_image: image.original_image,
            processed_image: image.processed_image,
            detection_results: image.detection_results,
            uploaded_at,
            _guard: (),
        })
    }

    async fn get_images(&self, project_id: i64) -> anyhow::Result<Vec<ImageRecord>> {
        let mut conn = self.state.conn().await?;
        let rows = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {} FROM images WHERE project_id = ? ORDER BY uploaded_at DESC, id DESC",
            IMAGE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        rows.into_iter().map(ImageRecord::try_from).collect()
    }

    async fn get_image_by_id(&self, id: i64) -> anyhow::Result<Option<ImageRecord>> {
        let mut conn = self.state.conn().await?;
        let row = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {} FROM images WHERE id = ?",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut conn)
        .await?;
        conn.close().await?;
        row.map(ImageRecord::try_from).transpose()
    }

    async fn count_images(&self, project_id: i64) -> anyhow::Result<u64> {
        let mut conn = self.state.conn().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;
        Ok(count as u64)
    }

    async fn delete_image(&self, id: i64) -> anyhow::Result<bool> {
        let mut conn = self.state.conn().await?;
        let removed = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await?
            .rows_affected();
        conn.close().await?;
        Ok(removed > 0)
    }

    async fn delete_images(&self, ids: &[i64]) -> anyhow::Result<u64> {
        let mut conn = self.state.conn().await?;
        let mut tx = conn.begin().await?;
        let mut removed = 0;
        for id in ids {
            removed += sqlx::query("DELETE FROM images WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        conn.close().await?;
        Ok(removed)
    }
}
