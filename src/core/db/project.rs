use std::path::PathBuf;

use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub creator: String,
    pub model_path: PathBuf,
    /// Legend text exactly as uploaded.
    pub class_names: String,
    /// Legacy color-only configuration, when one was supplied.
    pub color_config: Option<String>,
    pub created_at: OffsetDateTime,
    pub(super) _guard: (),
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub creator: String,
    pub model_bytes: Vec<u8>,
    /// Extension for the stored artifact, e.g. `onnx`.
    pub model_extension: String,
    pub class_names: String,
    pub color_config: Option<String>,
}

/// What a project delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedProject {
    pub images_removed: u64,
    pub artifact_removed: bool,
}

pub trait ProjectRepository {
    fn add_project(&self, project: NewProject) -> impl Future<Output = anyhow::Result<Project>>;
    /// All projects, newest first.
    fn get_projects(&self) -> impl Future<Output = anyhow::Result<Vec<Project>>>;
    fn get_project_by_id(&self, id: i64) -> impl Future<Output = anyhow::Result<Option<Project>>>;
    /// Delete a project, its images and its artifact file. Deleting a project
    /// that does not exist returns `None`.
    fn delete_project(&self, id: i64) -> impl Future<Output = anyhow::Result<Option<DeletedProject>>>;
}
