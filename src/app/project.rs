use std::path::Path;

use tracing::info;

use crate::{
    core::db::{ImageRepository, NewProject, Project, ProjectRepository},
    legend::LegendSource,
    validation::{ClassColorConfig, validate_legend},
};

use super::{AppContext, AppError};

/// Fields of the project creation form.
#[derive(Debug, Clone, Default)]
pub struct CreateProjectForm {
    pub name: String,
    pub creator: String,
    /// Original file name of the uploaded model, used for its extension.
    pub model_file_name: String,
    pub model_bytes: Vec<u8>,
    pub legend: String,
    /// Optional color-only file in the older `class:color` format.
    pub legacy_colors: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedProject {
    pub project: Project,
    pub legend: ClassColorConfig,
}

/// A project as listed for browsing.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub project: Project,
    pub image_count: u64,
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

impl ProjectSummary {
    /// `name (by creator)`, the label projects are picked by.
    pub fn label(&self) -> String {
        format!("{} (by {})", self.project.name, self.project.creator)
    }

    pub fn legend(&self) -> LegendSource {
        LegendSource::from_texts(
            &self.project.class_names,
            self.project.color_config.as_deref(),
        )
    }

    pub fn legend_preview(&self) -> String {
        preview(&self.project.class_names, 200)
    }

    pub fn legacy_colors_preview(&self) -> Option<String> {
        self.project
            .color_config
            .as_deref()
            .map(|colors| preview(colors, 100))
    }
}

impl AppContext {
    pub async fn create_project(&self, form: CreateProjectForm) -> Result<CreatedProject, AppError> {
        let loader = self.require_loader()?;

        let name = form.name.trim();
        let creator = form.creator.trim();
        if name.is_empty() {
            return Err(AppError::MissingField("project name"));
        }
        if creator.is_empty() {
            return Err(AppError::MissingField("creator name"));
        }
        if form.model_bytes.is_empty() {
            return Err(AppError::MissingField("model file"));
        }
        if form.legend.trim().is_empty() {
            return Err(AppError::MissingField("class names file"));
        }

        let extension = Path::new(&form.model_file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let accepted = loader.artifact_extensions();
        if !accepted.contains(&extension.as_str()) {
            return Err(AppError::UnsupportedArtifact {
                extension,
                expected: accepted.join(", "),
            });
        }

        let legend = validate_legend(&form.legend)?;

        let project = self
            .store
            .add_project(NewProject {
                name: name.to_string(),
                creator: creator.to_string(),
                model_bytes: form.model_bytes,
                model_extension: extension,
                class_names: form.legend,
                color_config: form.legacy_colors,
            })
            .await?;
        info!(
            "Project {} validated with {} classes",
            project.id,
            legend.len()
        );
        Ok(CreatedProject { project, legend })
    }

    /// All projects, newest first, with their image counts.
    pub async fn projects(&self) -> Result<Vec<ProjectSummary>, AppError> {
        let mut summaries = Vec::new();
        for project in self.store.get_projects().await? {
            let image_count = self.store.count_images(project.id).await?;
            summaries.push(ProjectSummary {
                project,
                image_count,
            });
        }
        Ok(summaries)
    }

    pub async fn project(&self, id: i64) -> Result<Option<ProjectSummary>, AppError> {
        let Some(project) = self.store.get_project_by_id(id).await? else {
            return Ok(None);
        };
        let image_count = self.store.count_images(id).await?;
        Ok(Some(ProjectSummary {
            project,
            image_count,
        }))
    }
}
