use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use detectdesk::app::{
    AppContext, Confirmation, CreateProjectForm, ImageDeleteOutcome, Mode, ProjectDeleteOutcome,
    read_uploads,
};
use detectdesk::config::{SettingsArgs, init_tracing};
use detectdesk::inference::backends::default_loader;

#[derive(Parser)]
#[command(name = "detectdesk")]
#[command(about = "Register detection models, run them on images and browse the results")]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a project from a model artifact and a class legend
    CreateProject {
        #[arg(long)]
        name: String,
        #[arg(long)]
        creator: String,
        /// Model artifact file
        #[arg(long, value_name = "FILE")]
        model: PathBuf,
        /// Class legend, one `class` or `class:color` per line
        #[arg(long, value_name = "FILE")]
        legend: PathBuf,
        /// Older color-only `class:color` file
        #[arg(long, value_name = "FILE")]
        legacy_colors: Option<PathBuf>,
    },
    /// List projects, newest first
    ListProjects,
    /// Show one project and its legend
    ShowProject { id: i64 },
    /// Run detection on images and store the results under a project
    Upload {
        project_id: i64,
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
    },
    /// List the images stored for a project
    ListImages { project_id: i64 },
    /// Show the detections of an image, optionally exporting its pictures
    ShowImage {
        id: i64,
        /// Write the original upload to this file
        #[arg(long, value_name = "FILE")]
        export_original: Option<PathBuf>,
        /// Write the annotated PNG to this file
        #[arg(long, value_name = "FILE")]
        export_annotated: Option<PathBuf>,
    },
    /// Delete one or more images
    DeleteImage {
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Delete a project, its images and its model artifact
    DeleteProject {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let settings = args.settings.into_settings();
    let loader = default_loader(settings.confidence, settings.iou);
    let app = AppContext::open(&settings, loader).await?;

    if app.mode() == Mode::ReadOnly {
        println!("Object detection is not available in this build; existing data is read-only.");
    }

    match args.command {
        Command::CreateProject {
            name,
            creator,
            model,
            legend,
            legacy_colors,
        } => {
            let form = CreateProjectForm {
                name,
                creator,
                model_file_name: file_name_of(&model),
                model_bytes: std::fs::read(&model)
                    .with_context(|| format!("Failed to read model {:?}", model))?,
                legend: read_text(&legend)?,
                legacy_colors: legacy_colors.as_deref().map(read_text).transpose()?,
            };
            let created = app.create_project(form).await?;
            println!("Project '{}' created successfully!", created.project.name);
            println!("Project ID: {}", created.project.id);
            println!("Validated {} classes", created.legend.len());
            println!(
                "  {} with custom colors, {} with default colors",
                created.legend.custom_color_count(),
                created.legend.default_color_count()
            );
        }
        Command::ListProjects => {
            let projects = app.projects().await?;
            if projects.is_empty() {
                println!("No projects found.");
            }
            for summary in projects {
                println!(
                    "{:>4}  {}  created {}  images: {}",
                    summary.project.id,
                    summary.label(),
                    summary.project.created_at,
                    summary.image_count
                );
            }
        }
        Command::ShowProject { id } => {
            let Some(summary) = app.project(id).await? else {
                println!("Project {} not found.", id);
                return Ok(());
            };
            let project = &summary.project;
            println!("=== {} ===", summary.label());
            println!("Project ID: {}", project.id);
            println!("Created: {}", project.created_at);
            println!("Model: {}", file_name_of(&project.model_path));
            println!("Images processed: {}", summary.image_count);
            println!("\nClass names and colors:\n{}", summary.legend_preview());
            match summary.legacy_colors_preview() {
                Some(colors) => println!("\nLegacy color config:\n{}", colors),
                None => println!("\nColor configuration: legend colors with palette defaults"),
            }
            let legend = summary.legend();
            println!("\nResolved colors:");
            for (index, class_name) in legend.legend().class_names.iter().enumerate() {
                println!(
                    "  {:3}. {} -> {}",
                    index + 1,
                    class_name,
                    legend.resolve_color(class_name, index)
                );
            }
        }
        Command::Upload { project_id, images } => {
            let (uploads, unreadable) = read_uploads(&images);
            let mut report = app.upload_images(project_id, uploads).await?;
            report.rejected.splice(0..0, unreadable);

            if !report.rejected.is_empty() {
                println!("{} images were rejected:", report.rejected.len());
                for rejected in &report.rejected {
                    println!("  - {}: {}", rejected.file_name, rejected.error);
                }
            }
            for failed in &report.failed {
                println!("  - {}: {:#}", failed.file_name, failed.error);
            }
            println!(
                "Processed {} of {} images.",
                report.processed.len(),
                report.total()
            );
            for processed in &report.processed {
                println!(
                    "\n{} ({}x{}, {:.1}MB) -> image {}: detected {} objects",
                    processed.file_name,
                    processed.validation.width,
                    processed.validation.height,
                    processed.validation.size_mb(),
                    processed.record.id,
                    processed.detections.len()
                );
                for detection in &processed.detections {
                    println!(
                        "  {} {:.2} [{}, {}, {}, {}] {}",
                        detection.class_name,
                        detection.confidence,
                        detection.bbox[0],
                        detection.bbox[1],
                        detection.bbox[2],
                        detection.bbox[3],
                        detection.color
                    );
                }
            }
        }
        Command::ListImages { project_id } => {
            let images = app.images(project_id).await?;
            if images.is_empty() {
                println!("No images found for this project.");
            }
            for record in images {
                let detections = match record.detections() {
                    Ok(detections) => detections.len().to_string(),
                    Err(e) => format!("unreadable ({})", e),
                };
                println!(
                    "Image {} (Uploaded: {})  detections: {}",
                    record.id, record.uploaded_at, detections
                );
            }
        }
        Command::ShowImage {
            id,
            export_original,
            export_annotated,
        } => {
            let Some(record) = app.image(id).await? else {
                println!("Image {} not found.", id);
                return Ok(());
            };
            println!("Image {} of project {}", record.id, record.project_id);
            println!("Uploaded: {}", record.uploaded_at);
            match record.detections() {
                Ok(detections) if detections.is_empty() => println!("No detections."),
                Ok(detections) => {
                    println!("{:<20} {:>10}  {:<24} {}", "class", "confidence", "bbox", "color");
                    for d in detections {
                        println!(
                            "{:<20} {:>10.2}  {:<24} {}",
                            d.class_name,
                            d.confidence,
                            format!("[{}, {}, {}, {}]", d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]),
                            d.color
                        );
                    }
                }
                Err(e) => println!("Could not parse detection results: {}", e),
            }
            if let Some(path) = export_original {
                std::fs::write(&path, &record.original_image)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Original written to {:?}", path);
            }
            if let Some(path) = export_annotated {
                std::fs::write(&path, &record.processed_image)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Annotated image written to {:?}", path);
            }
        }
        Command::DeleteImage { ids, yes } => {
            match app.delete_images(&ids, Confirmation::from(yes)).await? {
                ImageDeleteOutcome::NeedsConfirmation { count } => {
                    println!("This will permanently delete {} images, including", count);
                    println!("original and processed images and detection results.");
                    println!("Re-run with --yes to confirm.");
                }
                ImageDeleteOutcome::Deleted { count } => {
                    println!("Successfully deleted {} images!", count);
                }
            }
        }
        Command::DeleteProject { id, yes } => {
            match app.delete_project(id, Confirmation::from(yes)).await? {
                ProjectDeleteOutcome::NeedsConfirmation { name, image_count } => {
                    println!("This will permanently delete project '{}',", name);
                    println!("its {} images and its model file.", image_count);
                    println!("Re-run with --yes to confirm.");
                }
                ProjectDeleteOutcome::Deleted(deleted) => {
                    println!(
                        "Project {} deleted with {} images.",
                        id, deleted.images_removed
                    );
                    if !deleted.artifact_removed {
                        println!("Model file was already missing.");
                    }
                }
                ProjectDeleteOutcome::NotFound => println!("Project {} does not exist.", id),
            }
        }
    }

    Ok(())
}
