use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::ImageReader;
use thiserror::Error;

pub const MAX_FILE_NAME_LEN: usize = 255;
pub const MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 10_000;
pub const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".bmp"];
const DANGEROUS_CHARS: [char; 9] = ['<', '>', ':', '"', '|', '?', '*', '\\', '/'];

/// What the validator needs to know about an upload.
#[derive(Debug, Clone, Copy)]
pub struct ImageCandidate<'a> {
    pub file_name: &'a str,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
}

/// An upload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageValidation {
    pub file_name: String,
    pub file_size: u64,
    /// Lowercased extension including the dot, e.g. `.jpg`.
    pub file_type: String,
    pub width: u32,
    pub height: u32,
}

impl ImageValidation {
    pub fn size_mb(&self) -> f64 {
        self.file_size as f64 / 1024.0 / 1024.0
    }

    pub fn summary(&self) -> String {
        format!(
            "Valid image: {}x{}, {:.1}MB",
            self.width,
            self.height,
            self.size_mb()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum ImageValidationError {
    #[error("Validation errors: {}", join_violations(.0))]
    Invalid(Vec<FieldViolation>),
    #[error("Invalid image format: {0}")]
    InvalidFormat(String),
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unexpected error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageValidationError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ImageValidationError::Invalid(violations) => violations,
            _ => &[],
        }
    }

    pub fn has_violation(&self, field: &str) -> bool {
        self.violations().iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Lowercased extension of a file name including the leading dot, or an empty
/// string when there is none.
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

pub fn is_image_extension(file_name: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&file_extension(file_name).as_str())
}

pub fn validate_image_metadata(
    candidate: ImageCandidate<'_>,
) -> Result<ImageValidation, ImageValidationError> {
    let mut violations = Vec::new();
    let mut violate = |field: &'static str, reason: String| {
        violations.push(FieldViolation { field, reason });
    };

    let file_name = candidate.file_name.trim();
    if file_name.is_empty() {
        violate("file_name", "file name cannot be empty".to_string());
    } else if candidate.file_name.chars().count() > MAX_FILE_NAME_LEN {
        violate(
            "file_name",
            format!("file name must be at most {} characters", MAX_FILE_NAME_LEN),
        );
    }
    if candidate.file_name.contains(DANGEROUS_CHARS) {
        violate(
            "file_name",
            format!(
                "file name contains invalid characters: {}",
                DANGEROUS_CHARS.iter().collect::<String>()
            ),
        );
    }

    if candidate.file_size == 0 {
        violate("file_size", "file is empty".to_string());
    } else if candidate.file_size > MAX_IMAGE_BYTES {
        violate(
            "file_size",
            format!(
                "file is {} bytes, the limit is {} bytes (50MB)",
                candidate.file_size, MAX_IMAGE_BYTES
            ),
        );
    }

    let file_type = file_extension(file_name);
    if !IMAGE_EXTENSIONS.contains(&file_type.as_str()) {
        violate(
            "file_type",
            format!(
                "Invalid file type: '{}'. Valid types are: {}",
                file_type,
                IMAGE_EXTENSIONS.join(", ")
            ),
        );
    }

    for (field, value) in [("image_width", candidate.width), ("image_height", candidate.height)] {
        if value == 0 {
            violate(field, "must be greater than 0".to_string());
        } else if value > MAX_IMAGE_DIMENSION {
            violate(
                field,
                format!("{} exceeds the {} pixel limit", value, MAX_IMAGE_DIMENSION),
            );
        }
    }

    if !violations.is_empty() {
        return Err(ImageValidationError::Invalid(violations));
    }
    Ok(ImageValidation {
        file_name: file_name.to_string(),
        file_size: candidate.file_size,
        file_type,
        width: candidate.width,
        height: candidate.height,
    })
}

/// Read only the image header to get its dimensions.
fn read_dimensions<R: std::io::BufRead + std::io::Seek>(
    reader: ImageReader<R>,
) -> Result<(u32, u32), ImageValidationError> {
    reader
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| ImageValidationError::InvalidFormat(e.to_string()))
}

/// Validate an upload held in memory.
pub fn validate_image_bytes(
    file_name: &str,
    bytes: &[u8],
) -> Result<ImageValidation, ImageValidationError> {
    let (width, height) = read_dimensions(ImageReader::new(Cursor::new(bytes)))?;
    validate_image_metadata(ImageCandidate {
        file_name,
        file_size: bytes.len() as u64,
        width,
        height,
    })
}

pub fn validate_image_file<P: AsRef<Path>>(path: P) -> Result<ImageValidation, ImageValidationError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ImageValidationError::NotFound(path.to_path_buf()));
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_size = std::fs::metadata(path)?.len();
    let (width, height) = read_dimensions(ImageReader::open(path)?)?;
    validate_image_metadata(ImageCandidate {
        file_name: &file_name,
        file_size,
        width,
        height,
    })
}

/// Result of checking every image under a directory.
#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub valid: Vec<PathBuf>,
    pub invalid: Vec<(PathBuf, ImageValidationError)>,
}

/// Recursively validate files with an image extension under `dir`. Other
/// files are ignored. Entries are visited in sorted order.
pub fn validate_directory<P: AsRef<Path>>(dir: P) -> anyhow::Result<DirectoryReport> {
    let mut report = DirectoryReport::default();
    let mut pending = vec![dir.as_ref().to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = std::fs::read_dir(&current)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();
        for path in entries.into_iter().rev() {
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let is_image = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(is_image_extension)
                .unwrap_or(false);
            if !is_image {
                continue;
            }
            match validate_image_file(&path) {
                Ok(_) => report.valid.push(path),
                Err(e) => report.invalid.push((path, e)),
            }
        }
    }
    report.valid.sort();
    report.invalid.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(report)
}
