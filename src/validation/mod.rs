//! Checks applied to uploads before anything is stored.

pub mod images;
pub mod legend;

pub use images::{
    DirectoryReport, FieldViolation, IMAGE_EXTENSIONS, ImageCandidate, ImageValidation,
    ImageValidationError, MAX_FILE_NAME_LEN, MAX_IMAGE_BYTES, MAX_IMAGE_DIMENSION, file_extension,
    is_image_extension, validate_directory, validate_image_bytes, validate_image_file,
    validate_image_metadata,
};
pub use legend::{
    ClassColorConfig, ClassColorEntry, LegendError, MAX_CLASS_NAME_LEN, MAX_LEGEND_ENTRIES,
    validate_legend,
};
