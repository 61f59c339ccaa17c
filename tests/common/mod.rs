#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types for tests
pub use detectdesk::app::{
    AppContext, AppError, Confirmation, ImageDeleteOutcome, Mode, ProjectDeleteOutcome, Upload,
};
pub use detectdesk::core::db::{
    DeletedProject, ImageRecord, ImageRepository, NewImage, NewProject, Project,
    ProjectRepository, StoreDb,
};
pub use detectdesk::inference::{Detection, RawDetection};
pub use detectdesk::legend::{LegendSource, PaletteColor};
