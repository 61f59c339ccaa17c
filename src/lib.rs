pub mod annotate;
pub mod app;
pub mod config;
pub mod core;
pub mod inference;
pub mod legend;
pub mod validation;

pub use annotate::Annotator;
pub use app::{AppContext, AppError, Confirmation, Mode};
pub use config::Settings;
pub use crate::core::db::StoreDb;
pub use inference::{Detection, Detector, DetectorLoader, RawDetection};
pub use legend::{LegendSource, PaletteColor};
