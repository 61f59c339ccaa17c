use std::path::PathBuf;

use clap::Args;

pub const DEFAULT_DB_FILE: &str = "detectdesk.db";
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_CONFIDENCE: f32 = 0.25;
pub const DEFAULT_IOU: f32 = 0.45;

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: PathBuf,
    pub models_dir: PathBuf,
    /// Label font; system fonts are tried when unset or unreadable.
    pub font: Option<PathBuf>,
    pub confidence: f32,
    pub iou: f32,
}

impl Settings {
    /// Default layout under one data directory.
    pub fn from_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        let data_dir = data_dir.into();
        Self {
            database: data_dir.join(DEFAULT_DB_FILE),
            models_dir: data_dir.join(DEFAULT_MODELS_DIR),
            font: None,
            confidence: DEFAULT_CONFIDENCE,
            iou: DEFAULT_IOU,
        }
    }
}

/// Storage and inference flags shared by the command line tools.
#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// Directory holding the database and model artifacts
    #[arg(long, env = "DETECTDESK_DATA_DIR", default_value = ".", value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Database file (default: <DATA_DIR>/detectdesk.db)
    #[arg(long, env = "DETECTDESK_DATABASE", value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Model artifact directory (default: <DATA_DIR>/models)
    #[arg(long, env = "DETECTDESK_MODELS_DIR", value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// TrueType font used for detection labels
    #[arg(long, env = "DETECTDESK_FONT", value_name = "FILE")]
    pub font: Option<PathBuf>,

    /// Minimum confidence for a detection to be kept
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f32,

    /// Overlap threshold for non-maximum suppression
    #[arg(long, default_value_t = DEFAULT_IOU)]
    pub iou: f32,
}

impl SettingsArgs {
    pub fn into_settings(self) -> Settings {
        let defaults = Settings::from_data_dir(&self.data_dir);
        Settings {
            database: self.database.unwrap_or(defaults.database),
            models_dir: self.models_dir.unwrap_or(defaults.models_dir),
            font: self.font,
            confidence: self.confidence,
            iou: self.iou,
        }
    }
}

/// Install the log subscriber for a binary. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
