use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use detectdesk::annotate::Annotator;
use detectdesk::app::{AppContext, CreateProjectForm};
use detectdesk::core::db::{NewImage, NewProject, StoreDb};
use detectdesk::inference::{Detector, DetectorLoader, RawDetection};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};

/// Creates a StoreDb in a temporary directory.
/// Returns both the store and the temp directory (which must be kept alive).
pub async fn create_test_store() -> (StoreDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let store = StoreDb::new(dir.path().join("test.db"), dir.path().join("models"))
        .await
        .expect("Failed to create test store");
    (store, dir)
}

/// Annotator with the bundled font, so output does not depend on the host.
pub fn test_annotator() -> Annotator {
    Annotator::bundled().expect("Failed to load bundled font")
}

/// Creates an AppContext over a fresh store.
pub async fn create_test_context(
    loader: Option<ScriptedLoader>,
) -> (AppContext, tempfile::TempDir) {
    let (store, dir) = create_test_store().await;
    let loader = loader.map(|l| Box::new(l) as Box<dyn DetectorLoader>);
    (AppContext::new(store, loader, test_annotator()), dir)
}

pub fn models_dir(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("models")
}

/// Solid color RGB image.
pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| Rgb(color)))
}

/// PNG encoding of a black image of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    solid_image(width, height, [0, 0, 0])
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes
}

/// Writes a black PNG to `path`, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create image directory");
    }
    std::fs::write(path, png_bytes(width, height)).expect("Failed to write test image");
}

pub fn make_new_project(name: &str, creator: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        creator: creator.to_string(),
        model_bytes: b"fake model weights".to_vec(),
        model_extension: "onnx".to_string(),
        class_names: "person:red\ncar".to_string(),
        color_config: None,
    }
}

pub fn make_new_image(detection_results: &str) -> NewImage {
    NewImage {
        original_image: png_bytes(8, 8),
        processed_image: png_bytes(8, 8),
        detection_results: detection_results.to_string(),
    }
}

pub fn make_form(name: &str, legend: &str) -> CreateProjectForm {
    CreateProjectForm {
        name: name.to_string(),
        creator: "tester".to_string(),
        model_file_name: "weights.onnx".to_string(),
        model_bytes: b"fake model weights".to_vec(),
        legend: legend.to_string(),
        legacy_colors: None,
    }
}

/// Detector returning a fixed list of detections for every image.
pub struct ScriptedDetector {
    detections: Vec<RawDetection>,
    fail: bool,
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _image: &DynamicImage) -> anyhow::Result<Vec<RawDetection>> {
        if self.fail {
            anyhow::bail!("scripted detector failure");
        }
        Ok(self.detections.clone())
    }
}

/// Loader accepting `pt` and `onnx` artifacts without reading them.
#[derive(Clone, Default)]
pub struct ScriptedLoader {
    detections: Vec<RawDetection>,
    fail_load: bool,
    fail_detect: bool,
    loaded: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedLoader {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            ..Self::default()
        }
    }

    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn failing_detect() -> Self {
        Self {
            fail_detect: true,
            ..Self::default()
        }
    }

    /// Artifact paths passed to `load`, shared between clones.
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.loaded.lock().expect("poisoned").clone()
    }
}

impl DetectorLoader for ScriptedLoader {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn artifact_extensions(&self) -> &'static [&'static str] {
        &["pt", "onnx"]
    }

    fn load(&self, model_path: &Path) -> anyhow::Result<Box<dyn Detector>> {
        self.loaded
            .lock()
            .expect("poisoned")
            .push(model_path.to_path_buf());
        if self.fail_load {
            anyhow::bail!("scripted load failure");
        }
        Ok(Box::new(ScriptedDetector {
            detections: self.detections.clone(),
            fail: self.fail_detect,
        }))
    }
}
