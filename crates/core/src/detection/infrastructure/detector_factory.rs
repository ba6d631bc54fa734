use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::{
    BLAZEFACE_MODEL_NAME, DETECTOR_RETRY_INTERVAL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};

use super::fallback_detector::FallbackDetector;
use super::lazy_detector::{DetectorLoader, LazyDetector};
use super::model_resolver::{self, ModelSpec, ProgressFn};
use super::onnx_blazeface_detector::{self, OnnxBlazefaceDetector};
use super::onnx_yolo_detector::{self, OnnxYoloDetector};

/// Which face detector backs the capture session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorBackend {
    /// Degraded mode: a centered face is always reported.
    Fallback,
    Yolo,
    Blazeface,
}

impl DetectorBackend {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorBackend::Fallback => "fallback",
            DetectorBackend::Yolo => "yolo",
            DetectorBackend::Blazeface => "blazeface",
        }
    }
}

impl FromStr for DetectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fallback" => Ok(DetectorBackend::Fallback),
            "yolo" => Ok(DetectorBackend::Yolo),
            "blazeface" => Ok(DetectorBackend::Blazeface),
            other => Err(format!(
                "Detector backend must be one of: fallback, yolo, blazeface, got '{other}'"
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DetectorConfig {
    pub backend: DetectorBackend,
    /// Model file to use instead of the cache/download lookup.
    pub model_path: Option<PathBuf>,
    /// Detection confidence threshold; the backend default when `None`.
    pub confidence: Option<f64>,
    /// Searched after the user cache and before downloading.
    pub bundled_dir: Option<PathBuf>,
    pub retry_interval: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: DetectorBackend::Yolo,
            model_path: None,
            confidence: None,
            bundled_dir: model_resolver::bundled_model_dir(),
            retry_interval: DETECTOR_RETRY_INTERVAL,
        }
    }
}

/// Creates the detector for `config`.
///
/// Model-backed detectors are wrapped in a [`LazyDetector`] so model
/// resolution (possibly a download) and session setup happen off the
/// sampling path. `progress` receives download progress, if any.
pub fn create_detector(
    config: &DetectorConfig,
    progress: Option<Arc<dyn Fn(u64, u64) + Send + Sync>>,
) -> Box<dyn FaceDetector> {
    log::info!("Using {} face detector", config.backend.name());
    match config.backend {
        DetectorBackend::Fallback => Box::new(FallbackDetector::new()),
        DetectorBackend::Yolo | DetectorBackend::Blazeface => Box::new(LazyDetector::new(
            model_loader(config.clone(), progress),
            config.retry_interval,
        )),
    }
}

fn model_loader(
    config: DetectorConfig,
    progress: Option<Arc<dyn Fn(u64, u64) + Send + Sync>>,
) -> DetectorLoader {
    Arc::new(move || load_detector(&config, progress.clone()))
}

/// Builds the detector for `config` on the calling thread, resolving (and
/// possibly downloading) its model first.
pub fn load_detector(
    config: &DetectorConfig,
    progress: Option<Arc<dyn Fn(u64, u64) + Send + Sync>>,
) -> Result<Box<dyn FaceDetector>, String> {
    let (name, url) = match config.backend {
        DetectorBackend::Fallback => return Ok(Box::new(FallbackDetector::new())),
        DetectorBackend::Blazeface => (BLAZEFACE_MODEL_NAME, None),
        DetectorBackend::Yolo => (YOLO_MODEL_NAME, Some(YOLO_MODEL_URL)),
    };
    let spec = ModelSpec {
        name,
        url,
        explicit: config.model_path.as_deref(),
        bundled_dir: config.bundled_dir.as_deref(),
    };
    let progress_fn: Option<ProgressFn> = progress.map(|p| {
        let f: ProgressFn = Box::new(move |done, total| p(done, total));
        f
    });
    let path = model_resolver::resolve(&spec, progress_fn).map_err(|e| e.to_string())?;

    let detector: Box<dyn FaceDetector> = match config.backend {
        DetectorBackend::Blazeface => Box::new(
            OnnxBlazefaceDetector::new(
                &path,
                config
                    .confidence
                    .unwrap_or(onnx_blazeface_detector::DEFAULT_CONFIDENCE),
            )
            .map_err(|e| e.to_string())?,
        ),
        _ => Box::new(
            OnnxYoloDetector::new(
                &path,
                config
                    .confidence
                    .unwrap_or(onnx_yolo_detector::DEFAULT_CONFIDENCE),
            )
            .map_err(|e| e.to_string())?,
        ),
    };
    Ok(detector)
}
