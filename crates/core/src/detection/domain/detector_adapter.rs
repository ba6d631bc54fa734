use std::panic::{self, AssertUnwindSafe};

use crate::detection::domain::detection_result::{DetectionResult, DetectionSource};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::FrameSample;

/// Fail-closed wrapper around a [`FaceDetector`] backend.
///
/// `detect` never returns an error. Frames whose bytes are not RGB for their
/// stated size are rejected before the backend sees them, backend errors
/// become a `Failed` result without a face, and malformed backend output
/// (degenerate boxes, missing frame size) is normalized.
///
/// Backend panics are caught only where the build unwinds (dev and test
/// profiles). The release profile aborts on panic, so backends must report
/// bad input through their `Result`.
pub struct DetectorAdapter {
    backend: Box<dyn FaceDetector>,
    name: String,
}

impl DetectorAdapter {
    pub fn new(backend: Box<dyn FaceDetector>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    /// Backend name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detect(&mut self, frame: &FrameSample) -> DetectionResult {
        let (fw, fh) = (frame.width(), frame.height());
        if frame.is_empty() {
            return DetectionResult::unavailable(fw, fh);
        }
        if let Err(e) = frame.rgb_view() {
            log::warn!(
                "Detector '{}' skipped frame {}: {e}",
                self.name,
                frame.index()
            );
            return DetectionResult::failed(fw, fh);
        }

        let backend = &mut self.backend;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| backend.detect(frame)));

        match outcome {
            Ok(Ok(result)) => self.sanitize(result, fw, fh),
            Ok(Err(e)) => {
                log::warn!(
                    "Detector '{}' failed on frame {}: {e}",
                    self.name,
                    frame.index()
                );
                DetectionResult::failed(fw, fh)
            }
            Err(_) => {
                log::error!(
                    "Detector '{}' panicked on frame {}",
                    self.name,
                    frame.index()
                );
                DetectionResult::failed(fw, fh)
            }
        }
    }

    fn sanitize(&self, mut result: DetectionResult, fw: u32, fh: u32) -> DetectionResult {
        if result.frame_width == 0 || result.frame_height == 0 {
            result.frame_width = fw;
            result.frame_height = fh;
        }
        if let Some(face) = &result.face {
            if face.bbox.is_degenerate() {
                log::debug!("Detector '{}' returned a degenerate box, ignoring", self.name);
                result.face = None;
            }
        }
        if result.source == DetectionSource::Fallback {
            log::debug!("Frame classified from fallback detector (no real detection)");
        }
        result
    }
}
