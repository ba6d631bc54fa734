use crate::detection::domain::detection_result::{DetectionResult, DetectionSource, FaceRegion};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::FrameSample;

/// Fraction of the frame area covered by the canned face.
const DEFAULT_FACE_AREA: f64 = 0.25;

/// Degraded mode: reports a centered face on every frame without looking.
///
/// Used when no real detector is available so capture stays possible.
/// Results are tagged [`DetectionSource::Fallback`] so they never pass for
/// a genuine detection.
pub struct FallbackDetector {
    face_area: f64,
}

impl FallbackDetector {
    pub fn new() -> Self {
        log::warn!("No face detector available; running in degraded mode (centered face assumed)");
        Self {
            face_area: DEFAULT_FACE_AREA,
        }
    }
}

impl Default for FallbackDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceDetector for FallbackDetector {
    fn detect(
        &mut self,
        frame: &FrameSample,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let (fw, fh) = (frame.width() as f64, frame.height() as f64);
        // Same aspect as the frame: area fraction = side * side.
        let side = self.face_area.sqrt();
        let (w, h) = (fw * side, fh * side);
        let bbox = BoundingBox::new((fw - w) / 2.0, (fh - h) / 2.0, w, h);

        Ok(
            DetectionResult::found(FaceRegion::new(bbox), frame.width(), frame.height())
                .with_source(DetectionSource::Fallback),
        )
    }
}
