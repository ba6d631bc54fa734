use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::frame::FrameSample;

/// Domain interface for face detection backends.
///
/// Implementations may be stateful (model sessions, cached pushes), hence
/// `&mut self`. Errors are allowed here; the [`DetectorAdapter`] turns them
/// into "no face" verdict input.
///
/// [`DetectorAdapter`]: crate::detection::domain::detector_adapter::DetectorAdapter
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &FrameSample) -> Result<DetectionResult, Box<dyn std::error::Error>>;
}
