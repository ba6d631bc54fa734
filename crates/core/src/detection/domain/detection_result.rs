use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::bounding_box::BoundingBox;

/// Where a detection result came from.
///
/// Lets the verdict and the logs tell a working detector apart from the
/// canned degraded-mode answer or from a backend that could not run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionSource {
    /// A real backend ran on this frame.
    Detector,
    /// No real backend: a centered face was reported without looking.
    Fallback,
    /// The backend has not finished initializing (or failed to).
    Unavailable,
    /// The backend raised an error on this frame.
    Failed,
}

impl std::fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionSource::Detector => write!(f, "detector"),
            DetectionSource::Fallback => write!(f, "fallback"),
            DetectionSource::Unavailable => write!(f, "unavailable"),
            DetectionSource::Failed => write!(f, "failed"),
        }
    }
}

/// A single detected face in frame-pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRegion {
    pub bbox: BoundingBox,
    pub landmarks: Option<FaceLandmarks>,
    pub confidence: Option<f32>,
}

impl FaceRegion {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            landmarks: None,
            confidence: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// The same face in a frame scaled by `(sx, sy)`.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            bbox: BoundingBox::new(
                self.bbox.x * sx,
                self.bbox.y * sy,
                self.bbox.width * sx,
                self.bbox.height * sy,
            ),
            landmarks: self.landmarks.as_ref().map(|lm| lm.scaled(sx, sy)),
            confidence: self.confidence,
        }
    }
}

/// Zero-or-one face found in one frame, plus the frame size it refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub face: Option<FaceRegion>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub source: DetectionSource,
}

impl DetectionResult {
    pub fn found(face: FaceRegion, frame_width: u32, frame_height: u32) -> Self {
        Self {
            face: Some(face),
            frame_width,
            frame_height,
            source: DetectionSource::Detector,
        }
    }

    pub fn none(frame_width: u32, frame_height: u32) -> Self {
        Self::empty(frame_width, frame_height, DetectionSource::Detector)
    }

    pub fn unavailable(frame_width: u32, frame_height: u32) -> Self {
        Self::empty(frame_width, frame_height, DetectionSource::Unavailable)
    }

    pub fn failed(frame_width: u32, frame_height: u32) -> Self {
        Self::empty(frame_width, frame_height, DetectionSource::Failed)
    }

    fn empty(frame_width: u32, frame_height: u32, source: DetectionSource) -> Self {
        Self {
            face: None,
            frame_width,
            frame_height,
            source,
        }
    }

    pub fn with_source(mut self, source: DetectionSource) -> Self {
        self.source = source;
        self
    }

    /// Picks the face with the highest confidence (largest box on ties or
    /// when no confidences are reported).
    pub fn best_of(faces: Vec<FaceRegion>, frame_width: u32, frame_height: u32) -> Self {
        let best = faces.into_iter().max_by(|a, b| {
            let ca = a.confidence.unwrap_or(0.0);
            let cb = b.confidence.unwrap_or(0.0);
            ca.partial_cmp(&cb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    a.bbox
                        .area()
                        .partial_cmp(&b.bbox.area())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        match best {
            Some(face) => Self::found(face, frame_width, frame_height),
            None => Self::none(frame_width, frame_height),
        }
    }

    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }
}
