use crate::detection::domain::detection_result::DetectionSource;

/// Frame-relative description of the detected face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDescriptor {
    /// Box center over frame width, in `[0, 1]`.
    pub center_x: f64,
    /// Box center over frame height, in `[0, 1]`.
    pub center_y: f64,
    /// Box area over frame area, in `[0, 1]`.
    pub relative_size: f64,
    /// `None` when the backend reports no landmarks.
    pub eyes_open: Option<bool>,
    pub head_tilt_ok: Option<bool>,
}

/// Snapshot of one tick's checks. Recomputed wholesale every tick.
///
/// `face` is present exactly when `face_detected` is set, and a frame
/// without a face is never in position.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationVerdict {
    pub face_detected: bool,
    pub in_position: bool,
    pub lighting_ok: bool,
    pub face: Option<FaceDescriptor>,
    pub source: DetectionSource,
}

impl ValidationVerdict {
    /// Verdict for a frame in which no face was found.
    pub fn no_face(lighting_ok: bool, source: DetectionSource) -> Self {
        Self {
            face_detected: false,
            in_position: false,
            lighting_ok,
            face: None,
            source,
        }
    }

    /// Verdict derived from a canned degraded-mode detection.
    pub fn is_fallback(&self) -> bool {
        self.source == DetectionSource::Fallback
    }
}
