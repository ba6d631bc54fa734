use super::classifier::ClassifierThresholds;
use super::verdict::ValidationVerdict;

/// Overlay severity: red, yellow or green in a UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuidanceStatus {
    NoFace,
    Adjust,
    Ready,
}

impl GuidanceStatus {
    /// Suggested overlay color as a hex RGB string.
    pub fn color_hex(&self) -> &'static str {
        match self {
            GuidanceStatus::NoFace => "#E74C3C",
            GuidanceStatus::Adjust => "#F1C40F",
            GuidanceStatus::Ready => "#2ECC71",
        }
    }
}

impl std::fmt::Display for GuidanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidanceStatus::NoFace => write!(f, "no face"),
            GuidanceStatus::Adjust => write!(f, "adjust"),
            GuidanceStatus::Ready => write!(f, "ready"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guidance {
    pub status: GuidanceStatus,
    pub message: &'static str,
}

/// One hint for the user, most important problem first: face presence,
/// then horizontal, vertical and distance corrections, then eyes and tilt,
/// then lighting.
pub fn guidance(verdict: &ValidationVerdict, thresholds: &ClassifierThresholds) -> Guidance {
    let adjust = |message: &'static str| Guidance {
        status: GuidanceStatus::Adjust,
        message,
    };

    let Some(face) = verdict.face.as_ref().filter(|_| verdict.face_detected) else {
        return Guidance {
            status: GuidanceStatus::NoFace,
            message: "No face detected.",
        };
    };

    if face.center_x < thresholds.center_min {
        return adjust("Move your face right.");
    }
    if face.center_x > thresholds.center_max {
        return adjust("Move your face left.");
    }
    if face.center_y < thresholds.center_min {
        return adjust("Move your face down.");
    }
    if face.center_y > thresholds.center_max {
        return adjust("Move your face up.");
    }
    if face.relative_size < thresholds.size_min {
        return adjust("Move closer to the camera.");
    }
    if face.relative_size > thresholds.size_max {
        return adjust("Move farther from the camera.");
    }
    if face.eyes_open == Some(false) {
        return adjust("Keep both eyes open and visible.");
    }
    if face.head_tilt_ok == Some(false) {
        return adjust("Keep your head level.");
    }
    if !verdict.in_position {
        return adjust("Center your face in the guide.");
    }
    if !verdict.lighting_ok {
        return adjust("Improve lighting conditions.");
    }

    Guidance {
        status: GuidanceStatus::Ready,
        message: "Perfect! Hold still to capture.",
    }
}
