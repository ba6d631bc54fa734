use super::verdict::ValidationVerdict;

/// Whether the shutter may be enabled. Lighting is advisory only.
pub fn can_capture(verdict: &ValidationVerdict) -> bool {
    verdict.face_detected && verdict.in_position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::DetectionSource;
    use crate::validation::domain::verdict::FaceDescriptor;
    use rstest::rstest;

    fn verdict(face_detected: bool, in_position: bool, lighting_ok: bool) -> ValidationVerdict {
        ValidationVerdict {
            face_detected,
            in_position,
            lighting_ok,
            face: face_detected.then(|| FaceDescriptor {
                center_x: 0.5,
                center_y: 0.5,
                relative_size: 0.25,
                eyes_open: None,
                head_tilt_ok: None,
            }),
            source: DetectionSource::Detector,
        }
    }

    #[rstest]
    #[case(true, true, true, true)]
    #[case(true, true, false, true)]
    #[case(true, false, true, false)]
    #[case(false, false, true, false)]
    #[case(false, false, false, false)]
    fn test_gate(
        #[case] face_detected: bool,
        #[case] in_position: bool,
        #[case] lighting_ok: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(
            can_capture(&verdict(face_detected, in_position, lighting_ok)),
            expected
        );
    }
}
