use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::constants::{
    BRIGHTNESS_MAX, BRIGHTNESS_MIN, CENTER_MAX, CENTER_MIN, FACE_SIZE_MAX, FACE_SIZE_MIN,
    HEAD_TILT_MAX,
};

use super::verdict::{FaceDescriptor, ValidationVerdict};

/// Windows used by [`classify`]. Position and size bounds are inclusive,
/// brightness bounds exclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierThresholds {
    pub center_min: f64,
    pub center_max: f64,
    pub size_min: f64,
    pub size_max: f64,
    /// Max vertical eye offset as a fraction of frame height.
    pub head_tilt_max: f64,
    pub brightness_min: f64,
    pub brightness_max: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            center_min: CENTER_MIN,
            center_max: CENTER_MAX,
            size_min: FACE_SIZE_MIN,
            size_max: FACE_SIZE_MAX,
            head_tilt_max: HEAD_TILT_MAX,
            brightness_min: BRIGHTNESS_MIN,
            brightness_max: BRIGHTNESS_MAX,
        }
    }
}

impl ClassifierThresholds {
    pub fn center_ok(&self, v: f64) -> bool {
        (self.center_min..=self.center_max).contains(&v)
    }

    pub fn size_ok(&self, v: f64) -> bool {
        (self.size_min..=self.size_max).contains(&v)
    }

    pub fn brightness_ok(&self, v: f64) -> bool {
        v > self.brightness_min && v < self.brightness_max
    }
}

/// Turns one detection (plus an optional brightness sample) into a verdict.
///
/// Without a brightness sample the lighting flag is carried over from
/// `previous`, defaulting to `true`.
pub fn classify(
    detection: &DetectionResult,
    brightness: Option<f64>,
    previous: Option<&ValidationVerdict>,
    thresholds: &ClassifierThresholds,
) -> ValidationVerdict {
    let lighting_ok = match brightness {
        Some(b) => thresholds.brightness_ok(b),
        None => previous.map_or(true, |p| p.lighting_ok),
    };

    let (fw, fh) = (detection.frame_width as f64, detection.frame_height as f64);
    let face = match &detection.face {
        Some(face) if fw > 0.0 && fh > 0.0 => face,
        _ => return ValidationVerdict::no_face(lighting_ok, detection.source),
    };

    let (cx, cy) = face.bbox.center();
    let center_x = (cx / fw).clamp(0.0, 1.0);
    let center_y = (cy / fh).clamp(0.0, 1.0);
    let relative_size = (face.bbox.area() / (fw * fh)).clamp(0.0, 1.0);

    let eyes_open = face.landmarks.as_ref().map(|lm| lm.eyes_visible());
    let head_tilt_ok = face.landmarks.as_ref().map(|lm| {
        lm.eye_vertical_offset()
            .is_some_and(|dy| dy < thresholds.head_tilt_max * fh)
    });

    let in_position = thresholds.center_ok(center_x)
        && thresholds.center_ok(center_y)
        && thresholds.size_ok(relative_size)
        && eyes_open.unwrap_or(true)
        && head_tilt_ok.unwrap_or(true);

    ValidationVerdict {
        face_detected: true,
        in_position,
        lighting_ok,
        face: Some(FaceDescriptor {
            center_x,
            center_y,
            relative_size,
            eyes_open,
            head_tilt_ok,
        }),
        source: detection.source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::{DetectionSource, FaceRegion};
    use crate::detection::domain::face_landmarks::FaceLandmarks;
    use crate::shared::bounding_box::BoundingBox;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const FRAME: u32 = 1000;

    /// 500x500 face (25% of the frame) centered at `(cx, cy)`.
    fn face_at(cx: f64, cy: f64) -> DetectionResult {
        let bbox = BoundingBox::new(cx - 250.0, cy - 250.0, 500.0, 500.0);
        DetectionResult::found(FaceRegion::new(bbox), FRAME, FRAME)
    }

    fn verdict(detection: &DetectionResult) -> ValidationVerdict {
        classify(detection, None, None, &ClassifierThresholds::default())
    }

    #[test]
    fn test_centered_face_is_in_position() {
        let v = verdict(&face_at(500.0, 500.0));
        assert!(v.face_detected);
        assert!(v.in_position);
        let face = v.face.unwrap();
        assert_relative_eq!(face.center_x, 0.5);
        assert_relative_eq!(face.relative_size, 0.25);
        assert_eq!(face.eyes_open, None);
    }

    #[rstest]
    #[case(90.0, 0.0)]
    #[case(-90.0, 0.0)]
    #[case(0.0, 90.0)]
    #[case(0.0, -90.0)]
    #[case(90.0, -90.0)]
    fn test_small_offset_stays_in_position(#[case] dx: f64, #[case] dy: f64) {
        assert!(verdict(&face_at(500.0 + dx, 500.0 + dy)).in_position);
    }

    #[rstest]
    #[case(110.0, 0.0)]
    #[case(-110.0, 0.0)]
    #[case(0.0, 110.0)]
    #[case(0.0, -110.0)]
    fn test_large_offset_leaves_position(#[case] dx: f64, #[case] dy: f64) {
        let v = verdict(&face_at(500.0 + dx, 500.0 + dy));
        assert!(v.face_detected);
        assert!(!v.in_position);
    }

    #[rstest]
    #[case(300.0, false)] // 9%
    #[case(400.0, true)] // 16%
    #[case(600.0, true)] // 36%
    #[case(700.0, false)] // 49%
    fn test_size_window(#[case] side: f64, #[case] expected: bool) {
        let bbox = BoundingBox::new(500.0 - side / 2.0, 500.0 - side / 2.0, side, side);
        let det = DetectionResult::found(FaceRegion::new(bbox), FRAME, FRAME);
        assert_eq!(verdict(&det).in_position, expected);
    }

    #[test]
    fn test_no_face_is_never_in_position() {
        let v = verdict(&DetectionResult::none(FRAME, FRAME));
        assert!(!v.face_detected);
        assert!(!v.in_position);
        assert!(v.face.is_none());
    }

    #[rstest]
    #[case(150.0, true)]
    #[case(20.0, false)]
    #[case(250.0, false)]
    #[case(100.0, false)]
    #[case(200.0, false)]
    fn test_lighting_window(#[case] brightness: f64, #[case] expected: bool) {
        let v = classify(
            &face_at(500.0, 500.0),
            Some(brightness),
            None,
            &ClassifierThresholds::default(),
        );
        assert_eq!(v.lighting_ok, expected);
        // Lighting does not affect position.
        assert!(v.in_position);
    }

    #[test]
    fn test_lighting_carried_over_without_sample() {
        let thresholds = ClassifierThresholds::default();
        let dark = classify(&face_at(500.0, 500.0), Some(20.0), None, &thresholds);
        let failed = DetectionResult::failed(FRAME, FRAME);
        let next = classify(&failed, None, Some(&dark), &thresholds);

        assert!(!next.lighting_ok);
        assert!(!next.face_detected);
        assert_eq!(next.source, DetectionSource::Failed);
    }

    #[test]
    fn test_lighting_defaults_to_ok() {
        assert!(verdict(&DetectionResult::none(FRAME, FRAME)).lighting_ok);
    }

    #[test]
    fn test_tilted_head_fails_position() {
        let mut det = face_at(500.0, 500.0);
        let lm = FaceLandmarks::from_eyes((420.0, 400.0), (580.0, 460.0));
        det.face = det.face.map(|f| f.with_landmarks(lm));

        let v = verdict(&det);
        let face = v.face.as_ref().unwrap();
        assert_eq!(face.eyes_open, Some(true));
        assert_eq!(face.head_tilt_ok, Some(false));
        assert!(!v.in_position);
    }

    #[test]
    fn test_hidden_eye_fails_position() {
        let mut det = face_at(500.0, 500.0);
        let lm = FaceLandmarks::from_eyes((420.0, 400.0), (0.0, 0.0));
        det.face = det.face.map(|f| f.with_landmarks(lm));

        let v = verdict(&det);
        assert_eq!(v.face.as_ref().unwrap().eyes_open, Some(false));
        assert!(!v.in_position);
    }

    #[test]
    fn test_level_eyes_pass() {
        let mut det = face_at(500.0, 500.0);
        let lm = FaceLandmarks::from_eyes((420.0, 400.0), (580.0, 420.0));
        det.face = det.face.map(|f| f.with_landmarks(lm));
        assert!(verdict(&det).in_position);
    }

    #[test]
    fn test_fallback_source_is_kept() {
        let det = face_at(500.0, 500.0).with_source(DetectionSource::Fallback);
        let v = verdict(&det);
        assert!(v.is_fallback());
        assert!(v.in_position);
    }
}
