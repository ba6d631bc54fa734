//! 5-point face landmarks: eyes, nose tip and mouth corners.
//!
//! Points with `x <= 0` are invisible; detectors leave low-confidence
//! keypoints at the origin.

const LEFT_EYE: usize = 0;
const RIGHT_EYE: usize = 1;
const NOSE: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    /// Landmarks from an eye pair only; nose and mouth stay invisible.
    pub fn from_eyes(left_eye: (f64, f64), right_eye: (f64, f64)) -> Self {
        let mut points = [(0.0, 0.0); 5];
        points[LEFT_EYE] = left_eye;
        points[RIGHT_EYE] = right_eye;
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    pub fn left_eye(&self) -> Option<(f64, f64)> {
        visible(self.points[LEFT_EYE])
    }

    pub fn right_eye(&self) -> Option<(f64, f64)> {
        visible(self.points[RIGHT_EYE])
    }

    pub fn nose(&self) -> Option<(f64, f64)> {
        visible(self.points[NOSE])
    }

    /// Both eyes were located with enough confidence to be reported.
    pub fn eyes_visible(&self) -> bool {
        self.left_eye().is_some() && self.right_eye().is_some()
    }

    /// Absolute vertical distance between the eyes in pixels.
    ///
    /// `None` when either eye is invisible.
    pub fn eye_vertical_offset(&self) -> Option<f64> {
        let (_, ly) = self.left_eye()?;
        let (_, ry) = self.right_eye()?;
        Some((ly - ry).abs())
    }

    /// Scales every visible point independently per axis.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            if p.0 > 0.0 {
                *p = (p.0 * sx, p.1 * sy);
            }
        }
        Self { points }
    }
}

fn visible(point: (f64, f64)) -> Option<(f64, f64)> {
    if point.0 > 0.0 {
        Some(point)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frontal_landmarks() -> FaceLandmarks {
        FaceLandmarks::new([
            (440.0, 350.0), // left_eye
            (560.0, 350.0), // right_eye
            (500.0, 420.0), // nose
            (460.0, 470.0), // left_mouth
            (540.0, 470.0), // right_mouth
        ])
    }

    #[test]
    fn test_frontal_eyes_visible_and_level() {
        let lm = frontal_landmarks();
        assert!(lm.eyes_visible());
        assert_relative_eq!(lm.eye_vertical_offset().unwrap(), 0.0);
    }

    #[test]
    fn test_tilted_eye_offset() {
        let lm = FaceLandmarks::from_eyes((100.0, 200.0), (160.0, 230.0));
        assert_relative_eq!(lm.eye_vertical_offset().unwrap(), 30.0);
        assert!(lm.nose().is_none());
    }

    #[test]
    fn test_hidden_eye_reports_not_visible() {
        let mut pts = *frontal_landmarks().points();
        pts[RIGHT_EYE] = (0.0, 0.0);
        let lm = FaceLandmarks::new(pts);
        assert!(!lm.eyes_visible());
        assert!(lm.eye_vertical_offset().is_none());
    }

    #[test]
    fn test_scaled_skips_invisible_points() {
        let lm = FaceLandmarks::from_eyes((10.0, 20.0), (30.0, 20.0));
        let t = lm.scaled(2.0, 0.5);
        assert_eq!(t.left_eye(), Some((20.0, 10.0)));
        assert_eq!(t.right_eye(), Some((60.0, 10.0)));
        assert!(t.nose().is_none());
    }
}
