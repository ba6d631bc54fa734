//! Shared post-processing for the ONNX detection backends.

/// One raw model detection in frame coordinates, before suppression.
#[derive(Clone, Debug)]
pub(crate) struct RawDetection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
    /// Five `(x, y)` landmark points; invisible points stay at the origin.
    pub keypoints: Option<[(f64, f64); 5]>,
}

impl RawDetection {
    fn corners(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub(crate) fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy NMS: sort by score descending, suppress overlapping boxes.
pub(crate) fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        let suppressed = keep
            .iter()
            .any(|k| bbox_iou(&k.corners(), &det.corners()) > iou_thresh);
        if !suppressed {
            keep.push(det.clone());
        }
    }
    keep
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            score,
            keypoints: None,
        }
    }

    #[test]
    fn test_bbox_iou_identical() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&a, &a), 1.0);
    }

    #[test]
    fn test_bbox_iou_disjoint() {
        assert_relative_eq!(
            bbox_iou(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 30.0, 30.0]),
            0.0
        );
    }

    #[test]
    fn test_nms_suppresses_overlap_and_keeps_best() {
        let mut dets = vec![
            det(5.0, 5.0, 105.0, 105.0, 0.7),
            det(0.0, 0.0, 100.0, 100.0, 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_separate_boxes() {
        let mut dets = vec![
            det(0.0, 0.0, 50.0, 50.0, 0.9),
            det(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(-10.0) < 0.001);
        assert!((sigmoid(10.0) - 1.0).abs() < 0.001);
    }
}
