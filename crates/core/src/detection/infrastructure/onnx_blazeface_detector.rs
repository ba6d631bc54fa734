/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// A lightweight detector for live preview: one box per face plus the eye
/// and nose keypoints, which is enough for the head-tilt check.
use std::path::Path;

use crate::detection::domain::detection_result::{DetectionResult, FaceRegion};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::{FrameLayoutError, FrameSample};

use super::math::{nms, sigmoid, RawDetection};
use super::onnx_session::open_session;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Regressor values per anchor: 4 box values + 6 keypoints × (x, y).
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;
        log::info!("Loaded BlazeFace model {}", model_path.display());
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(
        &mut self,
        frame: &FrameSample,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let fw = frame.width();
        let fh = frame.height();

        let input_tensor = preprocess(frame, INPUT_SIZE)?;
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut raw_dets =
            decode(reg_data, score_data, &self.anchors, self.confidence, (fw, fh));
        let faces = nms(&mut raw_dets, NMS_IOU_THRESH)
            .into_iter()
            .map(|d| {
                let bbox = BoundingBox::from_corners(d.x1, d.y1, d.x2, d.y2);
                let mut face = FaceRegion::new(bbox).with_confidence(d.score as f32);
                if let Some(pts) = d.keypoints {
                    face = face.with_landmarks(FaceLandmarks::new(pts));
                }
                face
            })
            .collect();

        Ok(DetectionResult::best_of(faces, fw, fh))
    }
}

/// Decodes anchor-relative boxes and keypoints above `confidence` into
/// frame coordinates.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f64,
    (fw, fh): (u32, u32),
) -> Vec<RawDetection> {
    let (fw, fh) = (fw as f32, fh as f32);
    let size = INPUT_SIZE as f32;
    let mut raw_dets = Vec::new();

    for (i, &raw_score) in score_data.iter().enumerate().take(anchors.len()) {
        let score = sigmoid(raw_score);
        if (score as f64) < confidence {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        if offset + REGRESSOR_STRIDE > reg_data.len() {
            break;
        }
        let reg = &reg_data[offset..offset + REGRESSOR_STRIDE];
        let anchor = anchors[i];

        let cx = anchor[0] + reg[0] / size;
        let cy = anchor[1] + reg[1] / size;
        let w = reg[2] / size;
        let h = reg[3] / size;

        let x1 = ((cx - w / 2.0) * fw).max(0.0);
        let y1 = ((cy - h / 2.0) * fh).max(0.0);
        let x2 = ((cx + w / 2.0) * fw).min(fw);
        let y2 = ((cy + h / 2.0) * fh).min(fh);

        // Keypoint order: eye, eye, nose, mouth, ear, ear. Mouth corners are
        // not split, so the last two landmark slots stay invisible.
        let kp = |k: usize| {
            let x = (anchor[0] + reg[4 + 2 * k] / size) * fw;
            let y = (anchor[1] + reg[5 + 2 * k] / size) * fh;
            (x as f64, y as f64)
        };
        let keypoints = [kp(0), kp(1), kp(2), (0.0, 0.0), (0.0, 0.0)];

        raw_dets.push(RawDetection {
            x1: x1 as f64,
            y1: y1 as f64,
            x2: x2 as f64,
            y2: y2 as f64,
            score: score as f64,
            keypoints: Some(keypoints),
        });
    }

    raw_dets
}

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &FrameSample, size: u32) -> Result<ndarray::Array4<f32>, FrameLayoutError> {
    let src = frame.rgb_view()?;
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }
    Ok(tensor)
}

/// Short-range anchors: 16×16 grid with 2 anchors per cell, then 8×8 with 6.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)];
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }
    anchors
}
