/// YOLO-pose face detector using ONNX Runtime via `ort`.
///
/// Letterbox preprocessing, inference, NMS, then the single most confident
/// face with its five landmarks.
use std::path::Path;

use crate::detection::domain::detection_result::{DetectionResult, FaceRegion};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::{FrameLayoutError, FrameSample};

use super::math::{nms, RawDetection};
use super::onnx_session::open_session;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.25;

const NMS_IOU_THRESH: f64 = 0.45;

/// 5 landmarks × (x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (NCHW),
    /// falling back to 640 if the shape is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded YOLO face model {} (input {input_size}px)",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &FrameSample,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let fw = frame.width();
        let fh = frame.height();

        let (input_tensor, transform) = letterbox(frame, self.input_size)?;

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }

        // [1, features, detections] when transposed, else [1, detections, features]
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut raw_dets = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(det) = parse_row(&row, self.confidence, &transform) {
                raw_dets.push(det);
            }
        }

        let faces = nms(&mut raw_dets, NMS_IOU_THRESH)
            .into_iter()
            .map(|d| {
                let bbox = BoundingBox::from_corners(d.x1, d.y1, d.x2, d.y2).clamp_to(fw, fh);
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

/// Maps letterbox coordinates back to the source frame.
#[derive(Clone, Copy, Debug)]
struct LetterboxTransform {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl LetterboxTransform {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Row format: `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
fn parse_row(row: &[f32], confidence: f64, t: &LetterboxTransform) -> Option<RawDetection> {
    if row.len() < 5 {
        return None;
    }
    let conf = row[4] as f64;
    if conf < confidence {
        return None;
    }

    let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
    let (x1, y1) = t.to_frame(cx - w / 2.0, cy - h / 2.0);
    let (x2, y2) = t.to_frame(cx + w / 2.0, cy + h / 2.0);

    let keypoints = (row.len() >= 5 + NUM_KEYPOINT_VALUES).then(|| {
        let mut pts = [(0.0f64, 0.0f64); 5];
        for (k, pt) in pts.iter_mut().enumerate() {
            let base = 5 + k * 3;
            if row[base + 2] as f64 >= KEYPOINT_CONF_THRESH {
                *pt = t.to_frame(row[base] as f64, row[base + 1] as f64);
            }
        }
        pts
    });

    Some(RawDetection {
        x1,
        y1,
        x2,
        y2,
        score: conf,
        keypoints,
    })
}

/// Letterbox-resize a frame to `target_size` × `target_size`, NCHW float32.
fn letterbox(
    frame: &FrameSample,
    target_size: u32,
) -> Result<(ndarray::Array4<f32>, LetterboxTransform), FrameLayoutError> {
    let src = frame.rgb_view()?;
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, the YOLO convention.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Ok((
        tensor,
        LetterboxTransform {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    ))
}
