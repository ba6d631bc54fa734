use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::FrameSample;

struct Pushed {
    result: DetectionResult,
    at: Instant,
}

type Slot = Arc<Mutex<Option<Pushed>>>;

/// Pull-side bridge for callback-driven detectors.
///
/// A push backend hands results to a [`DetectionPublisher`] from whatever
/// thread it runs on; `detect()` replays the most recent one. Only the
/// latest push is kept. Results older than `max_age` count as no face, and
/// results computed on a differently sized frame are rescaled to the
/// frame being asked about.
pub struct StreamingDetector {
    slot: Slot,
    max_age: Option<Duration>,
}

/// Push handle for [`StreamingDetector`]. Cheap to clone.
#[derive(Clone)]
pub struct DetectionPublisher {
    slot: Slot,
}

impl StreamingDetector {
    pub fn new(max_age: Option<Duration>) -> (Self, DetectionPublisher) {
        let slot: Slot = Arc::new(Mutex::new(None));
        (
            Self {
                slot: slot.clone(),
                max_age,
            },
            DetectionPublisher { slot },
        )
    }
}

impl DetectionPublisher {
    pub fn publish(&self, result: DetectionResult) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Pushed {
            result,
            at: Instant::now(),
        });
    }

    /// Drops the cached result, e.g. after the video source changed.
    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl FaceDetector for StreamingDetector {
    fn detect(
        &mut self,
        frame: &FrameSample,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let (fw, fh) = (frame.width(), frame.height());
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(pushed) = guard.as_ref() else {
            return Ok(DetectionResult::none(fw, fh));
        };
        if self.max_age.is_some_and(|age| pushed.at.elapsed() > age) {
            return Ok(DetectionResult::none(fw, fh));
        }

        let cached = &pushed.result;
        if (cached.frame_width, cached.frame_height) == (fw, fh)
            || cached.frame_width == 0
            || cached.frame_height == 0
        {
            return Ok(DetectionResult {
                frame_width: fw,
                frame_height: fh,
                ..cached.clone()
            });
        }

        let sx = fw as f64 / cached.frame_width as f64;
        let sy = fh as f64 / cached.frame_height as f64;
        Ok(DetectionResult {
            face: cached.face.as_ref().map(|f| f.scaled(sx, sy)),
            frame_width: fw,
            frame_height: fh,
            source: cached.source,
        })
    }
}
