use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::FrameSample;

/// Builds the real detector. Runs on a background thread, possibly more
/// than once if earlier attempts failed.
pub type DetectorLoader =
    Arc<dyn Fn() -> Result<Box<dyn FaceDetector>, String> + Send + Sync>;

/// Coarse initialization state, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

enum State {
    Uninitialized,
    Loading,
    Ready(Box<dyn FaceDetector>),
    Failed { at: Instant, error: String },
}

struct Shared {
    state: Mutex<State>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wraps a detector whose construction is slow (model download, session
/// setup) so the first frames do not block on it.
///
/// The first `detect()` (or an explicit [`start`](Self::start)) kicks off
/// loading on a background thread. Until the detector is ready every frame
/// gets an [`Unavailable`](crate::detection::domain::detection_result::DetectionSource::Unavailable)
/// result. A failed load is retried on a later frame once `retry_interval`
/// has passed. At most one load attempt runs at a time.
pub struct LazyDetector {
    shared: Arc<Shared>,
    loader: DetectorLoader,
    retry_interval: Duration,
}

impl LazyDetector {
    pub fn new(loader: DetectorLoader, retry_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Uninitialized),
                changed: Condvar::new(),
            }),
            loader,
            retry_interval,
        }
    }

    /// Begins loading now instead of on the first frame.
    pub fn start(&self) {
        let mut state = self.shared.lock();
        if matches!(*state, State::Uninitialized) {
            self.begin_load(&mut state);
        }
    }

    pub fn status(&self) -> LoadStatus {
        match *self.shared.lock() {
            State::Uninitialized => LoadStatus::Uninitialized,
            State::Loading => LoadStatus::Loading,
            State::Ready(_) => LoadStatus::Ready,
            State::Failed { .. } => LoadStatus::Failed,
        }
    }

    /// Blocks until the current load attempt settles or `timeout` elapses.
    /// Returns whether the detector is ready.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        self.start();
        let guard = self.shared.lock();
        let (guard, _) = self
            .shared
            .changed
            .wait_timeout_while(guard, timeout, |s| matches!(s, State::Loading))
            .unwrap_or_else(PoisonError::into_inner);
        matches!(*guard, State::Ready(_))
    }

    fn begin_load(&self, state: &mut State) {
        *state = State::Loading;
        let shared = self.shared.clone();
        let loader = self.loader.clone();
        thread::spawn(move || {
            let outcome = loader();
            let mut state = shared.lock();
            *state = match outcome {
                Ok(detector) => {
                    log::info!("Face detector ready");
                    State::Ready(detector)
                }
                Err(error) => {
                    log::warn!("Face detector failed to load: {error}");
                    State::Failed {
                        at: Instant::now(),
                        error,
                    }
                }
            };
            shared.changed.notify_all();
        });
    }
}

impl FaceDetector for LazyDetector {
    fn detect(
        &mut self,
        frame: &FrameSample,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let mut state = self.shared.lock();
        match &mut *state {
            State::Ready(detector) => return detector.detect(frame),
            State::Uninitialized => self.begin_load(&mut state),
            State::Loading => {}
            State::Failed { at, error } => {
                if at.elapsed() >= self.retry_interval {
                    log::info!("Retrying face detector load (last error: {error})");
                    self.begin_load(&mut state);
                }
            }
        }
        Ok(DetectionResult::unavailable(frame.width(), frame.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::DetectionSource;
    use crate::detection::infrastructure::fallback_detector::FallbackDetector;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    fn frame() -> FrameSample {
        FrameSample::new(vec![0u8; 40 * 30 * 3], 40, 30, 3, 0)
    }

    fn counting_loader(attempts: Arc<AtomicUsize>, succeed: bool) -> DetectorLoader {
        Arc::new(move || {
            attempts.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            if succeed {
                Ok(Box::new(FallbackDetector::new()) as Box<dyn FaceDetector>)
            } else {
                Err("model not found".into())
            }
        })
    }

    #[test]
    fn test_unavailable_until_loaded_then_delegates() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut detector =
            LazyDetector::new(counting_loader(attempts.clone(), true), Duration::ZERO);
        assert_eq!(detector.status(), LoadStatus::Uninitialized);

        let first = detector.detect(&frame()).unwrap();
        assert_eq!(first.source, DetectionSource::Unavailable);
        assert!(!first.has_face());

        assert!(detector.wait_until_ready(WAIT));
        let ready = detector.detect(&frame()).unwrap();
        assert_eq!(ready.source, DetectionSource::Fallback);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_only_one_load_in_flight() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut detector =
            LazyDetector::new(counting_loader(attempts.clone(), true), Duration::ZERO);
        for _ in 0..5 {
            detector.detect(&frame()).unwrap();
        }
        assert!(detector.wait_until_ready(WAIT));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_waiters_share_one_load() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let detector = LazyDetector::new(counting_loader(attempts.clone(), true), Duration::ZERO);

        let ready: Vec<bool> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| detector.wait_until_ready(WAIT)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ready.iter().all(|&r| r));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(detector.status(), LoadStatus::Ready);
    }

    #[test]
    fn test_failure_waits_for_retry_interval() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut detector = LazyDetector::new(
            counting_loader(attempts.clone(), false),
            Duration::from_secs(3600),
        );
        assert!(!detector.wait_until_ready(WAIT));
        assert_eq!(detector.status(), LoadStatus::Failed);

        let result = detector.detect(&frame()).unwrap();
        assert_eq!(result.source, DetectionSource::Unavailable);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_retried_after_interval() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut detector =
            LazyDetector::new(counting_loader(attempts.clone(), false), Duration::ZERO);
        assert!(!detector.wait_until_ready(WAIT));

        detector.detect(&frame()).unwrap();
        assert!(!detector.wait_until_ready(WAIT));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
