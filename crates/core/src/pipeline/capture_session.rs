use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::detection::domain::detection_result::DetectionSource;
use crate::detection::domain::detector_adapter::DetectorAdapter;
use crate::normalization::domain::normalizer_config::{NormalizeError, NormalizerConfig};
use crate::normalization::domain::photo::{CapturedPhoto, FinalPhoto};
use crate::pipeline::frame_sampler::{
    FrameSampler, SampleOutcome, SampleSink, SamplerConfig, SamplerError,
};
use crate::pipeline::normalize_photo_use_case::NormalizePhotoUseCase;
use crate::profile::domain::country_profile::CountryProfile;
use crate::validation::domain::capture_gate::can_capture;
use crate::validation::domain::classifier::{classify, ClassifierThresholds};
use crate::validation::domain::guidance::{guidance, Guidance};
use crate::validation::domain::verdict::ValidationVerdict;
use crate::video::domain::frame_source::{FrameSource, SourceError};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("face is not in position yet")]
    NotAllowed,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Encode(#[from] NormalizeError),
}

#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    pub sampler: SamplerConfig,
    pub thresholds: ClassifierThresholds,
    pub normalizer: NormalizerConfig,
}

/// Called on the detection thread with the frame index and new verdict.
pub type VerdictListener = Box<dyn FnMut(usize, &ValidationVerdict) + Send>;

#[derive(Default)]
struct SessionState {
    verdict: Option<ValidationVerdict>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One capture session: live validation of a video source plus capture
/// and normalization of the still.
///
/// The session owns its detector; the sampler's worker and the normalizer
/// share it.
pub struct CaptureSession {
    sampler: FrameSampler,
    state: Arc<Mutex<SessionState>>,
    thresholds: ClassifierThresholds,
    normalizer: NormalizePhotoUseCase,
}

impl CaptureSession {
    pub fn start(
        source: Box<dyn FrameSource>,
        adapter: DetectorAdapter,
        config: SessionConfig,
        listener: Option<VerdictListener>,
    ) -> Result<Self, SamplerError> {
        log::info!("Starting capture session with '{}' detector", adapter.name());
        let adapter = Arc::new(Mutex::new(adapter));
        let state = Arc::new(Mutex::new(SessionState::default()));

        let sink = verdict_sink(state.clone(), config.thresholds.clone(), listener);
        let sampler = FrameSampler::start(source, adapter.clone(), config.sampler, sink)?;

        Ok(Self {
            sampler,
            state,
            thresholds: config.thresholds,
            normalizer: NormalizePhotoUseCase::new(adapter, config.normalizer),
        })
    }

    pub fn latest_verdict(&self) -> Option<ValidationVerdict> {
        lock(&self.state).verdict.clone()
    }

    pub fn can_capture(&self) -> bool {
        self.latest_verdict().as_ref().is_some_and(can_capture)
    }

    /// Hint for the current verdict; "no face" until the first tick lands.
    pub fn guidance(&self) -> Guidance {
        let verdict = self
            .latest_verdict()
            .unwrap_or_else(|| ValidationVerdict::no_face(true, DetectionSource::Unavailable));
        guidance(&verdict, &self.thresholds)
    }

    /// Takes the still if the gate is open.
    pub fn capture(&self) -> Result<CapturedPhoto, CaptureError> {
        if !self.can_capture() {
            return Err(CaptureError::NotAllowed);
        }
        let frame = self.sampler.grab_frame()?;
        log::info!("Captured frame {}", frame.index());
        Ok(CapturedPhoto::from_frame(&frame)?)
    }

    pub fn normalize(&self, photo: &CapturedPhoto, profile: &CountryProfile) -> FinalPhoto {
        self.normalizer.execute(photo, profile)
    }

    /// Retake: forgets the verdict and drops in-flight results.
    pub fn reset(&self) {
        self.sampler.reset();
        lock(&self.state).verdict = None;
    }

    /// Switches to another video source (e.g. front/back camera).
    pub fn switch_source(&self, source: Box<dyn FrameSource>) {
        self.sampler.switch_source(source);
        lock(&self.state).verdict = None;
    }

    pub fn stop(&mut self) {
        self.sampler.stop();
    }
}

fn verdict_sink(
    state: Arc<Mutex<SessionState>>,
    thresholds: ClassifierThresholds,
    mut listener: Option<VerdictListener>,
) -> SampleSink {
    Box::new(move |outcome: SampleOutcome| {
        let mut state = lock(&state);
        let verdict = classify(
            &outcome.detection,
            outcome.brightness,
            state.verdict.as_ref(),
            &thresholds,
        );
        log::debug!(
            "Frame {}: face={} in_position={} lighting={} ({})",
            outcome.frame_index,
            verdict.face_detected,
            verdict.in_position,
            verdict.lighting_ok,
            verdict.source
        );
        if let Some(listener) = listener.as_mut() {
            listener(outcome.frame_index, &verdict);
        }
        state.verdict = Some(verdict);
    })
}
