use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use thiserror::Error;

use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::detector_adapter::DetectorAdapter;
use crate::shared::constants::{DEFAULT_SAMPLE_INTERVAL, MAX_SAMPLE_INTERVAL, MIN_SAMPLE_INTERVAL};
use crate::shared::frame::FrameSample;
use crate::validation::domain::brightness::measure_brightness;
use crate::video::domain::frame_source::{FrameSource, SourceError};

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("sample interval must be between {min:?} and {max:?}, got {interval:?}")]
    IntervalOutOfRange {
        interval: Duration,
        min: Duration,
        max: Duration,
    },
    #[error("failed to spawn sampler thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    pub interval: Duration,
}

impl SamplerConfig {
    pub fn new(interval: Duration) -> Result<Self, SamplerError> {
        if !(MIN_SAMPLE_INTERVAL..=MAX_SAMPLE_INTERVAL).contains(&interval) {
            return Err(SamplerError::IntervalOutOfRange {
                interval,
                min: MIN_SAMPLE_INTERVAL,
                max: MAX_SAMPLE_INTERVAL,
            });
        }
        Ok(Self { interval })
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// What one completed tick produced.
#[derive(Clone, Debug)]
pub struct SampleOutcome {
    pub generation: u64,
    pub frame_index: usize,
    pub detection: DetectionResult,
    pub brightness: Option<f64>,
}

/// Receives outcomes on the detection worker thread, current generation only.
pub type SampleSink = Box<dyn FnMut(SampleOutcome) + Send>;

type SharedSource = Arc<Mutex<Box<dyn FrameSource>>>;

struct Job {
    frame: FrameSample,
    generation: u64,
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Periodically samples a [`FrameSource`] and runs detection on it.
///
/// Layout: `ticker → (zero-capacity channel) → detection worker → sink`
///
/// The ticker only hands a frame over when the worker is idle, so at most
/// one detection is outstanding and busy ticks are skipped. Every frame
/// carries the generation current when it was grabbed; `reset`,
/// `switch_source` and `stop` move to a new generation and results from
/// older ones are dropped instead of reaching the sink. Delivery happens
/// under the generation lock, so once one of those calls returns no stale
/// result can be delivered anymore.
pub struct FrameSampler {
    source: SharedSource,
    generation: Arc<Mutex<u64>>,
    stop_tx: Option<Sender<()>>,
    ticker: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
}

impl FrameSampler {
    pub fn start(
        source: Box<dyn FrameSource>,
        adapter: Arc<Mutex<DetectorAdapter>>,
        config: SamplerConfig,
        sink: SampleSink,
    ) -> Result<Self, SamplerError> {
        let source: SharedSource = Arc::new(Mutex::new(source));
        let generation = Arc::new(Mutex::new(0u64));
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(0);

        let worker = spawn_worker(job_rx, adapter, generation.clone(), sink)?;
        let ticker = spawn_ticker(
            source.clone(),
            generation.clone(),
            config.interval,
            job_tx,
            stop_rx,
        )?;

        log::info!("Frame sampler started (interval {:?})", config.interval);
        Ok(Self {
            source,
            generation,
            stop_tx: Some(stop_tx),
            ticker: Some(ticker),
            worker: Some(worker),
        })
    }

    pub fn generation(&self) -> u64 {
        *lock(&self.generation)
    }

    /// Invalidates in-flight results (retake).
    pub fn reset(&self) -> u64 {
        let mut generation = lock(&self.generation);
        *generation += 1;
        log::debug!("Sampler reset to generation {}", *generation);
        *generation
    }

    /// Replaces the video source, e.g. when switching cameras.
    pub fn switch_source(&self, source: Box<dyn FrameSource>) -> u64 {
        let mut current = lock(&self.source);
        *current = source;
        let generation = self.reset();
        drop(current);
        log::info!("Switched video source (generation {generation})");
        generation
    }

    /// Grabs a frame from the current source outside the sampling loop.
    pub fn grab_frame(&self) -> Result<FrameSample, SourceError> {
        let mut source = lock(&self.source);
        if !source.is_ready() {
            return Err(SourceError::NotReady);
        }
        source.grab()
    }

    /// Stops ticking and waits for both threads to exit. Idempotent.
    pub fn stop(&mut self) {
        if self.stop_tx.is_none() {
            return;
        }
        self.reset();
        drop(self.stop_tx.take());
        if let Some(handle) = self.ticker.take() {
            if handle.join().is_err() {
                log::error!("Sampler ticker thread panicked");
            }
        }
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Sampler detection thread panicked");
            }
        }
        log::info!("Frame sampler stopped");
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_ticker(
    source: SharedSource,
    generation: Arc<Mutex<u64>>,
    interval: Duration,
    job_tx: Sender<Job>,
    stop_rx: Receiver<()>,
) -> Result<JoinHandle<()>, SamplerError> {
    thread::Builder::new()
        .name("frame-sampler".into())
        .spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            // Tagged under the source lock so a frame from a replaced
            // source never carries the new generation.
            let job = {
                let mut source = lock(&source);
                if !source.is_ready() {
                    log::debug!("Source not ready, skipping tick");
                    continue;
                }
                match source.grab() {
                    Ok(frame) => Job {
                        generation: *lock(&generation),
                        frame,
                    },
                    Err(e) => {
                        log::warn!("Failed to grab frame: {e}");
                        continue;
                    }
                }
            };
            match job_tx.try_send(job) {
                Ok(()) => {}
                Err(TrySendError::Full(job)) => {
                    log::debug!("Detection busy, skipping frame {}", job.frame.index());
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        })
        .map_err(SamplerError::Spawn)
}

fn spawn_worker(
    job_rx: Receiver<Job>,
    adapter: Arc<Mutex<DetectorAdapter>>,
    generation: Arc<Mutex<u64>>,
    mut sink: SampleSink,
) -> Result<JoinHandle<()>, SamplerError> {
    thread::Builder::new()
        .name("face-detection".into())
        .spawn(move || {
            for job in job_rx {
                let brightness = measure_brightness(&job.frame);
                let detection = lock(&adapter).detect(&job.frame);

                let current = lock(&generation);
                if *current != job.generation {
                    log::debug!(
                        "Discarding stale result for frame {} (generation {} < {})",
                        job.frame.index(),
                        job.generation,
                        *current
                    );
                    continue;
                }
                sink(SampleOutcome {
                    generation: job.generation,
                    frame_index: job.frame.index(),
                    detection,
                    brightness,
                });
            }
        })
        .map_err(SamplerError::Spawn)
}
