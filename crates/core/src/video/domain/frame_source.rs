use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::FrameSample;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no image frames found in {0}")]
    Empty(PathBuf),
    #[error("source is not ready")]
    NotReady,
}

/// Live video boundary: something that can hand out the current frame.
///
/// `is_ready` is true only while the source is playing and has non-zero
/// dimensions; the sampler never grabs from a source that is not ready.
pub trait FrameSource: Send {
    fn is_ready(&self) -> bool;

    /// Current frame size, `(0, 0)` before the first frame is available.
    fn dimensions(&self) -> (u32, u32);

    /// Returns the current frame. Frame indices increase monotonically.
    fn grab(&mut self) -> Result<FrameSample, SourceError>;
}
