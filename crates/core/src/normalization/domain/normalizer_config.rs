use thiserror::Error;

use crate::shared::constants::{
    BACKGROUND_BOX_PADDING, BACKGROUND_DELTA_MAX, BACKGROUND_LUMA_MIN, BACKGROUND_TOP_FACTOR,
    FACE_CENTER_Y, HEAD_HEIGHT_FRACTION, JPEG_QUALITY,
};

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("failed to decode captured photo: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode final photo: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image is empty")]
    EmptyImage,
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("face box does not overlap the image")]
    FaceOutsideImage,
}

/// Tuning for the post-capture normalizer.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizerConfig {
    /// Placed face height as a fraction of canvas height.
    pub head_height_fraction: f64,
    /// Vertical face-center position as a fraction of canvas height.
    pub face_center_y: f64,
    pub jpeg_quality: u8,
    /// Channel mean above which a low-saturation pixel counts as background.
    pub background_luma_threshold: f64,
    /// Max pairwise channel difference for a background pixel.
    pub background_delta_threshold: u8,
    pub background_padding: f64,
    pub background_top_factor: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            head_height_fraction: HEAD_HEIGHT_FRACTION,
            face_center_y: FACE_CENTER_Y,
            jpeg_quality: JPEG_QUALITY,
            background_luma_threshold: BACKGROUND_LUMA_MIN,
            background_delta_threshold: BACKGROUND_DELTA_MAX,
            background_padding: BACKGROUND_BOX_PADDING,
            background_top_factor: BACKGROUND_TOP_FACTOR,
        }
    }
}
