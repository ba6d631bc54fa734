use std::time::Duration;

pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const BLAZEFACE_MODEL_NAME: &str = "blazeface_short_range.onnx";

/// Time between sampling ticks.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(400);
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(300);
pub const MAX_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Minimum wait before a failed detector initialization is attempted again.
pub const DETECTOR_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Normalized face window: both center coordinates must fall inside it.
pub const CENTER_MIN: f64 = 0.4;
pub const CENTER_MAX: f64 = 0.6;

/// Face bounding-box area as a fraction of frame area.
pub const FACE_SIZE_MIN: f64 = 0.15;
pub const FACE_SIZE_MAX: f64 = 0.40;

/// Max vertical eye offset, as a fraction of frame height.
pub const HEAD_TILT_MAX: f64 = 0.05;

/// Mean luma bounds (exclusive) on a 0-255 scale.
pub const BRIGHTNESS_MIN: f64 = 100.0;
pub const BRIGHTNESS_MAX: f64 = 200.0;

/// Brightness is measured on at most this many samples per axis.
pub const BRIGHTNESS_GRID: u32 = 64;

/// Pixels brighter than this (channel mean) with low saturation are background.
pub const BACKGROUND_LUMA_MIN: f64 = 240.0;
pub const BACKGROUND_DELTA_MAX: u8 = 15;

/// Face-box padding for background flattening, relative to the larger side.
pub const BACKGROUND_BOX_PADDING: f64 = 0.5;
/// Extra padding factor above the face box to keep hair.
pub const BACKGROUND_TOP_FACTOR: f64 = 1.2;

/// Placed face height as a fraction of the canvas height.
pub const HEAD_HEIGHT_FRACTION: f64 = 0.70;
/// Vertical position of the face center as a fraction of canvas height.
pub const FACE_CENTER_Y: f64 = 0.40;

pub const JPEG_QUALITY: u8 = 95;

pub const EXPORT_FILE_PREFIX: &str = "passport_photo_";
pub const EXPORT_EXTENSION: &str = "jpg";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
