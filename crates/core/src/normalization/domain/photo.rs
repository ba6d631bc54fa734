use std::io::Cursor;

use crate::shared::frame::FrameSample;

use super::normalizer_config::NormalizeError;

/// Encoded still taken from the live source at shutter time.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedPhoto {
    bytes: Vec<u8>,
}

impl CapturedPhoto {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Losslessly encodes a frame (PNG) so normalization starts from the
    /// exact captured pixels.
    pub fn from_frame(frame: &FrameSample) -> Result<Self, NormalizeError> {
        let image = frame.to_rgb_image().ok_or(NormalizeError::EmptyImage)?;
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(NormalizeError::Encode)?;
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Which normalization stages actually ran.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizationReport {
    pub decoded: bool,
    /// A real detection was found on the still.
    pub face_found: bool,
    pub background_flattened: bool,
    /// Placed around the face rather than fitted to the canvas.
    pub face_placed: bool,
    pub resized_to_profile: bool,
    pub encoded: bool,
    /// Face height on the final canvas, when placed around a face.
    pub head_height_px: Option<u32>,
    /// Whether `head_height_px` is inside the profile's head-size range.
    pub head_size_ok: Option<bool>,
}

/// Final, profile-sized photo ready for export.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub report: NormalizationReport,
}

impl FinalPhoto {
    /// The captured buffer, unchanged.
    pub fn passthrough(photo: &CapturedPhoto, report: NormalizationReport) -> Self {
        let (width, height) = image::load_from_memory(photo.bytes())
            .map(|img| (img.width(), img.height()))
            .unwrap_or((0, 0));
        Self {
            bytes: photo.bytes().to_vec(),
            width,
            height,
            report,
        }
    }
}
