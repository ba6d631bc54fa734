use ndarray::ArrayView3;
use thiserror::Error;

/// Why a frame's bytes cannot be read as `height × width × channels` RGB.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameLayoutError {
    #[error("expected an RGB frame, got {0} channel(s)")]
    NotRgb(u8),
    #[error("frame holds {actual} bytes, {expected} expected for its dimensions")]
    Length { expected: usize, actual: usize },
}

/// One decoded video frame: contiguous RGB bytes in row-major order.
///
/// Produced once per sampling tick and dropped after classification.
/// `index` increases monotonically per source so stale frames can be told
/// apart in logs.
#[derive(Clone, Debug)]
pub struct FrameSample {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl FrameSample {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Wraps an RGB image as a frame sample.
    pub fn from_rgb_image(image: image::RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    /// Copies the pixel data back into an RGB image.
    ///
    /// Returns `None` for non-RGB frames.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if self.channels != 3 {
            return None;
        }
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// True when the frame has no decoded pixels yet (zero width or height).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `height × width × channels` view for model preprocessing.
    ///
    /// Fails for frames with fewer than 3 channels or whose data length does
    /// not match the dimensions (the constructor only checks that in debug
    /// builds).
    pub fn rgb_view(&self) -> Result<ArrayView3<'_, u8>, FrameLayoutError> {
        if self.channels < 3 {
            return Err(FrameLayoutError::NotRgb(self.channels));
        }
        let (h, w, c) = self.shape();
        let expected = h * w * c;
        if self.data.len() != expected {
            return Err(FrameLayoutError::Length {
                expected,
                actual: self.data.len(),
            });
        }
        ArrayView3::from_shape(self.shape(), &self.data).map_err(|_| FrameLayoutError::Length {
            expected,
            actual: self.data.len(),
        })
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = FrameSample::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_zero_sized_frame_is_empty() {
        let frame = FrameSample::new(Vec::new(), 0, 0, 3, 0);
        assert!(frame.is_empty());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        FrameSample::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_rgb_image_conversion_keeps_pixels() {
        let mut img = image::RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([10, 20, 30]));
        let frame = FrameSample::from_rgb_image(img, 7);

        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 7);
        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(2, 1).0, [10, 20, 30]);
    }

    #[test]
    fn test_to_rgb_image_rejects_gray_frames() {
        let frame = FrameSample::new(vec![0u8; 4], 2, 2, 1, 0);
        assert!(frame.to_rgb_image().is_none());
    }

    #[test]
    fn test_rgb_view_rejects_gray_frames() {
        let frame = FrameSample::new(vec![0u8; 16], 4, 4, 1, 0);
        assert_eq!(frame.rgb_view().err(), Some(FrameLayoutError::NotRgb(1)));
    }

    #[test]
    fn test_rgb_view_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = FrameSample::new(data, 2, 2, 3, 0);
        let arr = frame.rgb_view().unwrap();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }
}
