use std::path::Path;

use crate::shared::frame::FrameSample;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// A still image presented as a live source that always shows the same
/// frame.
pub struct ImageFileSource {
    image: image::RgbImage,
    next_index: usize,
    playing: bool,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let image = image::open(path)
            .map_err(|source| SourceError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        log::debug!(
            "Opened {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: image::RgbImage) -> Self {
        Self {
            image,
            next_index: 0,
            playing: true,
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

impl FrameSource for ImageFileSource {
    fn is_ready(&self) -> bool {
        let (w, h) = self.dimensions();
        self.playing && w > 0 && h > 0
    }

    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn grab(&mut self) -> Result<FrameSample, SourceError> {
        if !self.is_ready() {
            return Err(SourceError::NotReady);
        }
        let frame = FrameSample::from_rgb_image(self.image.clone(), self.next_index);
        self.next_index += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("still.png");
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([50, 100, 200]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_reports_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let source = ImageFileSource::open(&write_test_image(dir.path(), 100, 80)).unwrap();
        assert_eq!(source.dimensions(), (100, 80));
        assert!(source.is_ready());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        assert!(ImageFileSource::open(Path::new("/nonexistent/still.png")).is_err());
    }

    #[test]
    fn test_grab_repeats_frame_with_increasing_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageFileSource::open(&write_test_image(dir.path(), 10, 10)).unwrap();

        let a = source.grab().unwrap();
        let b = source.grab().unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(a.data(), b.data());
        assert_eq!(&a.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_paused_source_is_not_ready() {
        let mut source = ImageFileSource::from_image(image::RgbImage::new(4, 4));
        source.set_playing(false);
        assert!(!source.is_ready());
        assert!(matches!(source.grab(), Err(SourceError::NotReady)));
    }

    #[test]
    fn test_zero_sized_image_is_not_ready() {
        let source = ImageFileSource::from_image(image::RgbImage::new(0, 0));
        assert!(!source.is_ready());
    }
}
