use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::FrameSample;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Replays a directory of image files as a live source, in file-name order.
///
/// Each `grab()` decodes the next file. Once the last file has been shown
/// the source either wraps around (`looping`) or stops being ready, like a
/// video that reached its end.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    next_index: usize,
    dimensions: (u32, u32),
    looping: bool,
    playing: bool,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, looping: bool) -> Result<Self, SourceError> {
        let paths = list_images(dir)?;
        let first = paths
            .first()
            .ok_or_else(|| SourceError::Empty(dir.to_path_buf()))?;
        let dimensions = image::image_dimensions(first).map_err(|source| SourceError::Decode {
            path: first.clone(),
            source,
        })?;
        log::info!(
            "Replaying {} frames from {} ({}x{})",
            paths.len(),
            dir.display(),
            dimensions.0,
            dimensions.1
        );
        Ok(Self {
            paths,
            cursor: 0,
            next_index: 0,
            dimensions,
            looping,
            playing: true,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    fn exhausted(&self) -> bool {
        !self.looping && self.cursor >= self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn is_ready(&self) -> bool {
        self.playing && self.dimensions.0 > 0 && self.dimensions.1 > 0 && !self.exhausted()
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn grab(&mut self) -> Result<FrameSample, SourceError> {
        if !self.is_ready() {
            return Err(SourceError::NotReady);
        }
        let path = &self.paths[self.cursor % self.paths.len()];
        self.cursor += 1;
        if self.looping && self.cursor >= self.paths.len() {
            self.cursor = 0;
        }

        let image = image::open(path)
            .map_err(|source| SourceError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        self.dimensions = image.dimensions();

        let frame = FrameSample::from_rgb_image(image, self.next_index);
        self.next_index += 1;
        Ok(frame)
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let list_err = |source: std::io::Error| SourceError::List {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if path.is_file() && is_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
