use std::path::{Path, PathBuf};

use crate::normalization::domain::photo::FinalPhoto;
use crate::shared::constants::{EXPORT_EXTENSION, EXPORT_FILE_PREFIX};

/// Persists a finished photo.
pub trait PhotoWriter: Send {
    fn write(&self, path: &Path, photo: &FinalPhoto) -> Result<(), Box<dyn std::error::Error>>;
}

/// `passport_photo_<CODE>.jpg`
pub fn export_file_name(country_code: &str) -> String {
    format!(
        "{EXPORT_FILE_PREFIX}{}.{EXPORT_EXTENSION}",
        country_code.trim().to_ascii_uppercase()
    )
}

/// Writes final photos into one directory under their export names.
pub struct PhotoExporter {
    dir: PathBuf,
    writer: Box<dyn PhotoWriter>,
}

impl PhotoExporter {
    pub fn new(dir: impl Into<PathBuf>, writer: Box<dyn PhotoWriter>) -> Self {
        Self {
            dir: dir.into(),
            writer,
        }
    }

    /// Writes `photo` and returns the path it was written to.
    pub fn export(
        &self,
        photo: &FinalPhoto,
        country_code: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.dir.join(export_file_name(country_code));
        self.writer.write(&path, photo)?;
        log::info!("Exported {}", path.display());
        Ok(path)
    }
}
