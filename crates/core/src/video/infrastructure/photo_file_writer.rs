use std::path::Path;

use crate::normalization::domain::photo::FinalPhoto;
use crate::video::domain::photo_writer::PhotoWriter;

/// Writes the encoded photo bytes to disk as-is.
pub struct PhotoFileWriter;

impl PhotoFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PhotoFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoWriter for PhotoFileWriter {
    fn write(&self, path: &Path, photo: &FinalPhoto) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &photo.bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::domain::photo::NormalizationReport;
    use crate::video::domain::photo_writer::PhotoExporter;

    fn photo(bytes: Vec<u8>) -> FinalPhoto {
        FinalPhoto {
            bytes,
            width: 1,
            height: 1,
            report: NormalizationReport::default(),
        }
    }

    #[test]
    fn test_write_creates_parent_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jpg");
        PhotoFileWriter::new().write(&path, &photo(vec![1, 2, 3])).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_exporter_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = PhotoExporter::new(dir.path(), Box::new(PhotoFileWriter::new()));
        let path = exporter.export(&photo(vec![9, 9]), "CA").unwrap();
        assert_eq!(path.file_name().unwrap(), "passport_photo_CA.jpg");
        assert_eq!(std::fs::read(path).unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_write_under_a_file_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        assert!(PhotoFileWriter::new()
            .write(&blocker.join("out.jpg"), &photo(vec![0]))
            .is_err());
    }
}
