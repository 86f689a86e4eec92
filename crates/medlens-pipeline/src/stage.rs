//! Uploader/stager: temporary on-disk staging of image payloads
//!
//! Staged files live in the OS temp dir under collision-resistant UUID names
//! and are removed when the handle drops, on success and error paths alike.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Supported image encodings for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
    Gif,
}

impl ImageFormat {
    /// Parse a declared MIME subtype or file extension
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Infer the format from a file path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_subtype)
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
        }
    }
}

/// A temp file that is deleted when dropped
#[derive(Debug)]
pub(crate) struct TempPath(PathBuf);

impl TempPath {
    /// Reserve a uniquely named path in the OS temp dir
    pub(crate) fn reserve(prefix: &str, extension: &str) -> Self {
        let name = format!("{}-{}.{}", prefix, uuid::Uuid::new_v4(), extension);
        Self(std::env::temp_dir().join(name))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.0.display(), "failed to remove temp file: {e}");
            }
        }
    }
}

/// An uploaded image payload staged to local storage
#[derive(Debug)]
pub struct StagedUpload {
    temp: TempPath,
}

impl StagedUpload {
    /// Write the payload unmodified to a uniquely named temp file.
    /// The file is removed when the returned handle drops.
    pub fn write(bytes: &[u8], format: ImageFormat) -> Result<Self> {
        let temp = TempPath::reserve("medlens-upload", format.extension());
        fs::write(temp.path(), bytes)?;
        tracing::debug!(path = %temp.path().display(), size = bytes.len(), "staged upload");
        Ok(Self { temp })
    }

    /// Like [`write`](Self::write), parsing the declared subtype first
    pub fn from_subtype(bytes: &[u8], subtype: &str) -> Result<Self> {
        let format = ImageFormat::from_subtype(subtype)
            .ok_or_else(|| PipelineError::UnsupportedFormat(subtype.to_string()))?;
        Self::write(bytes, format)
    }

    /// Path of the staged file, usable by the analysis invoker
    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_writes_payload_unmodified() {
        let _lock = crate::test_util::TEMP_DIR_LOCK.lock().unwrap();
        let staged = StagedUpload::write(b"not really a png", ImageFormat::Png).unwrap();
        let on_disk = fs::read(staged.path()).unwrap();
        assert_eq!(on_disk, b"not really a png");
        assert!(staged.path().to_string_lossy().ends_with(".png"));
    }

    #[test]
    fn test_staged_file_removed_on_drop() {
        let _lock = crate::test_util::TEMP_DIR_LOCK.lock().unwrap();
        let staged = StagedUpload::write(b"bytes", ImageFormat::Jpeg).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_unique_names_per_stage() {
        let _lock = crate::test_util::TEMP_DIR_LOCK.lock().unwrap();
        let a = StagedUpload::write(b"a", ImageFormat::Gif).unwrap();
        let b = StagedUpload::write(b"b", ImageFormat::Gif).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_subtype_parsing() {
        assert_eq!(ImageFormat::from_subtype("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_subtype("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_subtype("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_subtype("bmp"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::from_subtype("gif"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_subtype("tiff"), None);
        assert_eq!(ImageFormat::from_subtype("webp"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/scans/chest.JPG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_path(Path::new("/scans/report.pdf")), None);
        assert_eq!(ImageFormat::from_path(Path::new("noextension")), None);
    }

    #[test]
    fn test_unsupported_subtype_rejected() {
        let _lock = crate::test_util::TEMP_DIR_LOCK.lock().unwrap();
        let err = StagedUpload::from_subtype(b"...", "svg").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }
}
