//! medlens-pipeline: the upload-to-report pipeline
//!
//! Three pieces, composed linearly per user action: a stager that writes the
//! uploaded bytes to a uniquely named temp file, an invoker that resizes the
//! staged image and submits it to the inference service, and an append-only
//! conversation log of user/assistant turns.

pub mod analyze;
pub mod conversation;
pub mod error;
pub mod prompt;
pub mod stage;

pub use analyze::{Analyzer, VisionModel, WARNING_PREFIX, resized_dimensions};
pub use conversation::{Conversation, Role, Turn};
pub use error::{PipelineError, Result};
pub use prompt::ANALYSIS_PROMPT;
pub use stage::{ImageFormat, StagedUpload};

#[cfg(test)]
pub(crate) mod test_util {
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Serializes tests that create or scan files in the OS temp dir
    pub static TEMP_DIR_LOCK: Mutex<()> = Mutex::new(());

    /// A valid PNG of the given dimensions
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Pipeline-created files still present in the temp dir
    pub fn leftover_temp_files() -> Vec<PathBuf> {
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| {
                        n.starts_with("medlens-upload-") || n.starts_with("medlens-resized-")
                    })
            })
            .collect()
    }
}
