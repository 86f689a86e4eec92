//! Analysis invoker: resize the staged image and submit it for interpretation
//!
//! One blocking-to-completion call per invocation. No retries, no deadline;
//! the only caller-side control is the cancellation token. Every failure mode
//! after staging is converted into report text so the conversation always
//! gains an assistant turn.

use crate::error::{PipelineError, Result};
use crate::prompt::ANALYSIS_PROMPT;
use crate::stage::{ImageFormat, StagedUpload, TempPath};
use async_trait::async_trait;
use medlens_ai::{GeminiClient, InlineImage};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fixed output width of the convenience downscale
const TARGET_WIDTH: u32 = 500;

/// Marker prepended to error text surfaced as an assistant turn
pub const WARNING_PREFIX: &str = "⚠️ Analysis error:";

/// The inference service boundary: instruction text plus an image in, text out
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, instruction: &str, image: &InlineImage)
    -> medlens_ai::Result<String>;
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(
        &self,
        instruction: &str,
        image: &InlineImage,
    ) -> medlens_ai::Result<String> {
        GeminiClient::generate(self, instruction, std::slice::from_ref(image)).await
    }
}

/// Output dimensions for an input of `width` x `height`: fixed 500-wide,
/// aspect-ratio-preserving height within integer rounding.
pub fn resized_dimensions(width: u32, height: u32) -> (u32, u32) {
    let new_height = (TARGET_WIDTH as f64 * height as f64 / width as f64).round() as u32;
    (TARGET_WIDTH, new_height.max(1))
}

/// Runs the analysis pipeline against a [`VisionModel`]
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn VisionModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    /// Analyze the image at `path`. Always produces report text: on success
    /// the service's response verbatim, on any failure a warning-prefixed
    /// description. Both temp files created along the way are gone by the
    /// time this returns.
    pub async fn analyze(&self, path: &Path, cancel: &CancellationToken) -> String {
        match self.run(path, cancel).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("analysis failed: {e}");
                format!("{WARNING_PREFIX} {e}")
            }
        }
    }

    /// Stage a raw payload and analyze it. Staging I/O errors propagate;
    /// everything past staging is surfaced as report text.
    pub async fn stage_and_analyze(
        &self,
        bytes: &[u8],
        format: ImageFormat,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let staged = StagedUpload::write(bytes, format)?;
        Ok(self.analyze(staged.path(), cancel).await)
    }

    async fn run(&self, path: &Path, cancel: &CancellationToken) -> Result<String> {
        let img = image::open(path)?;
        let (width, height) = (img.width(), img.height());
        let (new_width, new_height) = resized_dimensions(width, height);
        let resized = img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle);

        // Persist the downscaled copy; the guard removes it on every exit path.
        let temp = TempPath::reserve("medlens-resized", "png");
        resized.save_with_format(temp.path(), image::ImageFormat::Png)?;
        let resized_bytes = fs::read(temp.path())?;
        let inline = InlineImage::from_bytes(&resized_bytes, "image/png");

        tracing::debug!(
            "submitting {width}x{height} image resized to {new_width}x{new_height} for analysis"
        );

        tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            response = self.model.generate(ANALYSIS_PROMPT, &inline) => Ok(response?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{TEMP_DIR_LOCK, leftover_temp_files, png_bytes};
    use base64::Engine as _;
    use std::sync::Mutex;

    struct FixedReport(&'static str);

    #[async_trait]
    impl VisionModel for FixedReport {
        async fn generate(&self, _: &str, _: &InlineImage) -> medlens_ai::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl VisionModel for FailingModel {
        async fn generate(&self, _: &str, _: &InlineImage) -> medlens_ai::Result<String> {
            Err(medlens_ai::Error::api(504, "upstream timeout"))
        }
    }

    /// Records the decoded dimensions of the image it receives
    struct CapturingModel(Mutex<Option<(u32, u32)>>);

    #[async_trait]
    impl VisionModel for CapturingModel {
        async fn generate(
            &self,
            instruction: &str,
            image: &InlineImage,
        ) -> medlens_ai::Result<String> {
            assert!(instruction.contains("### 1. Image Type & Region"));
            assert_eq!(image.mime_type, "image/png");
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&image.data)
                .unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            *self.0.lock().unwrap() = Some((decoded.width(), decoded.height()));
            Ok("ok".to_string())
        }
    }

    #[test]
    fn test_resized_dimensions() {
        assert_eq!(resized_dimensions(1000, 500), (500, 250));
        assert_eq!(resized_dimensions(500, 1000), (500, 1000));
        assert_eq!(resized_dimensions(500, 500), (500, 500));
        // round(500 * 100 / 333) = round(150.15) = 150
        assert_eq!(resized_dimensions(333, 100), (500, 150));
        // Extreme panoramas still produce at least one row
        assert_eq!(resized_dimensions(100_000, 10), (500, 1));
    }

    #[tokio::test]
    async fn test_analyze_returns_report_verbatim() {
        let _lock = TEMP_DIR_LOCK.lock().unwrap();
        let report = "### 1. Image Type & Region\nChest X-ray, PA view.";
        let analyzer = Analyzer::new(Arc::new(FixedReport(report)));
        let staged = StagedUpload::write(&png_bytes(1000, 500), ImageFormat::Png).unwrap();
        let text = analyzer
            .analyze(staged.path(), &CancellationToken::new())
            .await;
        assert_eq!(text, report);
    }

    #[tokio::test]
    async fn test_analyze_resizes_to_fixed_width() {
        let _lock = TEMP_DIR_LOCK.lock().unwrap();
        let model = Arc::new(CapturingModel(Mutex::new(None)));
        let analyzer = Analyzer::new(model.clone());
        let staged = StagedUpload::write(&png_bytes(1000, 500), ImageFormat::Png).unwrap();
        analyzer
            .analyze(staged.path(), &CancellationToken::new())
            .await;
        assert_eq!(*model.0.lock().unwrap(), Some((500, 250)));
    }

    #[tokio::test]
    async fn test_remote_failure_becomes_warning_text() {
        let _lock = TEMP_DIR_LOCK.lock().unwrap();
        let analyzer = Analyzer::new(Arc::new(FailingModel));
        let staged = StagedUpload::write(&png_bytes(20, 20), ImageFormat::Png).unwrap();
        let text = analyzer
            .analyze(staged.path(), &CancellationToken::new())
            .await;
        assert!(text.starts_with(WARNING_PREFIX));
        assert!(text.contains("upstream timeout"));
    }

    #[tokio::test]
    async fn test_undecodable_image_becomes_warning_text() {
        let _lock = TEMP_DIR_LOCK.lock().unwrap();
        let analyzer = Analyzer::new(Arc::new(FixedReport("unreachable")));
        let staged = StagedUpload::write(b"definitely not an image", ImageFormat::Png).unwrap();
        let text = analyzer
            .analyze(staged.path(), &CancellationToken::new())
            .await;
        assert!(text.starts_with(WARNING_PREFIX));
    }

    #[tokio::test]
    async fn test_cancelled_call_becomes_warning_text() {
        let _lock = TEMP_DIR_LOCK.lock().unwrap();

        /// Never resolves, so cancellation wins the select
        struct HangingModel;

        #[async_trait]
        impl VisionModel for HangingModel {
            async fn generate(&self, _: &str, _: &InlineImage) -> medlens_ai::Result<String> {
                futures_never().await
            }
        }

        async fn futures_never() -> medlens_ai::Result<String> {
            std::future::pending().await
        }

        let analyzer = Analyzer::new(Arc::new(HangingModel));
        let staged = StagedUpload::write(&png_bytes(20, 20), ImageFormat::Png).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let text = analyzer.analyze(staged.path(), &cancel).await;
        assert!(text.starts_with(WARNING_PREFIX));
        assert!(text.contains("cancelled"));
    }

    #[tokio::test]
    async fn test_temp_files_gone_after_success_and_failure() {
        let _lock = TEMP_DIR_LOCK.lock().unwrap();

        let analyzer = Analyzer::new(Arc::new(FixedReport("fine")));
        analyzer
            .stage_and_analyze(&png_bytes(40, 30), ImageFormat::Png, &CancellationToken::new())
            .await
            .unwrap();
        assert!(leftover_temp_files().is_empty());

        let failing = Analyzer::new(Arc::new(FailingModel));
        failing
            .stage_and_analyze(&png_bytes(40, 30), ImageFormat::Png, &CancellationToken::new())
            .await
            .unwrap();
        assert!(leftover_temp_files().is_empty());
    }

    #[tokio::test]
    async fn test_stage_and_analyze_never_errors_past_staging() {
        let _lock = TEMP_DIR_LOCK.lock().unwrap();
        for bytes in [png_bytes(10, 10), b"garbage".to_vec()] {
            for format in [
                ImageFormat::Jpeg,
                ImageFormat::Png,
                ImageFormat::Bmp,
                ImageFormat::Gif,
            ] {
                let analyzer = Analyzer::new(Arc::new(FailingModel));
                let text = analyzer
                    .stage_and_analyze(&bytes, format, &CancellationToken::new())
                    .await
                    .unwrap();
                assert!(!text.is_empty());
            }
        }
    }
}
