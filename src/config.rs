//! Configuration for every flow of the companion.
//!
//! All behaviour is controlled through [`CompanionConfig`], built via its
//! [`CompanionConfigBuilder`]. Endpoints, per-flow wait bounds, PDF
//! rasterisation knobs and the upload ceiling live in one struct so a CLI run
//! and a test harness configure the library the same way.

use crate::client::Flow;
use crate::error::EduGuideError;
use crate::progress::{NoopProgress, ProgressCallback};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Base of the hosted workflow-automation webhooks.
pub const DEFAULT_WEBHOOK_BASE: &str = "https://abcdef123456.app.n8n.cloud/webhook";

/// Configuration shared by the chat, mock-test and counselling flows.
///
/// # Example
/// ```rust
/// use eduguide::CompanionConfig;
///
/// let config = CompanionConfig::builder()
///     .max_pdf_pages(2)
///     .counselling_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pdf_pages, 2);
/// ```
#[derive(Clone)]
pub struct CompanionConfig {
    /// Chat webhook (`{exam, chatInput}` → `{output}`).
    pub chat_url: String,

    /// Counselling workflow (`{mainRank, …}` → `{success, reports, …}`).
    pub counselling_url: String,

    /// Vision solutions endpoint (`{exam, testImage}`).
    pub solutions_url: String,

    /// Vision analysis endpoint (`{exam, testImage, answerImage}`).
    pub analysis_url: String,

    /// Bounded wait for one chat reply. Default: 30.
    pub chat_timeout_secs: u64,

    /// Bounded wait for counselling generation. Default: 90.
    ///
    /// The workflow searches cutoff data and writes a long report, so it gets
    /// the longest bound of all flows.
    pub counselling_timeout_secs: u64,

    /// Bounded wait for the two vision endpoints. Default: 120.
    pub mock_test_timeout_secs: u64,

    /// Maximum PDF pages rasterised per upload. Default: 3.
    pub max_pdf_pages: usize,

    /// Page upscaling factor applied before rasterising. Default: 2.0.
    ///
    /// Doubling the page size makes small print and math notation legible to
    /// the downstream vision model.
    pub render_scale: f32,

    /// JPEG quality (1–100) for rasterised pages. Default: 85.
    pub jpeg_quality: u8,

    /// Per-file upload ceiling in megabytes. Default: 10.
    pub max_upload_mb: u64,

    /// Directory of the local key-value store. `None` uses the platform data
    /// directory (`~/.local/share/eduguide` on Linux).
    pub storage_dir: Option<PathBuf>,

    /// Receives rasterisation and processing-stage events.
    pub progress: Arc<dyn ProgressCallback>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            chat_url: format!("{DEFAULT_WEBHOOK_BASE}/1b90d498-d74c-4b65-b3f4-edcbd01cbf20/chat"),
            counselling_url: format!("{DEFAULT_WEBHOOK_BASE}/webhook/choice-filling"),
            solutions_url: format!("{DEFAULT_WEBHOOK_BASE}/webhook/mock-test-vision-test"),
            analysis_url: format!("{DEFAULT_WEBHOOK_BASE}/webhook/mock-test-analysis-vision-test"),
            chat_timeout_secs: 30,
            counselling_timeout_secs: 90,
            mock_test_timeout_secs: 120,
            max_pdf_pages: 3,
            render_scale: 2.0,
            jpeg_quality: 85,
            max_upload_mb: 10,
            storage_dir: None,
            progress: Arc::new(NoopProgress),
        }
    }
}

impl fmt::Debug for CompanionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompanionConfig")
            .field("chat_url", &self.chat_url)
            .field("counselling_url", &self.counselling_url)
            .field("solutions_url", &self.solutions_url)
            .field("analysis_url", &self.analysis_url)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .field("counselling_timeout_secs", &self.counselling_timeout_secs)
            .field("mock_test_timeout_secs", &self.mock_test_timeout_secs)
            .field("max_pdf_pages", &self.max_pdf_pages)
            .field("render_scale", &self.render_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("storage_dir", &self.storage_dir)
            .field("progress", &"<dyn ProgressCallback>")
            .finish()
    }
}

impl CompanionConfig {
    /// Create a new builder for `CompanionConfig`.
    pub fn builder() -> CompanionConfigBuilder {
        CompanionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Endpoint URL of a flow.
    pub fn url_for(&self, flow: Flow) -> &str {
        match flow {
            Flow::Chat => &self.chat_url,
            Flow::Counselling => &self.counselling_url,
            Flow::Solutions => &self.solutions_url,
            Flow::Analysis => &self.analysis_url,
        }
    }

    /// Wait bound of a flow.
    pub fn timeout_for(&self, flow: Flow) -> Duration {
        let secs = match flow {
            Flow::Chat => self.chat_timeout_secs,
            Flow::Counselling => self.counselling_timeout_secs,
            Flow::Solutions | Flow::Analysis => self.mock_test_timeout_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Builder for [`CompanionConfig`].
pub struct CompanionConfigBuilder {
    config: CompanionConfig,
}

impl fmt::Debug for CompanionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompanionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl CompanionConfigBuilder {
    /// Point all four endpoints at `base`, keeping the default paths.
    pub fn webhook_base(mut self, base: impl AsRef<str>) -> Self {
        let base = base.as_ref().trim_end_matches('/');
        let defaults = CompanionConfig::default();
        let rebase = |url: &str| format!("{base}{}", &url[DEFAULT_WEBHOOK_BASE.len()..]);
        self.config.chat_url = rebase(&defaults.chat_url);
        self.config.counselling_url = rebase(&defaults.counselling_url);
        self.config.solutions_url = rebase(&defaults.solutions_url);
        self.config.analysis_url = rebase(&defaults.analysis_url);
        self
    }

    pub fn chat_url(mut self, url: impl Into<String>) -> Self {
        self.config.chat_url = url.into();
        self
    }

    pub fn counselling_url(mut self, url: impl Into<String>) -> Self {
        self.config.counselling_url = url.into();
        self
    }

    pub fn solutions_url(mut self, url: impl Into<String>) -> Self {
        self.config.solutions_url = url.into();
        self
    }

    pub fn analysis_url(mut self, url: impl Into<String>) -> Self {
        self.config.analysis_url = url.into();
        self
    }

    pub fn chat_timeout_secs(mut self, secs: u64) -> Self {
        self.config.chat_timeout_secs = secs;
        self
    }

    pub fn counselling_timeout_secs(mut self, secs: u64) -> Self {
        self.config.counselling_timeout_secs = secs;
        self
    }

    pub fn mock_test_timeout_secs(mut self, secs: u64) -> Self {
        self.config.mock_test_timeout_secs = secs;
        self
    }

    pub fn max_pdf_pages(mut self, n: usize) -> Self {
        self.config.max_pdf_pages = n;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn max_upload_mb(mut self, mb: u64) -> Self {
        self.config.max_upload_mb = mb;
        self
    }

    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.storage_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ProgressCallback>) -> Self {
        self.config.progress = cb;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompanionConfig, EduGuideError> {
        let c = &self.config;
        for flow in Flow::ALL {
            let url = c.url_for(flow);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(EduGuideError::InvalidConfig(format!(
                    "{flow} endpoint must be an http(s) URL, got '{url}'"
                )));
            }
            if c.timeout_for(flow).is_zero() {
                return Err(EduGuideError::InvalidConfig(format!(
                    "{flow} timeout must be ≥ 1s"
                )));
            }
        }
        if c.max_pdf_pages == 0 {
            return Err(EduGuideError::InvalidConfig(
                "max_pdf_pages must be ≥ 1".into(),
            ));
        }
        if !(c.render_scale > 0.0 && c.render_scale <= 8.0) {
            return Err(EduGuideError::InvalidConfig(format!(
                "render_scale must be in (0, 8], got {}",
                c.render_scale
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(EduGuideError::InvalidConfig(format!(
                "jpeg_quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.max_upload_mb == 0 {
            return Err(EduGuideError::InvalidConfig(
                "max_upload_mb must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
