//! PDF rasterisation: render the first pages of an upload to JPEG payloads.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and must not be driven from an async task. The whole document
//! lifetime (bind → load → render every page) lives on one blocking thread.
//!
//! ## Why a channel of capacity 1?
//!
//! Each rendered page is a few hundred kilobytes of base64. The producer
//! hands pages over one at a time and blocks until the consumer has taken
//! the previous one, so at most two encoded pages exist at once. Dropping
//! the [`RasterStream`] makes the next send fail and the producer stops.
//!
//! The document itself sits behind [`PageSource`], which lets the ordering
//! and failure rules be exercised without the pdfium shared library.

use crate::config::CompanionConfig;
use crate::error::EduGuideError;
use crate::pipeline::encode::{encode_jpeg, EncodedImage};
use crate::progress::{NoopProgress, SharedProgress};
use futures::StreamExt;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// A document whose pages can be rendered one by one.
///
/// Errors are returned as plain detail strings; the rasteriser attaches the
/// page number.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based) at `scale` × its natural size.
    fn render_page(&mut self, index: usize, scale: f32) -> Result<DynamicImage, String>;
}

/// A PDF loaded into pdfium.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumSource<'a> {
    pub fn load(pdfium: &'a Pdfium, bytes: Vec<u8>) -> Result<Self, EduGuideError> {
        let document = pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| EduGuideError::CorruptPdf {
                detail: format!("{:?}", e),
            })?;
        Ok(Self { document })
    }
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&mut self, index: usize, scale: f32) -> Result<DynamicImage, String> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| format!("{:?}", e))?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| format!("{:?}", e))?;
        Ok(bitmap.as_image())
    }
}

/// Bind to a pdfium library: `PDFIUM_LIB_PATH` if set, else one next to the
/// working directory, else the system library.
pub fn bind_pdfium() -> Result<Pdfium, EduGuideError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.trim().is_empty() => {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path.trim());
            Pdfium::bind_to_library(path.trim())
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| EduGuideError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Rendering parameters, normally taken from [`CompanionConfig`].
#[derive(Clone)]
pub struct RasterSettings {
    /// Only the first `max_pages` pages are rendered.
    pub max_pages: usize,
    pub scale: f32,
    pub jpeg_quality: u8,
    pub progress: SharedProgress,
}

impl RasterSettings {
    pub fn from_config(config: &CompanionConfig) -> Self {
        Self {
            max_pages: config.max_pdf_pages,
            scale: config.render_scale,
            jpeg_quality: config.jpeg_quality,
            progress: config.progress.clone(),
        }
    }
}

impl std::fmt::Debug for RasterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSettings")
            .field("max_pages", &self.max_pages)
            .field("scale", &self.scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            max_pages: 3,
            scale: 2.0,
            jpeg_quality: 85,
            progress: Arc::new(NoopProgress),
        }
    }
}

/// One rendered page, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterPage {
    pub page_num: usize,
    pub image: EncodedImage,
}

type PageItem = Result<RasterPage, EduGuideError>;

/// Pages in ascending order. Ends after the last page or after the first
/// error, whichever comes first.
pub struct RasterStream {
    total_pages: usize,
    inner: ReceiverStream<PageItem>,
}

impl RasterStream {
    /// Pages this stream will yield when nothing fails:
    /// `min(document pages, max_pages)`.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }
}

impl Stream for RasterStream {
    type Item = PageItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Start rasterising a PDF held in memory.
///
/// Returns once the document is open and its page count is known; pages are
/// rendered as the stream is polled.
///
/// # Errors
/// - [`EduGuideError::PdfiumBindingFailed`] when no pdfium library loads
/// - [`EduGuideError::CorruptPdf`] when pdfium rejects the bytes
/// - [`EduGuideError::EmptyDocument`] for a zero-page document
pub async fn rasterize(
    bytes: Vec<u8>,
    settings: RasterSettings,
) -> Result<RasterStream, EduGuideError> {
    info!("Rasterising PDF ({} bytes)", bytes.len());
    let (ready_tx, ready_rx) = oneshot::channel();
    let (tx, rx) = mpsc::channel(1);

    let handle = tokio::task::spawn_blocking(move || {
        let pdfium = match bind_pdfium() {
            Ok(p) => p,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };
        match PdfiumSource::load(&pdfium, bytes) {
            Ok(mut source) => produce(&mut source, &settings, ready_tx, &tx),
            Err(e) => {
                let _ = ready_tx.send(Err(e));
            }
        };
    });

    connect(ready_rx, rx, handle).await
}

/// Start rasterising an arbitrary [`PageSource`] with the same sequencing
/// rules as [`rasterize`].
pub async fn rasterize_source<S>(
    mut source: S,
    settings: RasterSettings,
) -> Result<RasterStream, EduGuideError>
where
    S: PageSource + Send + 'static,
{
    let (ready_tx, ready_rx) = oneshot::channel();
    let (tx, rx) = mpsc::channel(1);
    let handle = tokio::task::spawn_blocking(move || {
        produce(&mut source, &settings, ready_tx, &tx);
    });
    connect(ready_rx, rx, handle).await
}

/// Drain a stream into a vector. Any error discards the pages rendered so far.
pub async fn collect_pages(mut stream: RasterStream) -> Result<Vec<RasterPage>, EduGuideError> {
    let total = stream.total_pages();
    let mut pages = Vec::with_capacity(total);
    while let Some(item) = stream.next().await {
        pages.push(item?);
    }
    if pages.len() != total {
        return Err(EduGuideError::Internal(format!(
            "Rasteriser stopped after {} of {} pages",
            pages.len(),
            total
        )));
    }
    Ok(pages)
}

/// [`rasterize`] then [`collect_pages`].
pub async fn rasterize_all(
    bytes: Vec<u8>,
    settings: RasterSettings,
) -> Result<Vec<RasterPage>, EduGuideError> {
    collect_pages(rasterize(bytes, settings).await?).await
}

async fn connect(
    ready: oneshot::Receiver<Result<usize, EduGuideError>>,
    rx: mpsc::Receiver<PageItem>,
    handle: JoinHandle<()>,
) -> Result<RasterStream, EduGuideError> {
    match ready.await {
        Ok(Ok(total_pages)) => Ok(RasterStream {
            total_pages,
            inner: ReceiverStream::new(rx),
        }),
        Ok(Err(e)) => Err(e),
        // The producer dropped the sender without reporting: it panicked.
        Err(_) => Err(match handle.await {
            Err(e) => EduGuideError::Internal(format!("Render task panicked: {}", e)),
            Ok(()) => EduGuideError::Internal("Render task exited early".into()),
        }),
    }
}

/// Blocking producer loop. Runs on the rasterisation thread.
fn produce<S: PageSource + ?Sized>(
    source: &mut S,
    settings: &RasterSettings,
    ready: oneshot::Sender<Result<usize, EduGuideError>>,
    tx: &mpsc::Sender<PageItem>,
) {
    let doc_pages = source.page_count();
    if doc_pages == 0 {
        let _ = ready.send(Err(EduGuideError::EmptyDocument));
        return;
    }

    let total = doc_pages.min(settings.max_pages.max(1));
    if total < doc_pages {
        info!("PDF has {} pages; rendering the first {}", doc_pages, total);
    }
    if ready.send(Ok(total)).is_err() {
        return;
    }

    let progress = &settings.progress;
    progress.on_conversion_start(total);

    for idx in 0..total {
        let page_num = idx + 1;
        progress.on_page_start(page_num, total);

        let item = source
            .render_page(idx, settings.scale)
            .map_err(|detail| EduGuideError::RasterisationFailed {
                page: page_num,
                detail,
            })
            .and_then(|img| {
                debug!("Rendered page {} → {}x{} px", page_num, img.width(), img.height());
                encode_jpeg(&img, settings.jpeg_quality).map_err(|e| {
                    EduGuideError::EncodeFailed {
                        page: page_num,
                        detail: e.to_string(),
                    }
                })
            })
            .map(|image| RasterPage { page_num, image });

        let failed = match &item {
            Ok(page) => {
                progress.on_page_complete(page_num, total, page.image.base64.len());
                false
            }
            Err(e) => {
                warn!("Page {}/{} failed: {}", page_num, total, e);
                true
            }
        };

        if tx.blocking_send(item).is_err() {
            debug!("Raster stream dropped after page {}; stopping", page_num);
            return;
        }
        if failed {
            return;
        }
    }

    progress.on_conversion_complete(total);
}
