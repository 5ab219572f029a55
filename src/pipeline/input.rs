//! Upload slots: read a user-chosen file and check it against the flow's
//! allow-list before anything is encoded or sent.
//!
//! The extension picks the MIME type; the first bytes must then agree with it
//! (`%PDF`, the PNG signature, the JPEG SOI marker). A renamed file is
//! rejected here rather than surfacing later as an opaque endpoint error.

use crate::error::EduGuideError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which of the two upload slots a file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// The mock test paper. PDFs are accepted for the solutions flow.
    QuestionPaper,
    /// The student's answer sheet (analysis flow only).
    AnswerSheet,
}

impl UploadKind {
    pub fn label(self) -> &'static str {
        match self {
            UploadKind::QuestionPaper => "Mock Test Paper",
            UploadKind::AnswerSheet => "Answer Sheet",
        }
    }
}

/// MIME types a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowList {
    /// JPG, PNG or PDF.
    ImagesAndPdf,
    /// JPG or PNG.
    ImagesOnly,
}

impl AllowList {
    fn permits(self, mime: &str) -> bool {
        match self {
            AllowList::ImagesAndPdf => {
                matches!(mime, "image/jpeg" | "image/png" | "application/pdf")
            }
            AllowList::ImagesOnly => matches!(mime, "image/jpeg" | "image/png"),
        }
    }
}

/// MIME type implied by a file extension.
pub fn mime_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// MIME type implied by the first bytes of a file.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF") {
        Some("application/pdf")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else {
        None
    }
}

/// A validated upload held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub mime: &'static str,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn is_pdf(&self) -> bool {
        self.mime == "application/pdf"
    }

    pub fn human_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// `512 B`, `12.3 KB`, `4.56 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

/// Read and validate `path` for a slot.
///
/// # Errors
/// - [`EduGuideError::FileNotFound`] / [`EduGuideError::PermissionDenied`]
/// - [`EduGuideError::FileTooLarge`] when above `max_bytes`
/// - [`EduGuideError::UnsupportedFileType`] when the extension is not on the
///   allow-list or the content does not match it
pub async fn select_file(
    path: impl AsRef<Path>,
    allow: AllowList,
    max_bytes: u64,
) -> Result<SelectedFile, EduGuideError> {
    let path = path.as_ref().to_path_buf();

    let meta = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(EduGuideError::FileNotFound { path }),
        Err(e) => return Err(io_error(path, e)),
    };

    let size = meta.len();
    if size > max_bytes {
        return Err(EduGuideError::FileTooLarge {
            path,
            size,
            limit_mb: max_bytes / (1024 * 1024),
        });
    }

    let Some(mime) = mime_for_extension(&path).filter(|m| allow.permits(m)) else {
        return Err(EduGuideError::UnsupportedFileType {
            path,
            detail: match allow {
                AllowList::ImagesAndPdf => "expected .jpg, .jpeg, .png or .pdf".into(),
                AllowList::ImagesOnly => "expected .jpg, .jpeg or .png".into(),
            },
        });
    };

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| io_error(path.clone(), e))?;

    match sniff_mime(&bytes) {
        Some(actual) if actual == mime => {}
        actual => {
            return Err(EduGuideError::UnsupportedFileType {
                path,
                detail: format!(
                    "content is {} but the extension says {mime}",
                    actual.unwrap_or("unrecognised")
                ),
            })
        }
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Selected {name} ({mime}, {})", format_file_size(size));

    Ok(SelectedFile {
        path,
        name,
        mime,
        size,
        bytes,
    })
}

fn io_error(path: PathBuf, e: std::io::Error) -> EduGuideError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        EduGuideError::PermissionDenied { path }
    } else {
        EduGuideError::FileNotFound { path }
    }
}
