//! Error types for the eduguide library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`EduGuideError`]: the operation could not complete (bad upload, PDF
//!   conversion failure, endpoint timeout, HTTP error, unsuccessful reply).
//!   Nothing here is fatal to the process: every flow catches it, returns to
//!   its last interactive screen and offers a manual retry.
//!
//! * [`ValidationErrors`]: field-keyed form errors that block a wizard
//!   transition and are fixed by editing the field.
//!
//! [`EduGuideError::user_message`] maps each error to the text a user sees for
//! the flow it happened in, so every front-end shows the same wording.

use crate::client::Flow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the eduguide library.
#[derive(Debug, Error)]
pub enum EduGuideError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// Upload file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// File is larger than the configured upload ceiling.
    #[error("File size exceeds {limit_mb}MB limit ('{path}' is {size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        limit_mb: u64,
    },

    /// Extension, MIME type or magic bytes are not on the flow's allow-list.
    #[error("Unsupported file '{path}': {detail}")]
    UnsupportedFileType { path: PathBuf, detail: String },

    /// A flow was started before its required files were selected.
    #[error("Missing upload: {0}")]
    MissingUpload(&'static str),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt or encrypted: {detail}")]
    CorruptPdf { detail: String },

    /// The PDF has no pages to rasterise.
    #[error("PDF has no pages")]
    EmptyDocument,

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be encoded to JPEG.
    #[error("Image encoding failed for page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Endpoint errors ───────────────────────────────────────────────────
    /// The bounded wait elapsed before the endpoint replied.
    #[error("{flow} request timed out after {secs}s")]
    Timeout { flow: Flow, secs: u64 },

    /// The request never reached the endpoint (DNS, TLS, refused connection).
    #[error("{flow} request failed to connect: {detail}")]
    Connection { flow: Flow, detail: String },

    /// Non-2xx status. `message` is the `message` field of a JSON error body.
    #[error("{flow} endpoint returned HTTP {status}")]
    HttpStatus {
        flow: Flow,
        status: u16,
        message: Option<String>,
    },

    /// 2xx status but the body is not the expected JSON.
    #[error("{flow} endpoint returned a malformed body: {detail}")]
    MalformedResponse { flow: Flow, detail: String },

    /// The body parsed but declared itself unsuccessful.
    #[error("{flow} endpoint reported failure: {}", .message.as_deref().unwrap_or("no message"))]
    Unsuccessful { flow: Flow, message: Option<String> },

    // ── Form errors ───────────────────────────────────────────────────────
    /// The wizard refused a transition.
    #[error("{0}")]
    Validation(ValidationErrors),

    // ── Storage errors ────────────────────────────────────────────────────
    /// Could not read or write a persisted key.
    #[error("Storage error for key '{key}': {detail}")]
    Storage { key: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EduGuideError {
    /// `true` for errors where the user can simply press retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Connection { .. }
                | Self::HttpStatus { .. }
                | Self::MalformedResponse { .. }
                | Self::Unsuccessful { .. }
        )
    }

    /// The banner text shown to the user for this error.
    ///
    /// Each flow words its failures differently; the mapping is kept in one
    /// place so the chat loop, the wizard and the upload screens agree.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout { flow, .. } => match flow {
                Flow::Chat => "Request timed out. Please try again.".into(),
                _ => "Taking longer than expected. Please try again.".into(),
            },
            Self::Connection { flow, .. } => match flow {
                Flow::Chat => "Failed to get response. Please try again.".into(),
                _ => "Connection failed. Please check your internet.".into(),
            },
            Self::HttpStatus { flow, message, .. } => match flow {
                Flow::Chat => "Failed to get response. Please try again.".into(),
                Flow::Counselling => "Something went wrong. Please try again.".into(),
                Flow::Solutions | Flow::Analysis => message
                    .clone()
                    .unwrap_or_else(|| "Analysis failed. Please try again.".into()),
            },
            Self::MalformedResponse { flow, .. } => match flow {
                Flow::Chat => "Failed to get response. Please try again.".into(),
                _ => "Something went wrong. Please try again.".into(),
            },
            Self::Unsuccessful { flow, message } => match flow {
                Flow::Chat => "Failed to get response. Please try again.".into(),
                Flow::Counselling => "Something went wrong. Please try again.".into(),
                Flow::Solutions => message.clone().unwrap_or_else(|| {
                    "Failed to process the image. Please try again.".into()
                }),
                Flow::Analysis => message.clone().unwrap_or_else(|| {
                    "Failed to analyze images. Please ensure images are clear and well-lit.".into()
                }),
            },
            Self::FileTooLarge { limit_mb, .. } => {
                format!("File size exceeds {limit_mb}MB limit")
            }
            Self::UnsupportedFileType { .. } => "Please upload JPG, PNG, or PDF only".into(),
            Self::Validation(errors) => errors.to_string(),
            other => other.to_string(),
        }
    }
}

/// Field-keyed validation errors for one wizard step.
///
/// Keys are the wire names of the offending fields (`mainRank`, `category`,
/// …). Ordered so that displays are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", joined.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_depends_on_flow() {
        let chat = EduGuideError::Timeout {
            flow: Flow::Chat,
            secs: 30,
        };
        assert_eq!(chat.user_message(), "Request timed out. Please try again.");

        let counselling = EduGuideError::Timeout {
            flow: Flow::Counselling,
            secs: 90,
        };
        assert_eq!(
            counselling.user_message(),
            "Taking longer than expected. Please try again."
        );
        assert!(counselling.to_string().contains("90s"));
    }

    #[test]
    fn unsuccessful_prefers_server_message() {
        let e = EduGuideError::Unsuccessful {
            flow: Flow::Solutions,
            message: Some("Image too blurry".into()),
        };
        assert_eq!(e.user_message(), "Image too blurry");
        assert!(e.to_string().contains("Image too blurry"));

        let e = EduGuideError::Unsuccessful {
            flow: Flow::Analysis,
            message: None,
        };
        assert!(e.user_message().contains("clear and well-lit"));
    }

    #[test]
    fn http_status_display() {
        let e = EduGuideError::HttpStatus {
            flow: Flow::Counselling,
            status: 502,
            message: None,
        };
        assert!(e.to_string().contains("502"));
        assert!(e.is_retryable());
        assert_eq!(e.user_message(), "Something went wrong. Please try again.");
    }

    #[test]
    fn validation_errors_display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.insert("category", "Please select a category");
        errors.insert("gender", "Please select your gender");
        let msg = errors.to_string();
        assert!(msg.contains("category"), "got: {msg}");
        assert!(msg.contains("gender"));
        assert_eq!(errors.len(), 2);
        assert!(!EduGuideError::Validation(errors).is_retryable());
    }

    #[test]
    fn file_too_large_user_message() {
        let e = EduGuideError::FileTooLarge {
            path: "scan.png".into(),
            size: 11 * 1024 * 1024,
            limit_mb: 10,
        };
        assert_eq!(e.user_message(), "File size exceeds 10MB limit");
    }
}
