//! # eduguide
//!
//! An exam-preparation companion for JEE, NEET and UPSC aspirants.
//!
//! The heavy lifting (language and vision models) happens behind four
//! hosted webhooks. This crate is everything around them: building the
//! request bodies, rasterising PDF uploads, bounding every wait, mapping
//! failures to the messages a student sees, keeping drafts across runs and
//! rendering the replies.
//!
//! ## Flows
//!
//! ```text
//! chat          text ──▶ chat webhook ──▶ reply text
//! mock test     paper (img/PDF) ──▶ [pdfium → JPEG] ──▶ solutions webhook
//!               paper + answer sheet ──▶ analysis webhook ──▶ dashboard / HTML
//! counselling   5-step wizard ──▶ counselling webhook ──▶ strategy report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eduguide::{ChatSession, CompanionConfig, DraftStore, Exam, WebhookClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CompanionConfig::builder().build()?;
//!     let mut chat = ChatSession::new(&config, WebhookClient::new(), DraftStore::in_memory())?;
//!     chat.set_exam(Exam::Jee)?;
//!     if let Some(reply) = chat.send("I keep failing my physics mocks").await {
//!         println!("{}", reply.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `eduguide` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! eduguide = { version = "0.1", default-features = false }
//! ```
//!
//! PDF question papers need a pdfium shared library at run time; see
//! [`pipeline::render::bind_pdfium`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod chat;
pub mod client;
pub mod config;
pub mod counselling;
pub mod error;
pub mod exam;
pub mod mock_test;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use chat::{ChatMessage, ChatSession, PendingReply, Role};
pub use client::{Flow, WebhookClient};
pub use config::{CompanionConfig, CompanionConfigBuilder, DEFAULT_WEBHOOK_BASE};
pub use counselling::{CounsellingFlow, CounsellingResponse, FormRecord, FormWizard, ViewState};
pub use error::{EduGuideError, ValidationErrors};
pub use exam::Exam;
pub use mock_test::{MockTestSession, UploadState};
pub use pipeline::render::{RasterPage, RasterStream};
pub use progress::{NoopProgress, ProcessingStatus, ProgressCallback};
pub use report::{AnalysisReport, SolutionsReport};
pub use storage::{DraftStore, FileStore, KeyValueStore, MemoryStore, StorageKey};
