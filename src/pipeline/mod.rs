//! Upload pipeline for the mock-test flows.
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ client
//! (file)    (pdfium)   (base64)   (webhook)
//! ```
//!
//! 1. [`input`]: read a chosen file and check it against the slot's
//!    allow-list and size ceiling
//! 2. [`render`]: rasterise the first pages of a PDF; runs on a blocking
//!    thread because pdfium is not async-safe
//! 3. [`encode`]: JPEG-encode rendered pages and base64-wrap every payload

pub mod encode;
pub mod input;
pub mod render;
