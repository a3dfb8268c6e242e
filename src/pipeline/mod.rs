//! Pipeline stages for document-to-deck generation.
//!
//! Each submodule implements one transformation step and is testable on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ plan ──▶ render ──▶ export
//! (path)   (readers)   (outline) (specs)  (pptx)   (pdf/html)
//! ```
//!
//! 1. [`input`]: map a path to a [`input::SourceFormat`] and check it can be read
//! 2. [`extract`]: run the format reader on `spawn_blocking`, clean and cap the
//!    text, collect tables and images ([`pdf`], [`docx`], [`images`])
//! 3. [`llm`]: drive the provider call with retry/backoff and validate the
//!    outline; the only stage with network I/O
//! 4. [`plan`]: classify outline slides and add the structural slides
//! 5. rendering and export live in [`crate::render`] and [`crate::export`]
//!
//! [`postprocess`] holds the deterministic text rules used on both sides of
//! the model call.

pub mod docx;
pub mod extract;
pub mod images;
pub mod input;
pub mod llm;
pub mod pdf;
pub mod plan;
pub mod postprocess;
