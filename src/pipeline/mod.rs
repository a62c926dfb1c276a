//! Pipeline stages for both conversions.
//!
//! Each submodule implements exactly one step, so the stages can be tested
//! and replaced independently.
//!
//! ## Data Flow
//!
//! ```text
//! image:    input ──▶ layout::fit_image ──▶ render
//!           (decode)  (pure arithmetic)     (printpdf)
//!
//! markdown: input ──▶ pandoc
//!           (check)   (child process)
//! ```
//!
//! 1. [`input`]  — validate the source path; decode images
//! 2. [`render`] — [`render::ImageRenderer`] trait and the printpdf backend
//! 3. [`pandoc`] — [`pandoc::DocumentConverter`] trait and the pandoc backend
//!
//! Writing the destination file is not a stage: [`crate::convert`] owns it
//! so both pipelines share the same atomic-write behaviour.

pub mod input;
pub mod pandoc;
pub mod render;
