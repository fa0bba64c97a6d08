//! Pipeline stages for describing a slide deck.
//!
//! Each submodule implements exactly one step, so each can be tested alone
//! and the controller can be driven with fake rasterisers and analyzers.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ rasterize ──▶ encode ──▶ analyze
//! (check)    (pdfium)     (JPEG)     (VLM)
//! ```
//!
//! 1. [`input`]: check the deck is a readable PDF; derive output names
//! 2. [`rasterize`]: render every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]: save slide JPEGs and build base64 data-URIs
//! 4. [`analyze`]: one model call per slide; the only stage with network I/O

pub mod analyze;
pub mod encode;
pub mod input;
pub mod rasterize;
