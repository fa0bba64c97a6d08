//! Progress-callback trait for per-slide pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the controller walks the deck. Slides are processed strictly in
//! order, so events for slide `i` always precede events for slide `i + 1`.
//!
//! # Example
//!
//! ```rust
//! use deckscribe::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl PipelineProgressCallback for Counter {
//!     fn on_slide_complete(&self, index: usize, total: usize, text_len: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("slide {index}/{total}: {text_len} chars");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the controller as it processes each slide.
///
/// All methods default to no-ops so callers only override what they need.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after rasterisation, before the first slide.
    ///
    /// * `total_slides`: pages in the deck
    /// * `start_slide`: first slide that will actually be processed
    fn on_run_start(&self, total_slides: usize, start_slide: usize) {
        let _ = (total_slides, start_slide);
    }

    /// Called before a slide image is saved.
    fn on_slide_start(&self, index: usize, total_slides: usize) {
        let _ = (index, total_slides);
    }

    /// Called after the slide's record has been appended.
    ///
    /// * `text_len`: byte length of the analysis text
    fn on_slide_complete(&self, index: usize, total_slides: usize, text_len: usize) {
        let _ = (index, total_slides, text_len);
    }

    /// Called when a slide fails; the run aborts right after.
    fn on_slide_error(&self, index: usize, total_slides: usize, error: &str) {
        let _ = (index, total_slides, error);
    }

    /// Called once when every slide from `start_slide` on has been processed.
    fn on_run_complete(&self, total_slides: usize, processed: usize) {
        let _ = (total_slides, processed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        first_slide: AtomicUsize,
        processed: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_run_start(&self, _total: usize, start_slide: usize) {
            self.first_slide.store(start_slide, Ordering::SeqCst);
        }

        fn on_slide_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_slide_complete(&self, _index: usize, _total: usize, _text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_slide_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total: usize, processed: usize) {
            self.processed.store(processed, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5, 1);
        cb.on_slide_start(1, 5);
        cb.on_slide_complete(1, 5, 42);
        cb.on_slide_error(2, 5, "some error");
        cb.on_run_complete(5, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(3, 2);
        tracker.on_slide_start(2, 3);
        tracker.on_slide_complete(2, 3, 100);
        tracker.on_slide_start(3, 3);
        tracker.on_slide_error(3, 3, "HTTP 500");

        assert_eq!(tracker.first_slide.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_run_complete(3, 2);
        assert_eq!(tracker.processed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(10, 1);
        cb.on_slide_complete(1, 10, 512);
    }
}
