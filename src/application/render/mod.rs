//! Rich-text rendering pipeline.
//!
//! The pipeline is pure: it accepts a stored editor document and produces
//! deterministic HTML, a bounded plain-text excerpt and the first image
//! reference. It never fails; malformed input degrades to escaped text so a
//! broken post body cannot take a page down.

mod service;
mod types;

pub use service::{DocumentRenderer, extract_first_image, extract_plain_text, render_to_html};
pub use types::{RenderOutput, RenderPipelineConfig, RenderTarget};
