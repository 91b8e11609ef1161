//! Digest module
//!
//! Email rendering for sell-out digests and the pages shown to recipients.

pub mod pages;
pub mod renderer;

pub use renderer::{render_digest, RenderedDigest};
