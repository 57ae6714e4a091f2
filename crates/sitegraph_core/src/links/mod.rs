//! Hyperlink extraction and classification over HTML article content.
//!
//! # Responsibility
//! - Pull `<a href>` links out of editor HTML in document order.
//! - Decide whether a link targets a page of the project or an external URL.
//! - Rewrite content by unwrapping selected anchors.
//!
//! # Invariants
//! - Nothing in this module fails on malformed markup; it degrades to
//!   best-effort results.
//! - All functions are pure; no logging, no storage access.

mod classify;
mod extract;

pub use classify::{classify_link, normalize_domain, normalize_external_url, LinkTarget};
pub use extract::{extract_links, html_word_count, unwrap_anchors, ExtractedLink};
