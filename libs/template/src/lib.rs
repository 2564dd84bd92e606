//! # otc-acc-template
//!
//! Configuration documents with named holes.
//!
//! Templates are plain strings; holes are `{{ name }}` markers resolved
//! against the environment registry and per-case parameters. Rendering is
//! pure, which keeps plans stable across steps that re-render the same
//! document. Larger documents are built by textual composition
//! ([`ConfigTemplate::compose`], [`ConfigTemplate::then`]).

mod error;
mod template;

pub use error::RenderError;
pub use template::{ConfigTemplate, RenderContext, Resolved, ValueSource};

use sha2::{Digest, Sha256};

/// Short content hash of a rendered document, for log correlation.
pub fn fingerprint(document: &str) -> String {
    let digest = Sha256::digest(document.as_bytes());
    format!("sha256:{}", hex::encode(&digest[..8]))
}
