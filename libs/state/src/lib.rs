//! # otc-acc-state
//!
//! The harness's read-only view of engine state.
//!
//! Checks never talk to the cloud to answer "what does the engine think";
//! they read a [`StateSnapshot`] taken right after the engine finished. Every
//! resource's attributes are flattened into dotted paths so a check can name
//! `tags.foo` or `network.0.uuid` directly.

mod diff;
mod error;
mod flatmap;
mod snapshot;

pub use diff::{diff_attributes, AttributeDiff, ALWAYS_IGNORED};
pub use error::StateError;
pub use flatmap::{flatten, path_within};
pub use snapshot::{ResourceMode, ResourceState, StateSnapshot};
