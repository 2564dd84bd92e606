//! # otc-acc-env
//!
//! Process environment for the OpenTelekomCloud acceptance harness.
//!
//! ## Contents
//!
//! - [`EnvRegistry`]: the fixed vocabulary of `OS_*` settings and feature
//!   flags, resolved once and read-only afterwards
//! - [`Gate`]: precondition predicates that proceed, skip, or fail a case
//! - [`HarnessSettings`]: how the harness drives the engine (`TF_ACC`,
//!   engine binary, provider location, timeouts)
//!
//! ## Region
//!
//! The region is either given directly or derived from the project name
//! (`eu-de_myproject` → `eu-de`). A registry without either fails to
//! initialise.

mod error;
mod gates;
mod keys;
mod macros;
mod registry;
mod settings;

pub use error::EnvError;
pub use gates::{Feature, Gate, GateOutcome, REQUIRED_KEYS};
pub use keys::{EnvFlag, EnvKey};
pub use registry::EnvRegistry;
pub use settings::{HarnessSettings, DEFAULT_STEP_TIMEOUT};
