//! Unique resource names.

use rand::distr::Alphanumeric;
use rand::Rng;

const SUFFIX_LEN: usize = 5;

/// `prefix` plus a random lowercase alphanumeric suffix, e.g. `zone_x3k9q`.
///
/// The suffix is lowercase because several services reject upper-case
/// names (DNS zones in particular).
pub fn rand_name(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{prefix}{suffix}")
}
