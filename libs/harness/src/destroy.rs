//! Destroy verification.
//!
//! After teardown every managed resource of a verified kind must be gone:
//! the probe has to answer "not found", or report a status the kind declares
//! terminal. Kinds without a declared terminal set have no such exception.

use std::collections::BTreeSet;

use otc_acc_state::StateSnapshot;
use tracing::{debug, info, warn};

use crate::error::{Residual, ResidualReason};
use crate::kinds::lookup_kind;
use crate::probe::{live_status, CloudProbe};

/// Which kinds a verifier owns.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    /// Every kind in the final state that has a probe.
    Touched,
    /// Exactly these kinds; one without a probe is a residual.
    Kinds(BTreeSet<String>),
}

/// Confirms that destroyed resources are absent from the cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyVerifier {
    scope: Scope,
}

impl DestroyVerifier {
    /// Verify every probeable kind the case touched.
    pub fn touched() -> Self {
        Self {
            scope: Scope::Touched,
        }
    }

    /// Verify only the named kinds.
    pub fn kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: Scope::Kinds(kinds.into_iter().map(Into::into).collect()),
        }
    }

    /// Probe every owned resource in `snapshot`.
    ///
    /// Returns the resources that are not confirmed destroyed, in address
    /// order. An empty list is a clean teardown.
    pub async fn verify(&self, snapshot: &StateSnapshot, probe: &dyn CloudProbe) -> Vec<Residual> {
        let kinds: Vec<String> = match &self.scope {
            Scope::Touched => snapshot
                .managed_kinds()
                .into_iter()
                .filter(|kind| {
                    let known = lookup_kind(kind).is_some();
                    if !known {
                        debug!(%kind, "no destroy probe for kind, skipping");
                    }
                    known
                })
                .map(str::to_string)
                .collect(),
            Scope::Kinds(kinds) => kinds.iter().cloned().collect(),
        };

        let mut residuals = Vec::new();
        for kind in &kinds {
            let spec = lookup_kind(kind);
            for resource in snapshot.managed_of_kind(kind) {
                let residual = |reason| Residual {
                    address: resource.address.clone(),
                    kind: kind.clone(),
                    id: resource.primary_id().map(str::to_string),
                    reason,
                };

                let Some(spec) = spec else {
                    residuals.push(residual(ResidualReason::UnknownKind));
                    continue;
                };

                match probe.fetch(resource).await {
                    Err(e) if e.is_not_found() => {
                        debug!(address = %resource.address, "confirmed destroyed");
                    }
                    Err(e) => {
                        warn!(address = %resource.address, error = %e, "destroy probe failed");
                        residuals.push(residual(ResidualReason::ProbeFailed(e.to_string())));
                    }
                    Ok(object) => {
                        let status = live_status(spec, &object);
                        if spec.is_terminal(status.as_deref()) {
                            info!(
                                address = %resource.address,
                                status = status.as_deref().unwrap_or_default(),
                                "object present in terminal status, counted as destroyed"
                            );
                        } else {
                            warn!(address = %resource.address, ?status, "object still exists");
                            residuals.push(residual(ResidualReason::StillPresent { status }));
                        }
                    }
                }
            }
        }
        residuals
    }
}

impl Default for DestroyVerifier {
    fn default() -> Self {
        Self::touched()
    }
}
