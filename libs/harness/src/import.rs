//! Import verification.

use otc_acc_state::{diff_attributes, AttributeDiff, ResourceState};

use crate::kinds::{lookup_kind, CloudObjectHandle};

/// Which identity to hand to the engine's import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportIdentity {
    /// The kind's natural identity: `{parent_id}/{child_id}` for nested
    /// kinds, the primary id otherwise.
    Primary,
    /// Attribute values joined with `/`, e.g. `["instance_id", "id"]`.
    Composite(Vec<String>),
    /// A fixed identity.
    Literal(String),
}

impl ImportIdentity {
    /// Resolve against the pre-import resource.
    ///
    /// # Errors
    ///
    /// Returns a description of the missing attribute.
    pub fn resolve(&self, resource: &ResourceState) -> Result<String, String> {
        let attr = |path: &str| {
            resource
                .attr(path)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| format!("{}: attribute {path} is not set", resource.address))
        };

        match self {
            ImportIdentity::Primary => match lookup_kind(&resource.kind) {
                Some(spec) => CloudObjectHandle::locate(spec.locator, resource)
                    .map(|h| h.import_id())
                    .map_err(|e| e.to_string()),
                None => attr("id"),
            },
            ImportIdentity::Composite(paths) => {
                let parts = paths
                    .iter()
                    .map(|p| attr(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(parts.join("/"))
            }
            ImportIdentity::Literal(id) => Ok(id.clone()),
        }
    }
}

/// Compare a resource before and after import, eliding `ignore` paths.
pub fn import_diff(
    before: &ResourceState,
    after: &ResourceState,
    ignore: &[String],
) -> Vec<AttributeDiff> {
    diff_attributes(&before.attributes, &after.attributes, ignore)
}
