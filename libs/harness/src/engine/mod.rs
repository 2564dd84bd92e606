//! Infrastructure engine interface.
//!
//! The harness never talks to the provider plugin directly. It hands rendered
//! documents to an [`Engine`] and reads back the state the engine recorded.
//! [`TerraformCli`] drives the real binary; the runner tests use a scripted
//! implementation.

mod terraform;
mod workspace;

use async_trait::async_trait;
use otc_acc_state::StateSnapshot;
use serde_json::Value;

use crate::error::EngineError;

pub use terraform::TerraformCli;
pub use workspace::{WorkRoot, Workspace, CONFIG_FILE};

/// Outcome of a successful dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    /// Whether the plan proposes any change.
    pub has_changes: bool,
    /// Human-readable plan output.
    pub output: String,
}

impl PlanSummary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_changes(output: impl Into<String>) -> Self {
        Self {
            has_changes: true,
            output: output.into(),
        }
    }
}

/// Engine operations the harness relies on.
///
/// Every call targets one [`Workspace`]: its configuration file and its
/// state live in the workspace directory.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Machine-readable provider schemas for the workspace's providers.
    async fn provider_schema(&self, workspace: &Workspace) -> Result<Value, EngineError>;

    /// Prepare the workspace (provider installation, backend).
    async fn init(&self, workspace: &Workspace) -> Result<(), EngineError>;

    /// Converge on the configuration and return the resulting state.
    async fn apply(&self, workspace: &Workspace) -> Result<StateSnapshot, EngineError>;

    /// Dry-run the configuration against current state.
    async fn plan(&self, workspace: &Workspace) -> Result<PlanSummary, EngineError>;

    /// Adopt an existing object into state under `address`.
    async fn import(
        &self,
        workspace: &Workspace,
        address: &str,
        id: &str,
    ) -> Result<StateSnapshot, EngineError>;

    /// Current state without changing anything.
    async fn state(&self, workspace: &Workspace) -> Result<StateSnapshot, EngineError>;

    /// Destroy everything in state.
    async fn destroy(&self, workspace: &Workspace) -> Result<(), EngineError>;
}
