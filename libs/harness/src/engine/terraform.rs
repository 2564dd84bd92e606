//! Engine driver for the `terraform` command line.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use otc_acc_state::StateSnapshot;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::{Engine, PlanSummary, Workspace};
use crate::error::EngineError;

/// Exit code `plan -detailed-exitcode` uses for "changes present".
const PLAN_HAS_CHANGES: i32 = 2;

struct Captured {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Drives the engine binary as a child process.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: PathBuf,
}

impl TerraformCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn run(&self, workspace: &Workspace, args: &[&str]) -> Result<Captured, EngineError> {
        debug!(
            binary = %self.binary.display(),
            dir = %workspace.dir().display(),
            args = %args.join(" "),
            "running engine"
        );

        // Dropping the future (timeout) kills the child.
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(workspace.dir())
            .envs(workspace.env())
            .env("TF_IN_AUTOMATION", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        Ok(Captured {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run_ok(&self, workspace: &Workspace, args: &[&str]) -> Result<String, EngineError> {
        let captured = self.run(workspace, args).await?;
        if captured.code == Some(0) {
            Ok(captured.stdout)
        } else {
            Err(command_failed(args, captured))
        }
    }
}

fn command_failed(args: &[&str], captured: Captured) -> EngineError {
    let stderr = if captured.stderr.trim().is_empty() {
        captured.stdout
    } else {
        captured.stderr
    };
    EngineError::Command {
        command: format!("terraform {}", args.join(" ")),
        code: captured.code,
        stderr: stderr.trim().to_string(),
    }
}

#[async_trait]
impl Engine for TerraformCli {
    async fn provider_schema(&self, workspace: &Workspace) -> Result<Value, EngineError> {
        let stdout = self
            .run_ok(workspace, &["providers", "schema", "-json"])
            .await?;
        serde_json::from_str(&stdout).map_err(|e| EngineError::Output(e.to_string()))
    }

    #[instrument(skip_all, fields(dir = %workspace.dir().display()))]
    async fn init(&self, workspace: &Workspace) -> Result<(), EngineError> {
        self.run_ok(workspace, &["init", "-input=false", "-no-color"])
            .await
            .map(drop)
    }

    #[instrument(skip_all, fields(dir = %workspace.dir().display()))]
    async fn apply(&self, workspace: &Workspace) -> Result<StateSnapshot, EngineError> {
        self.run_ok(
            workspace,
            &["apply", "-auto-approve", "-input=false", "-no-color"],
        )
        .await?;
        self.state(workspace).await
    }

    #[instrument(skip_all, fields(dir = %workspace.dir().display()))]
    async fn plan(&self, workspace: &Workspace) -> Result<PlanSummary, EngineError> {
        let args = [
            "plan",
            "-detailed-exitcode",
            "-input=false",
            "-no-color",
            "-lock=false",
        ];
        let captured = self.run(workspace, &args).await?;
        match captured.code {
            Some(0) => Ok(PlanSummary {
                has_changes: false,
                output: captured.stdout,
            }),
            Some(PLAN_HAS_CHANGES) => Ok(PlanSummary::with_changes(captured.stdout)),
            _ => Err(command_failed(&args, captured)),
        }
    }

    #[instrument(skip(self, workspace), fields(dir = %workspace.dir().display()))]
    async fn import(
        &self,
        workspace: &Workspace,
        address: &str,
        id: &str,
    ) -> Result<StateSnapshot, EngineError> {
        self.run_ok(
            workspace,
            &["import", "-input=false", "-no-color", address, id],
        )
        .await?;
        self.state(workspace).await
    }

    async fn state(&self, workspace: &Workspace) -> Result<StateSnapshot, EngineError> {
        let stdout = self.run_ok(workspace, &["show", "-json", "-no-color"]).await?;
        Ok(StateSnapshot::from_show_json(&stdout)?)
    }

    #[instrument(skip_all, fields(dir = %workspace.dir().display()))]
    async fn destroy(&self, workspace: &Workspace) -> Result<(), EngineError> {
        let result = self
            .run_ok(
                workspace,
                &["destroy", "-auto-approve", "-input=false", "-no-color"],
            )
            .await;
        if let Err(e) = &result {
            warn!(error = %e, "destroy failed");
        }
        result.map(drop)
    }
}
