//! Scripted engine and probe for runner tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use otc_acc_harness::{
    CloudProbe, EngineError, EnvRegistry, Harness, HarnessSettings, PlanSummary, ProbeError,
    Workspace,
};
use otc_acc_sdk::{ApiVersion, SdkError, Service, ServiceClient};
use otc_acc_state::{ResourceState, StateSnapshot};
use serde_json::{json, Value};

pub const FULL_ENV: &[(&str, &str)] = &[
    ("OS_AUTH_URL", "https://iam.eu-de.otc.t-systems.com/v3"),
    ("OS_REGION_NAME", "eu-de"),
    ("OS_POOL_NAME", "admin_external_net"),
    ("OS_VPC_ID", "vpc-shared"),
    ("OS_SUBNET_ID", "subnet-shared"),
    ("OS_NETWORK_ID", "net-shared"),
    ("OS_AVAILABILITY_ZONE", "eu-de-01"),
    ("OS_EXTGW_ID", "ext-1"),
    ("OS_FLAVOR_NAME", "s2.medium.1"),
];

pub fn registry() -> Arc<EnvRegistry> {
    Arc::new(EnvRegistry::from_pairs(FULL_ENV.iter().copied()).unwrap())
}

pub fn enabled() -> HarnessSettings {
    HarnessSettings {
        acceptance_enabled: true,
        ..HarnessSettings::default()
    }
}

pub fn harness(engine: &Arc<ScriptedEngine>, probe: &Arc<ScriptedProbe>) -> Harness {
    harness_with(registry(), enabled(), engine, probe)
}

pub fn harness_with(
    registry: Arc<EnvRegistry>,
    settings: HarnessSettings,
    engine: &Arc<ScriptedEngine>,
    probe: &Arc<ScriptedProbe>,
) -> Harness {
    let probe: Arc<dyn CloudProbe> = probe.clone();
    Harness::with_engine(registry, settings, engine.clone()).with_probe(probe)
}

pub fn resource(address: &str, attrs: &[(&str, &str)]) -> ResourceState {
    ResourceState::new(address, attrs.iter().copied()).unwrap()
}

pub fn snapshot(resources: Vec<ResourceState>) -> StateSnapshot {
    let mut snapshot = StateSnapshot::empty();
    for resource in resources {
        snapshot.insert(resource);
    }
    snapshot
}

fn command_error(command: &str, stderr: &str) -> EngineError {
    EngineError::Command {
        command: format!("terraform {command}"),
        code: Some(1),
        stderr: stderr.to_string(),
    }
}

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    planned: Vec<String>,
    state: StateSnapshot,
    applies: VecDeque<Result<StateSnapshot, String>>,
    plans: VecDeque<Result<PlanSummary, String>>,
    imports: VecDeque<StateSnapshot>,
    destroy_failures: usize,
    apply_delay: Option<Duration>,
}

/// An engine that replays queued results and records every call as
/// `operation:workspace`.
#[derive(Default)]
pub struct ScriptedEngine {
    script: Mutex<Script>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_apply(&self, result: Result<StateSnapshot, &str>) {
        self.script
            .lock()
            .unwrap()
            .applies
            .push_back(result.map_err(str::to_string));
    }

    pub fn on_plan(&self, result: Result<PlanSummary, &str>) {
        self.script
            .lock()
            .unwrap()
            .plans
            .push_back(result.map_err(str::to_string));
    }

    pub fn on_import(&self, snapshot: StateSnapshot) {
        self.script.lock().unwrap().imports.push_back(snapshot);
    }

    pub fn fail_destroys(&self, count: usize) {
        self.script.lock().unwrap().destroy_failures = count;
    }

    pub fn delay_apply(&self, delay: Duration) {
        self.script.lock().unwrap().apply_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Configuration documents seen by `plan`, in call order.
    pub fn planned_documents(&self) -> Vec<String> {
        self.script.lock().unwrap().planned.clone()
    }

    /// Calls against one workspace, without the workspace suffix.
    pub fn calls_on(&self, workspace: &str) -> Vec<String> {
        let suffix = format!(":{workspace}");
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_suffix(&suffix).map(str::to_string))
            .collect()
    }

    fn record(&self, operation: &str, workspace: &Workspace) {
        let name = workspace
            .dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.script
            .lock()
            .unwrap()
            .calls
            .push(format!("{operation}:{name}"));
    }
}

#[async_trait]
impl otc_acc_harness::Engine for ScriptedEngine {
    async fn provider_schema(&self, workspace: &Workspace) -> Result<Value, EngineError> {
        self.record("schema", workspace);
        Ok(json!({
            "provider_schemas": {
                "registry.terraform.io/opentelekomcloud/opentelekomcloud": {
                    "resource_schemas": {
                        "opentelekomcloud_vpc_v1": {},
                        "opentelekomcloud_dds_instance_v3": {},
                        "opentelekomcloud_compute_instance_v2": {}
                    }
                }
            }
        }))
    }

    async fn init(&self, workspace: &Workspace) -> Result<(), EngineError> {
        self.record("init", workspace);
        Ok(())
    }

    async fn apply(&self, workspace: &Workspace) -> Result<StateSnapshot, EngineError> {
        self.record("apply", workspace);
        let delay = self.script.lock().unwrap().apply_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.script.lock().unwrap();
        match script.applies.pop_front() {
            Some(Ok(snapshot)) => {
                script.state = snapshot.clone();
                Ok(snapshot)
            }
            Some(Err(stderr)) => Err(command_error("apply", &stderr)),
            None => Ok(script.state.clone()),
        }
    }

    async fn plan(&self, workspace: &Workspace) -> Result<PlanSummary, EngineError> {
        self.record("plan", workspace);
        let document = workspace.read_config()?.unwrap_or_default();
        let mut script = self.script.lock().unwrap();
        script.planned.push(document);
        match script.plans.pop_front() {
            Some(Ok(plan)) => Ok(plan),
            Some(Err(stderr)) => Err(command_error("plan", &stderr)),
            None => Ok(PlanSummary::empty()),
        }
    }

    async fn import(
        &self,
        workspace: &Workspace,
        address: &str,
        _id: &str,
    ) -> Result<StateSnapshot, EngineError> {
        self.record("import", workspace);
        self.script
            .lock()
            .unwrap()
            .imports
            .pop_front()
            .ok_or_else(|| {
                let stderr = format!("Cannot import non-existent remote object {address}");
                command_error("import", &stderr)
            })
    }

    async fn state(&self, workspace: &Workspace) -> Result<StateSnapshot, EngineError> {
        self.record("state", workspace);
        Ok(self.script.lock().unwrap().state.clone())
    }

    async fn destroy(&self, workspace: &Workspace) -> Result<(), EngineError> {
        self.record("destroy", workspace);
        let mut script = self.script.lock().unwrap();
        if script.destroy_failures > 0 {
            script.destroy_failures -= 1;
            return Err(command_error(
                "destroy",
                "Error: timeout while waiting for state to become 'DELETED'",
            ));
        }
        script.state = StateSnapshot::empty();
        Ok(())
    }
}

/// A probe over a fixed set of live objects, keyed by state address.
#[derive(Default)]
pub struct ScriptedProbe {
    objects: Mutex<BTreeMap<String, Value>>,
    tags: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    fetches: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_object(&self, address: &str, object: Value) {
        self.objects
            .lock()
            .unwrap()
            .insert(address.to_string(), object);
    }

    pub fn with_tags(&self, address: &str, tags: &[(&str, &str)]) {
        self.tags.lock().unwrap().insert(
            address.to_string(),
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    fn not_found(address: &str) -> ProbeError {
        ProbeError::Sdk(SdkError::NotFound {
            url: format!("scripted://{address}"),
        })
    }
}

#[async_trait]
impl CloudProbe for ScriptedProbe {
    async fn fetch(&self, resource: &ResourceState) -> Result<Value, ProbeError> {
        self.fetches.lock().unwrap().push(resource.address.clone());
        self.objects
            .lock()
            .unwrap()
            .get(&resource.address)
            .cloned()
            .ok_or_else(|| Self::not_found(&resource.address))
    }

    async fn tags(&self, resource: &ResourceState) -> Result<BTreeMap<String, String>, ProbeError> {
        self.tags
            .lock()
            .unwrap()
            .get(&resource.address)
            .cloned()
            .ok_or_else(|| Self::not_found(&resource.address))
    }

    async fn client(
        &self,
        _service: Service,
        _version: ApiVersion,
    ) -> Result<ServiceClient, ProbeError> {
        Err(ProbeError::UnknownKind("scripted probe has no clients".into()))
    }
}
