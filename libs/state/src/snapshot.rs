//! State snapshots.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::StateError;
use crate::flatmap::flatten;

/// Whether a resource is managed or read through a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceMode {
    Managed,
    Data,
}

/// One resource instance in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState {
    /// Full address, e.g. `opentelekomcloud_vpc_v1.vpc_1`.
    pub address: String,
    /// Resource type, e.g. `opentelekomcloud_vpc_v1`.
    pub kind: String,
    /// Local name, e.g. `vpc_1`.
    pub name: String,
    pub mode: ResourceMode,
    /// Flattened attributes.
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    /// Build a resource from an address and flat attributes.
    ///
    /// # Errors
    ///
    /// Fails when the address has no `type.name` part.
    pub fn new<I, K, V>(address: impl Into<String>, attributes: I) -> Result<Self, StateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let address = address.into();
        let (mode, kind, name) = split_address(&address)?;
        Ok(Self {
            kind,
            name,
            mode,
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            address,
        })
    }

    /// The primary identity (`id` attribute), if present.
    pub fn primary_id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// A flat attribute by path.
    pub fn attr(&self, path: &str) -> Option<&str> {
        self.attributes.get(path).map(String::as_str)
    }

    /// Returns true for managed resources.
    pub fn is_managed(&self) -> bool {
        self.mode == ResourceMode::Managed
    }
}

/// The engine's view of the world after an apply or import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    resources: BTreeMap<String, ResourceState>,
}

#[derive(Debug, Deserialize)]
struct ShowDocument {
    #[serde(default)]
    values: Option<ShowValues>,
}

#[derive(Debug, Deserialize)]
struct ShowValues {
    root_module: ShowModule,
}

#[derive(Debug, Deserialize)]
struct ShowModule {
    #[serde(default)]
    resources: Vec<ShowResource>,
    #[serde(default)]
    child_modules: Vec<ShowModule>,
}

#[derive(Debug, Deserialize)]
struct ShowResource {
    address: Option<String>,
    #[serde(default)]
    values: Value,
}

impl StateSnapshot {
    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the JSON printed by the engine's `show -json`.
    ///
    /// # Errors
    ///
    /// Fails on invalid JSON or resources without an address.
    pub fn from_show_json(document: &str) -> Result<Self, StateError> {
        let doc: ShowDocument = serde_json::from_str(document)?;
        let mut snapshot = Self::empty();
        if let Some(values) = doc.values {
            snapshot.collect_module(values.root_module)?;
        }
        Ok(snapshot)
    }

    fn collect_module(&mut self, module: ShowModule) -> Result<(), StateError> {
        for resource in module.resources {
            let address = resource
                .address
                .ok_or(StateError::MissingField { field: "address" })?;
            let state = ResourceState::new(address, flatten(&resource.values))?;
            self.insert(state);
        }
        for child in module.child_modules {
            self.collect_module(child)?;
        }
        Ok(())
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, resource: ResourceState) {
        self.resources.insert(resource.address.clone(), resource);
    }

    /// Look a resource up by address.
    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    /// Every managed instance of a resource type.
    pub fn managed_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ResourceState> {
        self.resources
            .values()
            .filter(move |r| r.is_managed() && r.kind == kind)
    }

    /// Distinct managed resource types, sorted.
    pub fn managed_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self
            .resources
            .values()
            .filter(|r| r.is_managed())
            .map(|r| r.kind.as_str())
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceState> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn split_address(address: &str) -> Result<(ResourceMode, String, String), StateError> {
    let invalid = || StateError::InvalidAddress(address.to_string());

    let mut parts: Vec<&str> = address.split('.').collect();
    // Drop `module.<name>` pairs.
    while parts.first() == Some(&"module") {
        if parts.len() < 2 {
            return Err(invalid());
        }
        parts.drain(..2);
    }
    let mode = if parts.first() == Some(&"data") {
        parts.remove(0);
        ResourceMode::Data
    } else {
        ResourceMode::Managed
    };
    match parts.as_slice() {
        [kind, name] if !kind.is_empty() && !name.is_empty() => {
            let name = name.split('[').next().unwrap_or(*name);
            Ok((mode, kind.to_string(), name.to_string()))
        }
        _ => Err(invalid()),
    }
}
