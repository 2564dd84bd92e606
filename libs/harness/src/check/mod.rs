//! Check combinators.
//!
//! A check is a predicate over the state an apply step left behind. Checks
//! in a step run in declaration order and the first failure ends the step.
//!
//! Snapshot checks ([`exists`], [`attr_equals`], [`attr_matches`],
//! [`attr_set`], [`attr_pair`]) never leave the process. [`back_read`] and
//! [`tag`] go to the cloud through the case's [`CloudProbe`]. A back-read can
//! [`bind`](BackRead::bind) the live object into the step's [`Scratchpad`];
//! later checks in the same step read it by name with [`scratch_field`].

mod back_read;
mod snapshot;
mod tags;

use std::collections::BTreeMap;

use async_trait::async_trait;
use otc_acc_state::{ResourceState, StateSnapshot};
use serde_json::Value;

use crate::error::CheckError;
use crate::probe::CloudProbe;

pub use back_read::{back_read, scratch_field, BackRead, FetchFn};
pub use snapshot::{attr_absent, attr_equals, attr_matches, attr_pair, attr_set, exists};
pub use tags::{tag, tags, TagCheck};

/// Objects bound by back-reads during one step.
#[derive(Debug, Clone, Default)]
pub struct Scratchpad {
    entries: BTreeMap<String, Value>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a check can see.
pub struct CheckContext<'a> {
    pub state: &'a StateSnapshot,
    pub probe: &'a dyn CloudProbe,
    pub scratch: &'a mut Scratchpad,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        state: &'a StateSnapshot,
        probe: &'a dyn CloudProbe,
        scratch: &'a mut Scratchpad,
    ) -> Self {
        Self {
            state,
            probe,
            scratch,
        }
    }

    /// The resource at `address`, or [`CheckError::NotInState`].
    pub fn resource(&self, address: &str) -> Result<&'a ResourceState, CheckError> {
        self.state
            .get(address)
            .ok_or_else(|| CheckError::NotInState {
                address: address.to_string(),
            })
    }
}

/// A predicate over post-apply state.
#[async_trait]
pub trait Check: Send + Sync {
    /// Short description used in reports, e.g. `exists(opentelekomcloud_vpc_v1.vpc_1)`.
    fn describe(&self) -> String;

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError>;

    fn boxed(self) -> Box<dyn Check>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

#[async_trait]
impl Check for Box<dyn Check> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        (**self).run(ctx).await
    }
}

/// Every check in order; stops at the first failure.
pub struct All {
    checks: Vec<Box<dyn Check>>,
}

/// Combine checks into one.
pub fn all(checks: Vec<Box<dyn Check>>) -> Box<dyn Check> {
    Box::new(All { checks })
}

#[async_trait]
impl Check for All {
    fn describe(&self) -> String {
        let inner: Vec<String> = self.checks.iter().map(|c| c.describe()).collect();
        format!("all({})", inner.join(", "))
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        for check in &self.checks {
            check.run(ctx).await?;
        }
        Ok(())
    }
}
