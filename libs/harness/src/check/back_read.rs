//! Back-reads: confirm state against the live object.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use otc_acc_sdk::{ApiVersion, SdkError, Service, ServiceClient};
use serde_json::Value;

use super::{Check, CheckContext};
use crate::error::{CheckError, ProbeError};
use crate::kinds::{lookup_kind, CloudObjectHandle, Locator};

/// A caller-supplied fetch: given a client for the declared service and the
/// object's handle, return the live object.
pub type FetchFn = Arc<
    dyn Fn(ServiceClient, CloudObjectHandle) -> BoxFuture<'static, Result<Value, SdkError>>
        + Send
        + Sync,
>;

type AssertFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

struct Assertion {
    description: String,
    check: AssertFn,
}

struct CustomFetch {
    service: Service,
    version: ApiVersion,
    fetch: FetchFn,
}

/// Read the live object behind `address`.
///
/// By default the object is fetched through the kind table. The read fails
/// with [`CheckError::BackReadNotFound`] when the object is gone and with
/// [`CheckError::BackReadTransport`] for every other read failure.
pub struct BackRead {
    address: String,
    bind: Option<String>,
    assertions: Vec<Assertion>,
    fetch: Option<CustomFetch>,
}

/// Start a back-read of `address`.
pub fn back_read(address: impl Into<String>) -> BackRead {
    BackRead {
        address: address.into(),
        bind: None,
        assertions: Vec::new(),
        fetch: None,
    }
}

impl BackRead {
    /// Store the live object in the step's scratchpad under `name`.
    ///
    /// Later checks in the same step read it with [`scratch_field`].
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>) -> Self {
        self.bind = Some(name.into());
        self
    }

    /// Assert a property of the live object.
    #[must_use]
    pub fn assert<F>(mut self, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.assertions.push(Assertion {
            description: description.into(),
            check: Arc::new(check),
        });
        self
    }

    /// Assert that the scalar at a JSON `pointer` renders as `expected`.
    #[must_use]
    pub fn field(self, pointer: impl Into<String>, expected: impl Into<String>) -> Self {
        let pointer = pointer.into();
        let expected = expected.into();
        let description = format!("{pointer} == {expected:?}");
        self.assert(description, move |object| {
            let observed = object.pointer(&pointer).map(scalar);
            if observed.as_deref() == Some(expected.as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "{pointer}: expected {expected:?}, observed {observed:?}"
                ))
            }
        })
    }

    /// Fetch with a caller-supplied function instead of the kind table.
    #[must_use]
    pub fn with_fetch<F>(mut self, service: Service, version: ApiVersion, fetch: F) -> Self
    where
        F: Fn(ServiceClient, CloudObjectHandle) -> BoxFuture<'static, Result<Value, SdkError>>
            + Send
            + Sync
            + 'static,
    {
        self.fetch = Some(CustomFetch {
            service,
            version,
            fetch: Arc::new(fetch),
        });
        self
    }

    async fn read(&self, ctx: &CheckContext<'_>) -> Result<Value, CheckError> {
        let resource = ctx.resource(&self.address)?;
        let to_check_error = |e: ProbeError| CheckError::from_probe(&self.address, e);

        match &self.fetch {
            None => ctx.probe.fetch(resource).await.map_err(to_check_error),
            Some(custom) => {
                let locator = lookup_kind(&resource.kind).map_or(Locator::Id, |k| k.locator);
                let handle = CloudObjectHandle::locate(locator, resource).map_err(to_check_error)?;
                let client = ctx
                    .probe
                    .client(custom.service, custom.version)
                    .await
                    .map_err(to_check_error)?;
                (custom.fetch)(client, handle)
                    .await
                    .map_err(|e| to_check_error(ProbeError::Sdk(e)))
            }
        }
    }
}

#[async_trait]
impl Check for BackRead {
    fn describe(&self) -> String {
        let mut out = format!("back_read({})", self.address);
        for assertion in &self.assertions {
            out.push_str(&format!(".assert({})", assertion.description));
        }
        if let Some(name) = &self.bind {
            out.push_str(&format!(".bind({name})"));
        }
        out
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let object = self.read(ctx).await?;

        for assertion in &self.assertions {
            (assertion.check)(&object).map_err(|message| CheckError::BackReadAssertion {
                address: self.address.clone(),
                message,
            })?;
        }

        if let Some(name) = &self.bind {
            ctx.scratch.bind(name.clone(), object);
        }
        Ok(())
    }
}

struct ScratchField {
    name: String,
    pointer: String,
    expected: String,
}

/// The object bound under `name` has `expected` at JSON `pointer`.
pub fn scratch_field(
    name: impl Into<String>,
    pointer: impl Into<String>,
    expected: impl Into<String>,
) -> Box<dyn Check> {
    Box::new(ScratchField {
        name: name.into(),
        pointer: pointer.into(),
        expected: expected.into(),
    })
}

#[async_trait]
impl Check for ScratchField {
    fn describe(&self) -> String {
        format!("scratch_field({}, {}, {:?})", self.name, self.pointer, self.expected)
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let object = ctx
            .scratch
            .get(&self.name)
            .ok_or_else(|| CheckError::ScratchMissing {
                name: self.name.clone(),
            })?;
        let observed = object.pointer(&self.pointer).map(scalar);
        if observed.as_deref() == Some(self.expected.as_str()) {
            Ok(())
        } else {
            Err(CheckError::ScratchMismatch {
                name: self.name.clone(),
                pointer: self.pointer.clone(),
                observed,
                expected: self.expected.clone(),
            })
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
