//! Tag checks for resources whose tags live behind a separate API.

use async_trait::async_trait;

use super::{Check, CheckContext};
use crate::error::CheckError;

/// Every listed `(key, value)` pair is attached to the live object, and
/// none of the [`without`](TagCheck::without) keys is.
pub struct TagCheck {
    address: String,
    expected: Vec<(String, String)>,
    absent: Vec<String>,
}

impl TagCheck {
    /// Also require that `keys` are no longer attached, e.g. after the tag
    /// map was replaced.
    #[must_use]
    pub fn without<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.absent.extend(keys.into_iter().map(Into::into));
        self
    }
}

/// One tag pair.
pub fn tag(
    address: impl Into<String>,
    key: impl Into<String>,
    value: impl Into<String>,
) -> TagCheck {
    TagCheck {
        address: address.into(),
        expected: vec![(key.into(), value.into())],
        absent: Vec::new(),
    }
}

/// Several tag pairs, read with one request.
pub fn tags<I, K, V>(address: impl Into<String>, pairs: I) -> TagCheck
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    TagCheck {
        address: address.into(),
        expected: pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
        absent: Vec::new(),
    }
}

#[async_trait]
impl Check for TagCheck {
    fn describe(&self) -> String {
        let pairs: Vec<String> = self
            .expected
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .chain(self.absent.iter().map(|k| format!("!{k}")))
            .collect();
        format!("tags({}, {})", self.address, pairs.join(", "))
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let resource = ctx.resource(&self.address)?;
        let live = ctx
            .probe
            .tags(resource)
            .await
            .map_err(|e| CheckError::from_probe(&self.address, e))?;

        for (key, expected) in &self.expected {
            match live.get(key) {
                None => {
                    return Err(CheckError::TagMissing {
                        address: self.address.clone(),
                        key: key.clone(),
                    })
                }
                Some(observed) if observed != expected => {
                    return Err(CheckError::TagMismatch {
                        address: self.address.clone(),
                        key: key.clone(),
                        observed: observed.clone(),
                        expected: expected.clone(),
                    })
                }
                Some(_) => {}
            }
        }
        if let Some((key, observed)) = self
            .absent
            .iter()
            .find_map(|key| live.get(key).map(|v| (key, v)))
        {
            return Err(CheckError::TagPresent {
                address: self.address.clone(),
                key: key.clone(),
                observed: observed.clone(),
            });
        }
        Ok(())
    }
}
