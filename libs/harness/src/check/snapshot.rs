//! Checks answered from the state snapshot alone.

use async_trait::async_trait;
use regex::Regex;

use super::{Check, CheckContext};
use crate::error::CheckError;

struct Exists {
    address: String,
}

/// The resource is in state and has a non-empty primary identity.
pub fn exists(address: impl Into<String>) -> Box<dyn Check> {
    Box::new(Exists {
        address: address.into(),
    })
}

#[async_trait]
impl Check for Exists {
    fn describe(&self) -> String {
        format!("exists({})", self.address)
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let resource = ctx.resource(&self.address)?;
        match resource.primary_id() {
            Some(id) if !id.is_empty() => Ok(()),
            _ => Err(CheckError::EmptyPrimaryIdentity {
                address: self.address.clone(),
            }),
        }
    }
}

enum Expectation {
    Equals(String),
    Matches(Result<Regex, String>, String),
    Set,
    Absent,
}

struct Attr {
    address: String,
    path: String,
    expect: Expectation,
}

/// The attribute equals `expected` byte-for-byte.
pub fn attr_equals(
    address: impl Into<String>,
    path: impl Into<String>,
    expected: impl Into<String>,
) -> Box<dyn Check> {
    Box::new(Attr {
        address: address.into(),
        path: path.into(),
        expect: Expectation::Equals(expected.into()),
    })
}

/// The attribute matches `pattern` (unanchored, as a search).
///
/// An invalid pattern fails the check when it runs.
pub fn attr_matches(
    address: impl Into<String>,
    path: impl Into<String>,
    pattern: &str,
) -> Box<dyn Check> {
    Box::new(Attr {
        address: address.into(),
        path: path.into(),
        expect: Expectation::Matches(
            Regex::new(pattern).map_err(|e| e.to_string()),
            pattern.to_string(),
        ),
    })
}

/// The attribute is present and non-empty.
pub fn attr_set(address: impl Into<String>, path: impl Into<String>) -> Box<dyn Check> {
    Box::new(Attr {
        address: address.into(),
        path: path.into(),
        expect: Expectation::Set,
    })
}

/// The attribute is absent or empty.
pub fn attr_absent(address: impl Into<String>, path: impl Into<String>) -> Box<dyn Check> {
    Box::new(Attr {
        address: address.into(),
        path: path.into(),
        expect: Expectation::Absent,
    })
}

#[async_trait]
impl Check for Attr {
    fn describe(&self) -> String {
        let (name, arg) = match &self.expect {
            Expectation::Equals(v) => ("attr_equals", format!(", {v:?}")),
            Expectation::Matches(_, p) => ("attr_matches", format!(", /{p}/")),
            Expectation::Set => ("attr_set", String::new()),
            Expectation::Absent => ("attr_absent", String::new()),
        };
        format!("{name}({}, {}{arg})", self.address, self.path)
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let resource = ctx.resource(&self.address)?;
        let observed = resource.attr(&self.path);
        let missing = || CheckError::AttributeMissing {
            address: self.address.clone(),
            path: self.path.clone(),
        };

        match &self.expect {
            Expectation::Equals(expected) => {
                let observed = observed.ok_or_else(missing)?;
                if observed == expected {
                    Ok(())
                } else {
                    Err(CheckError::AttributeMismatch {
                        address: self.address.clone(),
                        path: self.path.clone(),
                        observed: observed.to_string(),
                        expected: expected.clone(),
                    })
                }
            }
            Expectation::Matches(regex, pattern) => {
                let regex = regex.as_ref().map_err(|message| CheckError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: message.clone(),
                })?;
                let observed = observed.ok_or_else(missing)?;
                if regex.is_match(observed) {
                    Ok(())
                } else {
                    Err(CheckError::PatternMismatch {
                        address: self.address.clone(),
                        path: self.path.clone(),
                        observed: observed.to_string(),
                        pattern: pattern.clone(),
                    })
                }
            }
            Expectation::Set => match observed {
                None => Err(missing()),
                Some("") => Err(CheckError::AttributeEmpty {
                    address: self.address.clone(),
                    path: self.path.clone(),
                }),
                Some(_) => Ok(()),
            },
            Expectation::Absent => match observed {
                None | Some("") => Ok(()),
                Some(value) => Err(CheckError::AttributeMismatch {
                    address: self.address.clone(),
                    path: self.path.clone(),
                    observed: value.to_string(),
                    expected: String::new(),
                }),
            },
        }
    }
}

struct Pair {
    address_a: String,
    path_a: String,
    address_b: String,
    path_b: String,
}

/// Two attributes, possibly on different resources, are equal and set.
pub fn attr_pair(
    address_a: impl Into<String>,
    path_a: impl Into<String>,
    address_b: impl Into<String>,
    path_b: impl Into<String>,
) -> Box<dyn Check> {
    Box::new(Pair {
        address_a: address_a.into(),
        path_a: path_a.into(),
        address_b: address_b.into(),
        path_b: path_b.into(),
    })
}

#[async_trait]
impl Check for Pair {
    fn describe(&self) -> String {
        format!(
            "attr_pair({}.{}, {}.{})",
            self.address_a, self.path_a, self.address_b, self.path_b
        )
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        let a = ctx.resource(&self.address_a)?.attr(&self.path_a);
        let b = ctx.resource(&self.address_b)?.attr(&self.path_b);
        match (a, b) {
            (Some(a), Some(b)) if a == b => Ok(()),
            _ => Err(CheckError::PairMismatch {
                address_a: self.address_a.clone(),
                path_a: self.path_a.clone(),
                value_a: a.map(str::to_string),
                address_b: self.address_b.clone(),
                path_b: self.path_b.clone(),
                value_b: b.map(str::to_string),
            }),
        }
    }
}
