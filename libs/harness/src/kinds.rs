//! Resource kind table.
//!
//! One row per resource type the harness can read back: where the live
//! object lives, how to locate it from state, where its status sits, and
//! which statuses count as "destroyed" for kinds that delete asynchronously.
//! The destroy verifier and the default back-read both resolve through this
//! table; there is no per-case probe wiring.

use otc_acc_sdk::{ApiVersion, Service, TagShape};
use otc_acc_state::ResourceState;

use crate::error::ProbeError;

/// How a live object is located from a state entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// The primary identity.
    Id,
    /// A child under a parent; the parent id comes from `parent_attr`, the
    /// child id is the primary identity.
    Nested { parent_attr: &'static str },
    /// A name attribute instead of an id.
    Name { attr: &'static str },
}

/// How the object is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// `GET` the path; the object sits under the kind's envelope key.
    Get,
    /// `GET` a filtered listing and pick the item whose `id_field` equals
    /// the handle's id. An empty match is "not found".
    ListFilter {
        items_key: &'static str,
        id_field: &'static str,
    },
}

/// A separate tag endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEndpoint {
    pub version: ApiVersion,
    pub path: &'static str,
    pub shape: TagShape,
}

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSpec {
    pub kind: &'static str,
    pub service: Service,
    pub version: ApiVersion,
    /// Path below the versioned prefix. Placeholders: `{id}`, `{parent_id}`,
    /// `{child_id}`, `{name}`, `{project_id}`, `{attr.<path>}`.
    pub path: &'static str,
    pub envelope: Option<&'static str>,
    pub lookup: Lookup,
    pub locator: Locator,
    /// JSON pointer to the status field within the object.
    pub status: Option<&'static str>,
    /// Statuses that mean "deleted" although the object is still returned.
    pub terminal: &'static [&'static str],
    pub tags: Option<TagEndpoint>,
}

impl KindSpec {
    /// Whether a present object with `status` counts as destroyed.
    pub fn is_terminal(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| self.terminal.iter().any(|t| t.eq_ignore_ascii_case(s)))
    }
}

/// Identifier for a live object, derived from state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudObjectHandle {
    Id(String),
    Nested { parent_id: String, child_id: String },
    Name(String),
}

impl CloudObjectHandle {
    /// Locate a state entry's live object.
    ///
    /// # Errors
    ///
    /// Fails when the attribute the locator needs is missing or empty.
    pub fn locate(locator: Locator, resource: &ResourceState) -> Result<Self, ProbeError> {
        let required = |path: &str| {
            resource
                .attr(path)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ProbeError::Locator {
                    address: resource.address.clone(),
                    message: format!("attribute {path} is not set"),
                })
        };
        Ok(match locator {
            Locator::Id => CloudObjectHandle::Id(required("id")?),
            Locator::Nested { parent_attr } => CloudObjectHandle::Nested {
                parent_id: required(parent_attr)?,
                child_id: required("id")?,
            },
            Locator::Name { attr } => CloudObjectHandle::Name(required(attr)?),
        })
    }

    /// The id the handle matches against in listings.
    pub fn id(&self) -> &str {
        match self {
            CloudObjectHandle::Id(id) | CloudObjectHandle::Name(id) => id,
            CloudObjectHandle::Nested { child_id, .. } => child_id,
        }
    }

    /// `{parent_id}/{child_id}` for nested objects, the plain id otherwise.
    pub fn import_id(&self) -> String {
        match self {
            CloudObjectHandle::Nested {
                parent_id,
                child_id,
            } => format!("{parent_id}/{child_id}"),
            other => other.id().to_string(),
        }
    }
}

/// Fill a path template.
///
/// # Errors
///
/// Fails on an unknown placeholder or a referenced attribute that is unset.
pub fn render_path(
    template: &str,
    handle: &CloudObjectHandle,
    resource: &ResourceState,
    project_id: &str,
) -> Result<String, ProbeError> {
    let locator_error = |message: String| ProbeError::Locator {
        address: resource.address.clone(),
        message,
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| locator_error(format!("unterminated placeholder in {template}")))?;
        let name = &after[..end];
        let value = match (name, handle) {
            ("project_id", _) => project_id.to_string(),
            ("id", h) => h.id().to_string(),
            ("name", CloudObjectHandle::Name(n)) => n.clone(),
            ("parent_id", CloudObjectHandle::Nested { parent_id, .. }) => parent_id.clone(),
            ("child_id", CloudObjectHandle::Nested { child_id, .. }) => child_id.clone(),
            (placeholder, _) => match placeholder.strip_prefix("attr.") {
                Some(path) => resource
                    .attr(path)
                    .map(str::to_string)
                    .ok_or_else(|| locator_error(format!("attribute {path} is not set")))?,
                None => {
                    return Err(locator_error(format!(
                        "placeholder {{{placeholder}}} does not apply to {handle:?}"
                    )))
                }
            },
        };
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn vpc_tags(path: &'static str) -> Option<TagEndpoint> {
    Some(TagEndpoint {
        version: ApiVersion::V2_0,
        path,
        shape: TagShape::KeyValueList,
    })
}

/// Every kind the harness can read back.
pub fn kind_table() -> &'static [KindSpec] {
    use std::sync::OnceLock;
    static TABLE: OnceLock<Vec<KindSpec>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn build_table() -> Vec<KindSpec> {
    let row = |kind: &'static str,
               service: Service,
               version: ApiVersion,
               path: &'static str,
               envelope: Option<&'static str>| KindSpec {
        kind,
        service,
        version,
        path,
        envelope,
        lookup: Lookup::Get,
        locator: Locator::Id,
        status: None,
        terminal: &[],
        tags: None,
    };

    vec![
        KindSpec {
            status: Some("/status"),
            tags: vpc_tags("vpcs/{id}/tags"),
            ..row("opentelekomcloud_vpc_v1", Service::Vpc, ApiVersion::V1, "vpcs/{id}", Some("vpc"))
        },
        KindSpec {
            status: Some("/status"),
            tags: vpc_tags("subnets/{id}/tags"),
            ..row(
                "opentelekomcloud_vpc_subnet_v1",
                Service::Vpc,
                ApiVersion::V1,
                "subnets/{id}",
                Some("subnet"),
            )
        },
        KindSpec {
            status: Some("/status"),
            tags: vpc_tags("publicips/{id}/tags"),
            ..row(
                "opentelekomcloud_vpc_eip_v1",
                Service::Vpc,
                ApiVersion::V1,
                "publicips/{id}",
                Some("publicip"),
            )
        },
        KindSpec {
            status: Some("/status"),
            ..row(
                "opentelekomcloud_antiddos_v1",
                Service::AntiDdos,
                ApiVersion::V1,
                "antiddos/{id}",
                None,
            )
        },
        KindSpec {
            status: Some("/status"),
            tags: Some(TagEndpoint {
                version: ApiVersion::V2,
                path: "{project_id}/DNS-{attr.type}_zone/{id}/tags",
                shape: TagShape::KeyValueList,
            }),
            ..row("opentelekomcloud_dns_zone_v2", Service::Dns, ApiVersion::V2, "zones/{id}", None)
        },
        KindSpec {
            status: Some("/status/phase"),
            ..row(
                "opentelekomcloud_cce_cluster_v3",
                Service::Cce,
                ApiVersion::V3,
                "clusters/{id}",
                None,
            )
        },
        KindSpec {
            status: Some("/status"),
            tags: Some(TagEndpoint {
                version: ApiVersion::V2,
                path: "os-vendor-tags/volumes/{id}",
                shape: TagShape::Map,
            }),
            ..row(
                "opentelekomcloud_blockstorage_volume_v2",
                Service::BlockStorage,
                ApiVersion::V2,
                "volumes/{id}",
                Some("volume"),
            )
        },
        KindSpec {
            lookup: Lookup::ListFilter {
                items_key: "instances",
                id_field: "id",
            },
            status: Some("/status"),
            ..row(
                "opentelekomcloud_dds_instance_v3",
                Service::Dds,
                ApiVersion::V3,
                "instances?id={id}",
                None,
            )
        },
        KindSpec {
            status: Some("/status"),
            terminal: &["SOFT_DELETED", "DELETED"],
            tags: Some(TagEndpoint {
                version: ApiVersion::V1,
                path: "cloudservers/{id}/tags",
                shape: TagShape::KeyValueList,
            }),
            ..row(
                "opentelekomcloud_compute_instance_v2",
                Service::Compute,
                ApiVersion::V2_1,
                "servers/{id}",
                Some("server"),
            )
        },
        KindSpec {
            locator: Locator::Name { attr: "name" },
            ..row(
                "opentelekomcloud_compute_keypair_v2",
                Service::Compute,
                ApiVersion::V2_1,
                "os-keypairs/{name}",
                Some("keypair"),
            )
        },
        KindSpec {
            status: Some("/status"),
            ..row(
                "opentelekomcloud_networking_network_v2",
                Service::Network,
                ApiVersion::V2_0,
                "networks/{id}",
                Some("network"),
            )
        },
        KindSpec {
            locator: Locator::Nested {
                parent_attr: "pool_id",
            },
            ..row(
                "opentelekomcloud_lb_member_v2",
                Service::Network,
                ApiVersion::V2_0,
                "lbaas/pools/{parent_id}/members/{child_id}",
                Some("member"),
            )
        },
        KindSpec {
            status: Some("/clusterState"),
            terminal: &["terminated"],
            ..row(
                "opentelekomcloud_mrs_cluster_v1",
                Service::Mrs,
                ApiVersion::V1_1,
                "cluster_infos/{id}",
                Some("cluster"),
            )
        },
    ]
}

/// Look a kind up.
pub fn lookup_kind(kind: &str) -> Option<&'static KindSpec> {
    kind_table().iter().find(|spec| spec.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resource(address: &str, attrs: &[(&str, &str)]) -> ResourceState {
        ResourceState::new(address, attrs.iter().copied()).unwrap()
    }

    #[test]
    fn test_kinds_are_unique() {
        let mut kinds: Vec<_> = kind_table().iter().map(|k| k.kind).collect();
        let total = kinds.len();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), total);
    }

    #[test]
    fn test_every_row_has_a_known_endpoint() {
        for spec in kind_table() {
            assert!(
                spec.service.path_prefix(spec.version).is_ok(),
                "{} uses an unknown version",
                spec.kind
            );
            if let Some(tags) = spec.tags {
                assert!(spec.service.path_prefix(tags.version).is_ok(), "{}", spec.kind);
            }
        }
    }

    #[rstest]
    #[case("opentelekomcloud_compute_instance_v2", Some("SOFT_DELETED"), true)]
    #[case("opentelekomcloud_compute_instance_v2", Some("ACTIVE"), false)]
    #[case("opentelekomcloud_mrs_cluster_v1", Some("terminated"), true)]
    #[case("opentelekomcloud_vpc_v1", Some("OK"), false)]
    #[case("opentelekomcloud_compute_instance_v2", None, false)]
    fn test_terminal_statuses(
        #[case] kind: &str,
        #[case] status: Option<&str>,
        #[case] terminal: bool,
    ) {
        assert_eq!(lookup_kind(kind).unwrap().is_terminal(status), terminal);
    }

    #[test]
    fn test_locate_nested_member() {
        let member = resource(
            "opentelekomcloud_lb_member_v2.member_1",
            &[("id", "m-1"), ("pool_id", "p-9")],
        );
        let spec = lookup_kind("opentelekomcloud_lb_member_v2").unwrap();
        let handle = CloudObjectHandle::locate(spec.locator, &member).unwrap();
        assert_eq!(handle.import_id(), "p-9/m-1");
        assert_eq!(
            render_path(spec.path, &handle, &member, "proj").unwrap(),
            "lbaas/pools/p-9/members/m-1"
        );
    }

    #[test]
    fn test_locate_by_name() {
        let keypair = resource(
            "opentelekomcloud_compute_keypair_v2.kp",
            &[("id", "kp"), ("name", "acc-kp")],
        );
        let spec = lookup_kind("opentelekomcloud_compute_keypair_v2").unwrap();
        let handle = CloudObjectHandle::locate(spec.locator, &keypair).unwrap();
        assert_eq!(handle, CloudObjectHandle::Name("acc-kp".into()));
        assert_eq!(
            render_path(spec.path, &handle, &keypair, "proj").unwrap(),
            "os-keypairs/acc-kp"
        );
    }

    #[test]
    fn test_locate_requires_attribute() {
        let vpc = resource("opentelekomcloud_vpc_v1.vpc_1", &[("id", "")]);
        assert!(matches!(
            CloudObjectHandle::locate(Locator::Id, &vpc),
            Err(ProbeError::Locator { .. })
        ));
    }

    #[test]
    fn test_render_path_with_attributes_and_project() {
        let zone = resource(
            "opentelekomcloud_dns_zone_v2.zone_1",
            &[("id", "z-1"), ("type", "public")],
        );
        let spec = lookup_kind("opentelekomcloud_dns_zone_v2").unwrap();
        let handle = CloudObjectHandle::Id("z-1".into());
        let tags = spec.tags.unwrap();
        assert_eq!(
            render_path(tags.path, &handle, &zone, "proj").unwrap(),
            "proj/DNS-public_zone/z-1/tags"
        );
    }

    #[test]
    fn test_render_path_rejects_mismatched_placeholder() {
        let vpc = resource("opentelekomcloud_vpc_v1.vpc_1", &[("id", "v")]);
        let handle = CloudObjectHandle::Id("v".into());
        assert!(render_path("pools/{parent_id}", &handle, &vpc, "p").is_err());
    }
}
