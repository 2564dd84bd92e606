//! `opentelekomcloud_antiddos_v1` on a fresh elastic IP.

mod common;

use otc_acc_harness::check::{attr_equals, attr_pair, back_read, exists};
use otc_acc_harness::{ApplyStep, ConfigTemplate, DestroyVerifier, Gate, Step, TestCase};

const ANTIDDOS: &str = "opentelekomcloud_antiddos_v1.antiddos_1";
const EIP: &str = "opentelekomcloud_vpc_eip_v1.eip_1";

const EIP_BLOCK: &str = r#"
resource "opentelekomcloud_vpc_eip_v1" "eip_1" {
  publicip {
    type = "5_bgp"
  }
  bandwidth {
    name        = "acc-antiddos"
    size        = 8
    share_type  = "PER"
    charge_mode = "traffic"
  }
}
"#;

const ANTIDDOS_BLOCK: &str = r#"
resource "opentelekomcloud_antiddos_v1" "antiddos_1" {
  floating_ip_id         = opentelekomcloud_vpc_eip_v1.eip_1.id
  enable_l7              = {{ enable_l7 }}
  traffic_pos_id         = {{ traffic_pos_id }}
  http_request_pos_id    = {{ http_request_pos_id }}
  cleaning_access_pos_id = {{ cleaning_access_pos_id }}
  app_type_id            = {{ app_type_id }}
}
"#;

/// Apply the protection with the given policy ids and check every one.
fn protection(template: &ConfigTemplate, enable_l7: &str, ids: [(&str, &str); 4]) -> ApplyStep {
    let mut step = Step::apply(template.clone())
        .param("enable_l7", enable_l7)
        .check(attr_equals(ANTIDDOS, "enable_l7", enable_l7));
    for (name, value) in ids {
        step = step
            .param(name, value)
            .check(attr_equals(ANTIDDOS, name, value));
    }
    step
}

#[tokio::test]
async fn test_antiddos_v1_basic() {
    let template = ConfigTemplate::new(EIP_BLOCK).then(&ConfigTemplate::new(ANTIDDOS_BLOCK));

    let create = protection(
        &template,
        "true",
        [
            ("traffic_pos_id", "1"),
            ("http_request_pos_id", "2"),
            ("cleaning_access_pos_id", "1"),
            ("app_type_id", "0"),
        ],
    )
    .check(exists(ANTIDDOS))
    .check(attr_pair(ANTIDDOS, "floating_ip_id", EIP, "id"))
    .check(attr_equals(EIP, "bandwidth.0.size", "8"))
    .check(attr_equals(EIP, "bandwidth.0.share_type", "PER"))
    .check(attr_equals(EIP, "bandwidth.0.charge_mode", "traffic"))
    .check(back_read(ANTIDDOS).field("/traffic_pos_id", "1"));

    let update = protection(
        &template,
        "true",
        [
            ("traffic_pos_id", "2"),
            ("http_request_pos_id", "1"),
            ("cleaning_access_pos_id", "2"),
            ("app_type_id", "1"),
        ],
    )
    .check(back_read(ANTIDDOS).field("/traffic_pos_id", "2"));

    let case = TestCase::builder("antiddos_v1_basic")
        .precheck(Gate::RequiredEnv)
        .step(create)
        .step(update)
        .destroy_verifier(DestroyVerifier::kinds([
            "opentelekomcloud_antiddos_v1",
            "opentelekomcloud_vpc_eip_v1",
        ]))
        .build()
        .expect("valid case");

    common::run(case).await;
}
