//! `opentelekomcloud_dns_zone_v2`

mod common;

use otc_acc_harness::check::{attr_equals, attr_matches, back_read, tags};
use otc_acc_harness::{rand_name, DestroyVerifier, Gate, Step, TestCase};

const ZONE: &str = "opentelekomcloud_dns_zone_v2.zone_1";

const PUBLIC_ZONE: &str = r#"
resource "opentelekomcloud_dns_zone_v2" "zone_1" {
  name        = "{{ zone_name }}"
  email       = "{{ email }}"
  description = "a public zone"
  ttl         = {{ ttl }}
  type        = "public"

  tags = {
    foo = "bar"
    key = "{{ key_value }}"
  }
}
"#;

#[tokio::test]
async fn test_dns_zone_v2_basic() {
    let zone_name = format!("{}.com.", rand_name("acpttest"));

    let case = TestCase::builder("dns_zone_v2_basic")
        .precheck(Gate::RequiredEnv)
        .param("zone_name", &zone_name)
        .step(
            Step::apply(PUBLIC_ZONE)
                .param("email", "email1@example.com")
                .param("ttl", "3000")
                .param("key_value", "value")
                .check(attr_equals(ZONE, "name", &zone_name))
                .check(attr_equals(ZONE, "email", "email1@example.com"))
                .check(attr_equals(ZONE, "ttl", "3000"))
                .check(attr_matches(ZONE, "masters.#", r"^\d+$"))
                .check(tags(ZONE, [("foo", "bar"), ("key", "value")])),
        )
        .step(
            Step::apply(PUBLIC_ZONE)
                .param("email", "email2@example.com")
                .param("ttl", "6000")
                .param("key_value", "value_updated")
                .check(attr_equals(ZONE, "email", "email2@example.com"))
                .check(attr_equals(ZONE, "ttl", "6000"))
                .check(tags(ZONE, [("foo", "bar"), ("key", "value_updated")]))
                .check(back_read(ZONE).field("/email", "email2@example.com")),
        )
        .step(Step::import(ZONE))
        .destroy_verifier(DestroyVerifier::touched())
        .build()
        .expect("valid case");

    common::run(case).await;
}
