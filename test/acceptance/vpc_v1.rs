//! `opentelekomcloud_vpc_v1`

mod common;

use otc_acc_harness::check::{attr_equals, back_read, exists, scratch_field, tag};
use otc_acc_harness::{rand_name, DestroyVerifier, Gate, Step, TestCase};

const VPC: &str = "opentelekomcloud_vpc_v1.vpc_1";

const BASIC: &str = r#"
resource "opentelekomcloud_vpc_v1" "vpc_1" {
  name   = "{{ name }}"
  cidr   = "{{ cidr }}"
  region = "{{ region }}"
}
"#;

const TAGGED: &str = r#"
resource "opentelekomcloud_vpc_v1" "vpc_1" {
  name = "{{ name }}"
  cidr = "192.168.0.0/16"

  tags = {
    foo = "{{ tag_value }}"
    key = "value"
  }
}
"#;

#[tokio::test]
async fn test_vpc_v1_basic() {
    let case = TestCase::builder("vpc_v1_basic")
        .precheck(Gate::RequiredEnv)
        .param("cidr", "192.168.0.0/16")
        .step(
            Step::apply(BASIC)
                .param("name", "terraform_provider_test")
                .check(exists(VPC))
                .check(attr_equals(VPC, "name", "terraform_provider_test"))
                .check(attr_equals(VPC, "cidr", "192.168.0.0/16"))
                .check(attr_equals(VPC, "status", "OK"))
                .check(attr_equals(VPC, "shared", "false"))
                .check(
                    back_read(VPC)
                        .bind("vpc")
                        .field("/name", "terraform_provider_test")
                        .field("/cidr", "192.168.0.0/16"),
                )
                .check(scratch_field("vpc", "/status", "OK")),
        )
        .step(
            Step::apply(BASIC)
                .param("name", "terraform_provider_test1")
                .check(attr_equals(VPC, "name", "terraform_provider_test1"))
                .check(attr_equals(VPC, "cidr", "192.168.0.0/16"))
                .check(back_read(VPC).field("/name", "terraform_provider_test1")),
        )
        .step(Step::import(VPC))
        .destroy_verifier(DestroyVerifier::touched())
        .build()
        .expect("valid case");

    common::run(case).await;
}

#[tokio::test]
async fn test_vpc_v1_tags() {
    let case = TestCase::builder("vpc_v1_tags")
        .precheck(Gate::RequiredEnv)
        .param("name", rand_name("vpc_acc"))
        .step(
            Step::apply(TAGGED)
                .param("tag_value", "bar")
                .check(attr_equals(VPC, "tags.foo", "bar"))
                .check(tag(VPC, "foo", "bar"))
                .check(tag(VPC, "key", "value")),
        )
        .step(
            Step::apply(TAGGED)
                .param("tag_value", "baz")
                .check(tag(VPC, "foo", "baz")),
        )
        .destroy_verifier(DestroyVerifier::touched())
        .build()
        .expect("valid case");

    common::run(case).await;
}
