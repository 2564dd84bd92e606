//! `opentelekomcloud_blockstorage_volume_v2`

mod common;

use otc_acc_harness::check::{attr_absent, attr_equals, back_read, exists, tags};
use otc_acc_harness::{DestroyVerifier, Gate, Step, TestCase};

const VOLUME: &str = "opentelekomcloud_blockstorage_volume_v2.volume_1";

const VOLUME_BASIC: &str = r#"
resource "opentelekomcloud_blockstorage_volume_v2" "volume_1" {
  name              = "volume_1"
  description       = "first test volume"
  availability_zone = "{{ availability_zone }}"
  size              = 1

  tags = {
    foo = "bar"
    key = "value"
  }
}
"#;

const VOLUME_RETAGGED: &str = r#"
resource "opentelekomcloud_blockstorage_volume_v2" "volume_1" {
  name              = "volume_1"
  description       = "first test volume"
  availability_zone = "{{ availability_zone }}"
  size              = 1

  tags = {
    foo2 = "bar2"
    key2 = "value2"
  }
}
"#;

#[tokio::test]
async fn test_blockstorage_volume_v2_basic() {
    let case = TestCase::builder("blockstorage_volume_v2_basic")
        .precheck(Gate::RequiredEnv)
        .step(
            Step::apply(VOLUME_BASIC)
                .check(exists(VOLUME))
                .check(attr_equals(VOLUME, "name", "volume_1"))
                .check(attr_equals(VOLUME, "size", "1"))
                .check(tags(VOLUME, [("foo", "bar"), ("key", "value")]))
                .check(back_read(VOLUME).field("/name", "volume_1")),
        )
        .step(
            Step::apply(VOLUME_RETAGGED)
                .check(attr_equals(VOLUME, "size", "1"))
                .check(attr_equals(VOLUME, "tags.foo2", "bar2"))
                .check(attr_absent(VOLUME, "tags.foo"))
                .check(attr_absent(VOLUME, "tags.key"))
                .check(
                    tags(VOLUME, [("foo2", "bar2"), ("key2", "value2")]).without(["foo", "key"]),
                ),
        )
        .destroy_verifier(DestroyVerifier::touched())
        .build()
        .expect("valid case");

    common::run(case).await;
}
