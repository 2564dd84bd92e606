//! `opentelekomcloud_dds_instance_v3`

use std::time::Duration;

mod common;

use otc_acc_harness::check::{attr_equals, attr_set, back_read};
use otc_acc_harness::{rand_name, DestroyVerifier, Gate, Step, TestCase};

const DDS: &str = "opentelekomcloud_dds_instance_v3.instance";

const INSTANCE: &str = r#"
resource "opentelekomcloud_networking_secgroup_v2" "secgroup_1" {
  name        = "{{ name }}-sg"
  description = "dds acceptance"
}

resource "opentelekomcloud_dds_instance_v3" "instance" {
  name              = "{{ name }}"
  availability_zone = "{{ availability_zone }}"
  vpc_id            = "{{ vpc_id }}"
  subnet_id         = "{{ network_id }}"
  security_group_id = opentelekomcloud_networking_secgroup_v2.secgroup_1.id
  password          = "5ecurePa55w0rd@"
  mode              = "ReplicaSet"

  datastore {
    type           = "DDS-Community"
    version        = "3.4"
    storage_engine = "wiredTiger"
  }

  flavor {
    type      = "replica"
    num       = 1
    storage   = "ULTRAHIGH"
    size      = 30
    spec_code = "dds.mongodb.s2.medium.4.repset"
  }

  backup_strategy {
    start_time = "{{ backup_start }}"
    keep_days  = 1
  }
}
"#;

#[tokio::test]
async fn test_dds_instance_v3_basic() {
    let name = rand_name("dds-acc-");
    let case = TestCase::builder("dds_instance_v3_basic")
        .precheck(Gate::RequiredEnv)
        .param("name", &name)
        .timeout(Duration::from_secs(45 * 60))
        .step(
            Step::apply(INSTANCE)
                .param("backup_start", "08:00-09:00")
                .check(attr_equals(DDS, "name", &name))
                .check(attr_equals(DDS, "mode", "ReplicaSet"))
                .check(attr_set(DDS, "port"))
                .check(back_read(DDS).field("/name", &name)),
        )
        .step(
            Step::apply(INSTANCE)
                .param("backup_start", "00:00-01:00")
                .check(attr_equals(DDS, "backup_strategy.0.start_time", "00:00-01:00")),
        )
        .step(Step::import(DDS).ignore(["flavor", "password", "availability_zone"]))
        .destroy_verifier(DestroyVerifier::touched())
        .build()
        .expect("valid case");

    common::run(case).await;
}
