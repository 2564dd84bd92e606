//! `opentelekomcloud_cce_cluster_v3` network validation. Every step is a dry
//! run, so no cluster is ever created.

mod common;

use otc_acc_harness::{rand_name, Gate, Step, TestCase};

const CLUSTER: &str = r#"
resource "opentelekomcloud_cce_cluster_v3" "cluster_1" {
  name                   = "{{ name }}"
  cluster_type           = "VirtualMachine"
  flavor_id              = "cce.s1.small"
  vpc_id                 = "{{ vpc_id }}"
  subnet_id              = "{{ network_id }}"
  container_network_type = "overlay_l2"
}
"#;

#[tokio::test]
async fn test_cce_cluster_v3_network_validation() {
    let case = TestCase::builder("cce_cluster_v3_network_validation")
        .precheck(Gate::RequiredEnv)
        .param("name", rand_name("cce-acc-"))
        .step(
            Step::plan_only(CLUSTER)
                .param("network_id", "abc")
                .expect_error("can't find subnet.+"),
        )
        .step(
            Step::plan_only(CLUSTER)
                .param("vpc_id", "abc")
                .expect_error("can't find VPC.+"),
        )
        .step(Step::plan_only(CLUSTER).expect_nonempty_plan())
        .build()
        .expect("valid case");

    common::run(case).await;
}
