//! Provider configuration with explicit TLS material, driven through a plan
//! so the plugin's own configure step validates it.

mod common;

use otc_acc_harness::{
    EnvKey, EnvRegistry, Feature, Gate, PemSource, ProviderBlock, Step, TestCase,
};

const TLS_TEMPLATE: &str = r#"
{{ provider_block }}
resource "opentelekomcloud_vpc_v1" "vpc_1" {
  name = "vpc_provider_tls"
  cidr = "192.168.0.0/16"
}
"#;

/// TLS material from the registry, kept alive for the duration of a case.
fn tls_sources(registry: &EnvRegistry) -> Vec<(&'static str, PemSource)> {
    [
        ("cacert_file", EnvKey::CaCert),
        ("cert", EnvKey::Cert),
        ("key", EnvKey::Key),
    ]
    .into_iter()
    .filter_map(|(name, key)| registry.get(key).map(|value| (name, value)))
    .map(|(name, value)| (name, PemSource::from_value(value).expect("writable temp dir")))
    .collect()
}

fn tls_block(sources: &[(&str, PemSource)], inline: bool) -> ProviderBlock {
    sources
        .iter()
        .fold(ProviderBlock::new(), |block, (name, source)| {
            block
                .pem(*name, source, inline)
                .expect("readable TLS material")
        })
        .flag("insecure", false)
}

async fn plan_with(name: &str, block: ProviderBlock) {
    let case = TestCase::builder(name)
        .precheck(Gate::feature(Feature::SslTests))
        .step(
            Step::plan_only(TLS_TEMPLATE)
                .param("provider_block", block.render())
                .expect_nonempty_plan(),
        )
        .build()
        .expect("valid case");

    common::run(case).await;
}

#[tokio::test]
async fn test_provider_ssl_file_paths() {
    let Some(harness) = common::harness() else {
        return;
    };
    let sources = tls_sources(harness.registry());
    plan_with("provider_ssl_file_paths", tls_block(&sources, false)).await;
}

#[tokio::test]
async fn test_provider_ssl_inline_pem() {
    let Some(harness) = common::harness() else {
        return;
    };
    let sources = tls_sources(harness.registry());
    plan_with("provider_ssl_inline_pem", tls_block(&sources, true)).await;
}

#[tokio::test]
async fn test_provider_ssl_insecure() {
    plan_with(
        "provider_ssl_insecure",
        ProviderBlock::new().flag("insecure", true),
    )
    .await;
}

#[tokio::test]
async fn test_provider_ssl_untrusted_ca() {
    let Some(harness) = common::harness() else {
        return;
    };
    // Trusting only the client certificate leaves the endpoint's chain
    // unverifiable.
    let Some(cert) = harness.registry().get(EnvKey::Cert) else {
        return;
    };
    let ca = PemSource::from_value(cert).expect("writable temp dir");
    let block = ProviderBlock::new()
        .pem("cacert_file", &ca, false)
        .expect("readable TLS material")
        .flag("insecure", false);

    let case = TestCase::builder("provider_ssl_untrusted_ca")
        .precheck(Gate::feature(Feature::SslTests))
        .step(
            Step::plan_only(TLS_TEMPLATE)
                .param("provider_block", block.render())
                .expect_error("x509|certificate"),
        )
        .build()
        .expect("valid case");

    common::run(case).await;
}
