//! `otc-acc render`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use otc_acc_env::EnvRegistry;
use otc_acc_template::{fingerprint, ConfigTemplate, RenderContext};

#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Template file.
    file: PathBuf,

    /// Case parameter, repeatable.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Write the document here instead of stdout.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

fn parse_param(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("parameter name is empty in '{raw}'");
    }
    Ok((key.to_string(), value.to_string()))
}

async fn render_file(
    registry: &EnvRegistry,
    file: &PathBuf,
    params: &[(String, String)],
) -> Result<String> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let context = RenderContext::new(registry).with_params(params.iter().cloned());
    let document = ConfigTemplate::new(source)
        .render(&context)
        .with_context(|| format!("failed to render {}", file.display()))?;
    Ok(document)
}

impl RenderCommand {
    pub async fn run(self) -> Result<()> {
        let registry =
            EnvRegistry::from_env().context("failed to initialise the environment registry")?;
        let document = render_file(&registry, &self.file, &self.params).await?;
        tracing::info!(fingerprint = %fingerprint(&document), "rendered {}", self.file.display());

        match &self.out {
            Some(out) => tokio::fs::write(out, &document)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?,
            None => print!("{document}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("name=vpc_1", "name", "vpc_1")]
    #[case("cidr=192.168.0.0/16", "cidr", "192.168.0.0/16")]
    #[case("expr=a=b", "expr", "a=b")]
    #[case(" empty =", "empty", "")]
    fn test_parse_param(#[case] raw: &str, #[case] key: &str, #[case] value: &str) {
        let (k, v) = parse_param(raw).unwrap();
        assert_eq!(k, key);
        assert_eq!(v, value);
    }

    #[rstest]
    #[case("novalue")]
    #[case("=value")]
    fn test_parse_param_rejects(#[case] raw: &str) {
        assert!(parse_param(raw).is_err());
    }

    #[tokio::test]
    async fn test_render_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("vpc.tf");
        std::fs::write(
            &file,
            "resource \"opentelekomcloud_vpc_v1\" \"vpc_1\" {\n  name = \"{{ name }}\"\n  region = \"{{ region }}\"\n}\n",
        )
        .unwrap();
        let registry = EnvRegistry::from_pairs([("OS_REGION_NAME", "eu-de")]).unwrap();

        let doc = render_file(&registry, &file, &[("name".into(), "vpc_acc".into())])
            .await
            .unwrap();
        assert!(doc.contains("name = \"vpc_acc\""));
        assert!(doc.contains("region = \"eu-de\""));

        let err = render_file(&registry, &file, &[]).await.unwrap_err();
        assert!(format!("{err:#}").contains("name"));
    }
}
