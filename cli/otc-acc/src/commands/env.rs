//! `otc-acc env`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use otc_acc_env::{EnvFlag, EnvKey, EnvRegistry, Feature, Gate, GateOutcome, HarnessSettings};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{outcome_code, outcome_label, print_rows, OutputFormat, MASK};

#[derive(Debug, Args)]
pub struct EnvCommand {
    /// Include unset keys.
    #[arg(long, short)]
    all: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct KeyRow {
    key: &'static str,
    variable: &'static str,
    value: String,
}

#[derive(Debug, Serialize, Tabled)]
struct FlagRow {
    flag: &'static str,
    variable: &'static str,
    set: bool,
}

#[derive(Debug, Serialize)]
struct GateRow {
    gate: String,
    outcome: &'static str,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct EnvReport {
    region: String,
    acceptance_enabled: bool,
    keys: Vec<KeyRow>,
    flags: Vec<FlagRow>,
    gates: Vec<GateRow>,
}

fn key_rows(registry: &EnvRegistry, all: bool) -> Vec<KeyRow> {
    EnvKey::ALL
        .iter()
        .filter_map(|key| {
            let value = match registry.get(*key) {
                Some(_) if key.is_secret() => MASK.to_string(),
                Some(value) => value.to_string(),
                None if all => "-".to_string(),
                None => return None,
            };
            Some(KeyRow {
                key: key.name(),
                variable: key.env_var(),
                value,
            })
        })
        .collect()
}

fn flag_rows(registry: &EnvRegistry) -> Vec<FlagRow> {
    EnvFlag::ALL
        .iter()
        .map(|flag| FlagRow {
            flag: flag.name(),
            variable: flag.env_var(),
            set: registry.flag(*flag),
        })
        .collect()
}

fn gates() -> Vec<Gate> {
    let mut gates = vec![Gate::RequiredEnv, Gate::Credentials];
    gates.extend(Feature::ALL.iter().copied().map(Gate::feature));
    gates
}

impl EnvCommand {
    pub fn run(self, format: OutputFormat) -> Result<()> {
        let registry =
            EnvRegistry::from_env().context("failed to initialise the environment registry")?;
        let settings = HarnessSettings::from_env().context("invalid harness settings")?;

        let keys = key_rows(&registry, self.all);
        let flags = flag_rows(&registry);
        let outcomes: Vec<_> = gates()
            .into_iter()
            .map(|gate| {
                let outcome = gate.evaluate(&registry);
                (gate.name(), outcome)
            })
            .collect();

        if format == OutputFormat::Json {
            let report = EnvReport {
                region: registry.region().to_string(),
                acceptance_enabled: settings.acceptance_enabled,
                keys,
                flags,
                gates: outcomes
                    .iter()
                    .map(|(gate, outcome)| GateRow {
                        gate: gate.clone(),
                        outcome: outcome_code(outcome),
                        reason: match outcome {
                            GateOutcome::Proceed => None,
                            GateOutcome::Skip(r) | GateOutcome::Fail(r) => Some(r.clone()),
                        },
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{} {}", "Region:".bold(), registry.region());
        println!(
            "{} {}",
            "Acceptance:".bold(),
            if settings.acceptance_enabled {
                "enabled".green()
            } else {
                "disabled (TF_ACC not set)".yellow()
            }
        );
        println!("{} {}", "Engine:".bold(), settings.terraform_path.display());
        match &settings.provider_dir {
            Some(dir) => println!("{} dev override from {}", "Provider:".bold(), dir.display()),
            None => println!(
                "{} registry {}",
                "Provider:".bold(),
                settings.provider_version.as_deref().unwrap_or("(latest)")
            ),
        }
        println!();

        print_rows(&keys, format);
        println!();
        print_rows(&flags, format);
        println!();

        println!("{}", "Gates:".bold());
        for (gate, outcome) in &outcomes {
            println!("  {gate:<14} {}", outcome_label(outcome));
        }
        Ok(())
    }
}
