//! Error display for the CLI.

use colored::Colorize;
use otc_acc_env::EnvError;
use otc_acc_template::RenderError;

/// Print an error chain with a hint where one helps.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }

    if err.downcast_ref::<EnvError>().is_some() {
        eprintln!(
            "\n{}",
            "Hint: set OS_REGION_NAME, or OS_PROJECT_NAME in the form <region>_<project>.".yellow()
        );
    } else if let Some(RenderError::UnknownHole { name, .. }) = err.downcast_ref::<RenderError>() {
        eprintln!(
            "\n{}",
            format!("Hint: pass --param {name}=<value> or use a registry key name.").yellow()
        );
    }
}
