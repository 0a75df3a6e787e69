//! `petrel describe` — Show the resolved configuration for a project.

#![allow(clippy::print_stdout)]

use clap::Args;
use petrel_config::resolve;
use petrel_config::store::ConfigStore;
use petrel_config::validate::validate;

use crate::output::{BOLD, DIM, RESET, YELLOW};

/// Arguments for the `describe` command.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Project name.
    pub name: String,
}

/// Executes the `describe` command.
///
/// # Errors
///
/// Returns an error if resolution fails.
pub fn execute(args: &DescribeArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    let cfg = resolve::resolve(&store, &args.name)?;

    println!("{BOLD}{}{RESET}", cfg.project.name);
    println!("{DIM}project:{RESET}");
    print!("{}", indented(&serde_yaml::to_string(&cfg.project)?));
    println!("{DIM}environment ({}):{RESET}", cfg.environment.name);
    print!("{}", indented(&serde_yaml::to_string(&cfg.environment)?));
    println!("{DIM}security ({}):{RESET}", cfg.security.name);
    print!("{}", indented(&serde_yaml::to_string(&cfg.security)?));
    println!("{DIM}agent ({}):{RESET}", cfg.agent.name);
    print!("{}", indented(&serde_yaml::to_string(&cfg.agent)?));
    match &cfg.credential {
        Some(cred) => {
            println!("{DIM}credential ({}):{RESET}", cred.name);
            print!("{}", indented(&serde_yaml::to_string(cred)?));
        }
        None => println!("{DIM}credential:{RESET} (none)"),
    }

    let report = validate(&cfg);
    for warning in &report.warnings {
        println!("{YELLOW}Warning:{RESET} {warning}");
    }
    for error in &report.errors {
        println!("{YELLOW}Error:{RESET} {error}");
    }
    if report.is_valid() && report.warnings.is_empty() {
        println!("{DIM}configuration is valid{RESET}");
    }
    Ok(())
}

fn indented(yaml: &str) -> String {
    yaml.lines()
        .map(|line| format!("  {line}\n"))
        .collect()
}
