//! `petrel validate` — Validate one or all projects.

#![allow(clippy::print_stdout)]

use anyhow::bail;
use clap::Args;
use petrel_common::types::ResourceKind;
use petrel_config::resolve;
use petrel_config::store::ConfigStore;
use petrel_config::validate::validate;

use crate::output::{BOLD, GREEN, RED, RESET, YELLOW};

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project name; all projects when omitted.
    pub name: Option<String>,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if any project fails to resolve or validate, so the
/// process exits nonzero for CI use.
pub fn execute(args: &ValidateArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    let names = match &args.name {
        Some(name) => vec![name.clone()],
        None => store.list(ResourceKind::Project)?,
    };
    if names.is_empty() {
        println!("No projects configured.");
        return Ok(());
    }

    let mut failed = 0usize;
    for name in &names {
        match resolve::resolve(&store, name) {
            Ok(cfg) => {
                let report = validate(&cfg);
                for warning in &report.warnings {
                    println!("  {YELLOW}warning{RESET} {warning}");
                }
                for error in &report.errors {
                    println!("  {RED}error{RESET} {error}");
                }
                if report.is_valid() {
                    println!("{GREEN}ok{RESET} {BOLD}{name}{RESET}");
                } else {
                    failed += 1;
                    println!("{RED}invalid{RESET} {BOLD}{name}{RESET}");
                }
            }
            Err(err) => {
                failed += 1;
                println!("{RED}invalid{RESET} {BOLD}{name}{RESET}: {err}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} project(s) failed validation", names.len());
    }
    Ok(())
}
