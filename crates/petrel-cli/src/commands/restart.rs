//! `petrel restart` — Restart a project's sandbox.

use clap::Args;

use super::{run, stop};

/// Arguments for the `restart` command.
#[derive(Args, Debug)]
pub struct RestartArgs {
    /// Project name.
    pub name: String,
}

/// Executes the `restart` command: stop, then run.
///
/// # Errors
///
/// Returns an error if either phase fails.
pub fn execute(args: &RestartArgs) -> anyhow::Result<()> {
    stop::execute(&stop::StopArgs {
        name: args.name.clone(),
    })?;
    run::execute(&run::RunArgs {
        name: args.name.clone(),
        attach: false,
    })
}
