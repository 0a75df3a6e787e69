//! `petrel stop` — Stop a project's sandbox.

#![allow(clippy::print_stdout)]

use clap::Args;
use petrel_common::constants;
use petrel_engine::docker;

use crate::output::{BOLD, GREEN, RESET};

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Project name.
    pub name: String,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the engine fails to stop the container.
pub fn execute(args: &StopArgs) -> anyhow::Result<()> {
    let container = constants::container_name(&args.name);
    if !docker::container_running(&container, None) {
        println!("Sandbox {BOLD}{container}{RESET} is not running.");
        return Ok(());
    }
    docker::stop_container(&container)?;
    println!("{GREEN}Stopped{RESET} {BOLD}{container}{RESET}");
    Ok(())
}
