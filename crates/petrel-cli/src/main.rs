//! # petrel — sandbox manager CLI
//!
//! Per-project containerized development sandboxes for coding agents.
//! Stores named configuration resources, resolves them into an effective
//! configuration per project, and drives Docker from it.

mod commands;
mod output;
mod prompt;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
