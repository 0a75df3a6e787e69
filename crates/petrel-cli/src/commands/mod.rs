//! CLI command definitions and dispatch.

pub mod add;
pub mod build;
pub mod clean;
pub mod credential;
pub mod describe;
pub mod init;
pub mod list;
pub mod remove;
pub mod restart;
pub mod run;
pub mod stop;
pub mod validate;

use clap::{Parser, Subcommand};

/// Petrel — containerized development sandboxes for coding agents.
#[derive(Parser, Debug)]
#[command(name = "petrel", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the config root with starter resources.
    Init(init::InitArgs),
    /// Add a project.
    Add(add::AddArgs),
    /// List projects and their sandbox status.
    List(list::ListArgs),
    /// Show the resolved configuration for a project.
    Describe(describe::DescribeArgs),
    /// Validate one or all projects.
    Validate(validate::ValidateArgs),
    /// Build the sandbox image.
    Build(build::BuildArgs),
    /// Start (or attach to) a project's sandbox.
    Run(run::RunArgs),
    /// Stop a project's sandbox.
    Stop(stop::StopArgs),
    /// Restart a project's sandbox.
    Restart(restart::RestartArgs),
    /// Remove a project configuration.
    Remove(remove::RemoveArgs),
    /// Delete agent credentials from sandbox state.
    Clean(clean::CleanArgs),
    /// Manage imported credentials.
    Credential(credential::CredentialArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => init::execute(&args),
        Command::Add(args) => add::execute(args),
        Command::List(args) => list::execute(&args),
        Command::Describe(args) => describe::execute(&args),
        Command::Validate(args) => validate::execute(&args),
        Command::Build(args) => build::execute(&args),
        Command::Run(args) => run::execute(&args),
        Command::Stop(args) => stop::execute(&args),
        Command::Restart(args) => restart::execute(&args),
        Command::Remove(args) => remove::execute(&args),
        Command::Clean(args) => clean::execute(&args),
        Command::Credential(args) => credential::execute(args),
    }
}
