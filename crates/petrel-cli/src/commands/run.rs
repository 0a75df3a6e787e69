//! `petrel run` — Start (or attach to) a project's sandbox.
//!
//! Resolve → validate → materialize (clone, seed) → compile run argv →
//! exec. Validation errors abort; warnings are printed and the run
//! proceeds.

#![allow(clippy::print_stdout)]

use std::path::Path;

use anyhow::bail;
use clap::Args;
use petrel_common::constants;
use petrel_common::types::PersistenceMode;
use petrel_config::credentials;
use petrel_config::resolve;
use petrel_config::store::ConfigStore;
use petrel_config::validate::validate;
use petrel_engine::{docker, git, runspec};

use crate::output::{BOLD, DIM, GREEN, RED, RESET, YELLOW, shorten_home};
use crate::prompt;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Project name.
    pub name: String,

    /// Attach without prompting if the sandbox is already running.
    #[arg(long)]
    pub attach: bool,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if resolution or validation fails, the clone fails,
/// or the sandbox cannot be started.
pub fn execute(args: &RunArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    let mut cfg = match resolve::resolve(&store, &args.name) {
        Ok(cfg) => cfg,
        Err(err @ petrel_common::error::PetrelError::NotFound { .. }) => {
            bail!("{err}. Add it with: petrel add {} --dir <path>", args.name)
        }
        Err(err) => return Err(err.into()),
    };

    let container = constants::container_name(&args.name);
    if docker::container_running(&container, None) {
        println!("Sandbox {BOLD}{container}{RESET} is already running.");
        if args.attach || prompt::confirm("Attach to it?") {
            docker::exec_shell(&container)?;
        }
        return Ok(());
    }

    let report = validate(&cfg);
    for warning in &report.warnings {
        println!("  {YELLOW}Warning:{RESET} {warning}");
    }
    if !report.is_valid() {
        println!();
        println!("Configuration validation failed:");
        for error in &report.errors {
            println!("  {RED}x{RESET} {error}");
        }
        bail!("fix the configuration or see 'petrel validate {}'", args.name);
    }

    materialize_repo(&store, &mut cfg)?;

    let global = store.load_global()?;
    let data_dir = store.agent_data_dir(&args.name);

    if cfg.environment.persistence.mode == PersistenceMode::Bind {
        let stash = cfg
            .credential
            .as_ref()
            .map(|cred| store.credential_dir(&cred.name));
        let seeded = credentials::seed_state_dir(&cfg.agent, &data_dir, stash.as_deref())?;
        for file in seeded {
            println!("Seeded {file} into sandbox state.");
        }
    }

    let argv = runspec::compile_run(&cfg, &global.image_name, &data_dir);
    tracing::debug!(project = %args.name, ?argv, "compiled run invocation");
    print_summary(&cfg, &data_dir);
    docker::replace_process(&argv)?;
    Ok(())
}

/// Clones a repo-backed project into its deterministic path on first run
/// and points `directory` at the clone.
fn materialize_repo(
    store: &ConfigStore,
    cfg: &mut resolve::EffectiveConfig,
) -> anyhow::Result<()> {
    if cfg.project.repo.is_empty() {
        return Ok(());
    }
    let clone_dir = store.repo_dir(&cfg.project.name);
    if clone_dir.exists() {
        println!("Using existing clone at {}", shorten_home(&clone_dir.to_string_lossy()));
    } else {
        println!("Cloning {} into {}...", cfg.project.repo, clone_dir.display());
        let ssh_key = (!cfg.project.ssh.private_key.is_empty())
            .then_some(cfg.project.ssh.private_key.as_str());
        git::clone_repo(&cfg.project.repo, &clone_dir, ssh_key)?;
    }
    cfg.project.directory = clone_dir.to_string_lossy().into_owned();
    Ok(())
}

fn print_summary(cfg: &resolve::EffectiveConfig, data_dir: &Path) {
    let project = &cfg.project;
    println!();
    println!("{GREEN}Starting{RESET} {BOLD}{}{RESET}", constants::container_name(&project.name));
    println!("  Project:     {}", display_source(&project.directory));
    println!("  Environment: {}", cfg.environment.name);
    println!("  Security:    {}", cfg.security.name);
    println!("  Agent:       {}", cfg.agent.name);
    let ssh = if project.ssh.private_key.is_empty() {
        "(none)".to_owned()
    } else {
        Path::new(&project.ssh.private_key)
            .file_name()
            .map_or_else(|| project.ssh.private_key.clone(), |n| n.to_string_lossy().into_owned())
    };
    println!("  SSH key:     {ssh}");
    println!("  Network:     {}", cfg.environment.network.mode);
    match cfg.environment.persistence.mode {
        PersistenceMode::Bind => {
            println!("  State:       {}", shorten_home(&data_dir.to_string_lossy()));
        }
        PersistenceMode::Volume => {
            println!(
                "  State:       volume {}",
                runspec::volume_name(&project.name, cfg.agent.state_dir())
            );
        }
    }
    println!("{DIM}(Ctrl+D to leave the sandbox){RESET}");
    println!();
}

fn display_source(directory: &str) -> String {
    if directory.is_empty() {
        "(none)".to_owned()
    } else {
        shorten_home(directory)
    }
}
