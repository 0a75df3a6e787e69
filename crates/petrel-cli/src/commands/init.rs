//! `petrel init` — Initialize the config root with starter resources.

#![allow(clippy::print_stdout)]

use clap::Args;
use petrel_common::constants;
use petrel_common::types::{NetworkMode, PersistenceMode};
use petrel_config::resources::{AgentConfig, Environment, GlobalConfig, SecurityProfile};
use petrel_config::store::ConfigStore;

use crate::output::{BOLD, DIM, GREEN, RESET};

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-seed starter resources even if already initialized.
    #[arg(long)]
    pub force: bool,
}

/// Executes the `init` command.
///
/// # Errors
///
/// Returns an error if the config root cannot be created or written.
pub fn execute(args: &InitArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();

    if store.is_initialized() && !args.force {
        println!(
            "Already initialized at {}. Use --force to re-seed starter resources.",
            store.root().display()
        );
        return Ok(());
    }

    store.ensure_dirs()?;

    let mut global = GlobalConfig::default();
    global.defaults.security = constants::DEFAULT_SECURITY.to_owned();
    global.defaults.agent = constants::DEFAULT_AGENT.to_owned();
    store.save_global(&global)?;

    store.save(&Environment::new(constants::DEFAULT_ENVIRONMENT))?;
    let mut isolated = Environment::new("isolated");
    isolated.network.mode = NetworkMode::None;
    isolated.persistence.mode = PersistenceMode::Volume;
    store.save(&isolated)?;

    store.save(&SecurityProfile::new(constants::DEFAULT_SECURITY))?;
    let mut locked = SecurityProfile::new("locked");
    locked.agent.sudo = false;
    store.save(&locked)?;

    let mut claude = AgentConfig::new(constants::DEFAULT_AGENT);
    claude.auth.dir = ".claude".to_owned();
    claude.auth.files = vec![".credentials.json".to_owned(), ".claude.json".to_owned()];
    claude.auth.login_command = "claude /login".to_owned();
    store.save(&claude)?;

    println!(
        "{GREEN}Initialized{RESET} {BOLD}petrel{RESET} at {}",
        store.root().display()
    );
    println!("  Environments: local-docker, isolated");
    println!("  Security:     open, locked");
    println!("  Agents:       claude");
    println!();
    println!("{DIM}Next: petrel build, then petrel add <name> --dir <path>{RESET}");
    Ok(())
}
