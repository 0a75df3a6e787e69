//! `petrel clean` — Delete agent credentials from sandbox state.
//!
//! Bind-mode sandboxes get their auth files deleted; volume-backed ones
//! have the whole volume removed (files inside a volume cannot be
//! deleted selectively without starting a container).

#![allow(clippy::print_stdout)]

use anyhow::bail;
use clap::Args;
use petrel_common::types::{PersistenceMode, ResourceKind};
use petrel_config::resolve;
use petrel_config::store::ConfigStore;
use petrel_engine::{docker, runspec};

use crate::prompt;

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Project name; all projects when omitted.
    pub name: Option<String>,

    /// Skip confirmation prompts.
    #[arg(short, long)]
    pub yes: bool,
}

/// Executes the `clean` command.
///
/// # Errors
///
/// Returns an error if a named project does not exist or the store
/// fails.
pub fn execute(args: &CleanArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();

    match &args.name {
        Some(name) => {
            if store.load::<petrel_config::resources::Project>(name)?.is_none() {
                bail!("project '{name}' not found");
            }
            clean_project(&store, name)
        }
        None => {
            let names = store.list(ResourceKind::Project)?;
            if names.is_empty() {
                println!("No projects configured.");
                return Ok(());
            }
            if !args.yes && !prompt::confirm("Clean agent credentials for ALL projects?") {
                return Ok(());
            }
            for name in &names {
                clean_project(&store, name)?;
            }
            Ok(())
        }
    }
}

fn clean_project(store: &ConfigStore, name: &str) -> anyhow::Result<()> {
    // Resolution gives us the agent's auth file list; fall back to a
    // bind-dir sweep when references are broken.
    let resolved = resolve::resolve(store, name).ok();
    let persistence = resolved
        .as_ref()
        .map_or(PersistenceMode::Bind, |cfg| cfg.environment.persistence.mode);

    match persistence {
        PersistenceMode::Bind => {
            let data_dir = store.agent_data_dir(name);
            if !data_dir.exists() {
                println!("No state to clean for '{name}'.");
                return Ok(());
            }
            let files = resolved.as_ref().map_or_else(
                || vec![".credentials.json".to_owned(), ".claude.json".to_owned()],
                |cfg| cfg.agent.auth.files.clone(),
            );
            for file in files {
                let path = data_dir.join(&file);
                if path.exists() {
                    std::fs::remove_file(&path)?;
                }
            }
            println!("Cleaned credentials for '{name}'.");
        }
        PersistenceMode::Volume => {
            let state_dir = resolved
                .as_ref()
                .map_or_else(|| ".claude".to_owned(), |cfg| cfg.agent.state_dir().to_owned());
            let volume = runspec::volume_name(name, &state_dir);
            if docker::remove_volume(&volume) {
                println!("Removed volume '{volume}' for '{name}'.");
            } else {
                println!("Volume '{volume}' not found or in use.");
            }
        }
    }
    Ok(())
}
