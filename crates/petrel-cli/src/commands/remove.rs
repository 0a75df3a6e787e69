//! `petrel remove` — Remove a project configuration.
//!
//! Deletes only the Project document; shared environments, profiles,
//! agents, and credentials are never cascade-deleted. Sandbox state is
//! removed only on request.

#![allow(clippy::print_stdout)]

use anyhow::bail;
use clap::Args;
use petrel_common::constants;
use petrel_common::types::{PersistenceMode, ResourceKind};
use petrel_config::resources::{AgentConfig, Environment, Project};
use petrel_config::store::ConfigStore;
use petrel_engine::{docker, runspec};

use crate::output::{BOLD, GREEN, RESET};
use crate::prompt;

/// Arguments for the `remove` command.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Project name.
    pub name: String,

    /// Also remove the sandbox state (bind directory or volume).
    #[arg(long)]
    pub data: bool,

    /// Skip confirmation prompts.
    #[arg(short, long)]
    pub yes: bool,
}

/// Executes the `remove` command.
///
/// # Errors
///
/// Returns an error if the project is missing, still running, or the
/// store fails.
pub fn execute(args: &RemoveArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    let Some(project) = store.load::<Project>(&args.name)? else {
        bail!("project '{}' not found", args.name);
    };

    let container = constants::container_name(&args.name);
    if docker::container_running(&container, None) {
        bail!("sandbox '{container}' is running; stop it first");
    }

    // Persistence policy decides what "data" means for this project.
    let env_name = if project.environment.is_empty() {
        constants::DEFAULT_ENVIRONMENT
    } else {
        &project.environment
    };
    let persistence = store
        .load::<Environment>(env_name)?
        .map_or(PersistenceMode::Bind, |env| env.persistence.mode);

    store.delete(ResourceKind::Project, &args.name)?;
    println!("{GREEN}Removed{RESET} project {BOLD}{}{RESET}", args.name);

    match persistence {
        PersistenceMode::Bind => {
            let data_dir = store.agent_data_dir(&args.name);
            if data_dir.exists()
                && (args.data
                    || (!args.yes
                        && prompt::confirm(&format!(
                            "Also remove sandbox state at {}?",
                            data_dir.display()
                        ))))
            {
                std::fs::remove_dir_all(&data_dir)?;
                println!("  Sandbox state removed.");
            }
        }
        PersistenceMode::Volume => {
            let state_dir = store
                .load::<AgentConfig>(&resolved_agent(&store, &project)?)?
                .map_or_else(|| ".claude".to_owned(), |a| a.state_dir().to_owned());
            let volume = runspec::volume_name(&args.name, &state_dir);
            if args.data
                || (!args.yes && prompt::confirm(&format!("Also remove volume '{volume}'?")))
            {
                if docker::remove_volume(&volume) {
                    println!("  Volume removed.");
                } else {
                    println!("  Volume '{volume}' not found or in use.");
                }
            }
        }
    }
    Ok(())
}

fn resolved_agent(store: &ConfigStore, project: &Project) -> anyhow::Result<String> {
    if !project.agent.is_empty() {
        return Ok(project.agent.clone());
    }
    let global = store.load_global()?;
    if global.defaults.agent.is_empty() {
        Ok(constants::DEFAULT_AGENT.to_owned())
    } else {
        Ok(global.defaults.agent)
    }
}
