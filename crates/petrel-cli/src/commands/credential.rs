//! `petrel credential` — Manage imported credentials.

#![allow(clippy::print_stdout)]

use anyhow::bail;
use clap::{Args, Subcommand};
use petrel_common::constants;
use petrel_common::types::ResourceKind;
use petrel_config::credentials;
use petrel_config::resources::{AgentConfig, Credential};
use petrel_config::store::ConfigStore;

use crate::output::{BOLD, GREEN, RESET};
use crate::prompt;

/// Arguments for the `credential` command.
#[derive(Args, Debug)]
pub struct CredentialArgs {
    /// Credential operation.
    #[command(subcommand)]
    pub action: CredentialAction,
}

/// Credential subcommands.
#[derive(Subcommand, Debug)]
pub enum CredentialAction {
    /// Capture the host agent's auth files into a named credential.
    Import {
        /// Credential name.
        name: String,
        /// Agent the credential belongs to (defaults from global
        /// config).
        #[arg(long)]
        agent: Option<String>,
        /// Host directory to import from (defaults to the agent's auth
        /// dir under the home directory).
        #[arg(long, value_name = "PATH")]
        source_dir: Option<String>,
    },
    /// List stored credentials.
    List,
    /// Remove a credential and its file payloads.
    Remove {
        /// Credential name.
        name: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Executes the `credential` command.
///
/// # Errors
///
/// Returns an error if the referenced agent or credential is missing or
/// the store fails.
pub fn execute(args: CredentialArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    match args.action {
        CredentialAction::Import {
            name,
            agent,
            source_dir,
        } => import(&store, &name, agent.as_deref(), source_dir.as_deref()),
        CredentialAction::List => list(&store),
        CredentialAction::Remove { name, yes } => remove(&store, &name, yes),
    }
}

fn import(
    store: &ConfigStore,
    name: &str,
    agent_name: Option<&str>,
    source_dir: Option<&str>,
) -> anyhow::Result<()> {
    let global = store.load_global()?;
    let agent_name = agent_name
        .map(str::to_owned)
        .or_else(|| Some(global.defaults.agent).filter(|a| !a.is_empty()))
        .unwrap_or_else(|| constants::DEFAULT_AGENT.to_owned());
    let Some(agent) = store.load::<AgentConfig>(&agent_name)? else {
        bail!("agent '{agent_name}' is not defined; run 'petrel init' or add it");
    };

    let credential = credentials::import(
        store,
        name,
        &agent,
        source_dir.map(std::path::Path::new),
    )?;
    println!(
        "{GREEN}Imported{RESET} credential {BOLD}{}{RESET} from {}",
        credential.name, credential.source_dir
    );
    Ok(())
}

fn list(store: &ConfigStore) -> anyhow::Result<()> {
    let names = store.list(ResourceKind::Credential)?;
    if names.is_empty() {
        println!("No credentials stored. Import one with: petrel credential import <name>");
        return Ok(());
    }
    println!("{:<16} {:<12} {:<40}", "NAME", "AGENT", "SOURCE");
    println!("{}", "-".repeat(70));
    for name in &names {
        if let Some(cred) = store.load::<Credential>(name)? {
            println!("{:<16} {:<12} {:<40}", cred.name, cred.agent, cred.source_dir);
        }
    }
    Ok(())
}

fn remove(store: &ConfigStore, name: &str, yes: bool) -> anyhow::Result<()> {
    if store.load::<Credential>(name)?.is_none() {
        bail!("credential '{name}' not found");
    }
    if !yes && !prompt::confirm(&format!("Remove credential '{name}' and its files?")) {
        return Ok(());
    }
    store.delete(ResourceKind::Credential, name)?;
    let payload_dir = store.credential_dir(name);
    if payload_dir.exists() {
        std::fs::remove_dir_all(&payload_dir)?;
    }
    println!("{GREEN}Removed{RESET} credential {BOLD}{name}{RESET}");
    Ok(())
}
