//! `petrel add` — Add a project.
//!
//! Source selection (`--dir` xor `--repo`), then credential and SSH key
//! setup. With `--yes` every choice falls back to a deterministic
//! default; otherwise missing choices are prompted.

#![allow(clippy::print_stdout)]

use std::path::Path;

use anyhow::{Context, bail};
use clap::Args;
use petrel_common::constants;
use petrel_common::error::PetrelError;
use petrel_common::types::ResourceKind;
use petrel_config::credentials;
use petrel_config::resources::{AgentConfig, Project};
use petrel_config::store::ConfigStore;
use petrel_engine::git;

use crate::output::{BOLD, GREEN, RESET, YELLOW};
use crate::prompt;

/// Arguments for the `add` command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project name.
    pub name: String,

    /// Local source directory to mount.
    #[arg(long = "dir", value_name = "PATH")]
    pub directory: Option<String>,

    /// Git URL to clone on first run.
    #[arg(long, value_name = "URL")]
    pub repo: Option<String>,

    /// SSH private key to mount into the sandbox.
    #[arg(long, value_name = "PATH")]
    pub ssh_key: Option<String>,

    /// Environment reference (defaults at resolve time when omitted).
    #[arg(long = "env")]
    pub environment: Option<String>,

    /// Security profile reference.
    #[arg(long)]
    pub security: Option<String>,

    /// Agent reference.
    #[arg(long)]
    pub agent: Option<String>,

    /// Credential reference.
    #[arg(long)]
    pub credential: Option<String>,

    /// Skip credential setup entirely.
    #[arg(long)]
    pub no_credential: bool,

    /// Non-interactive: accept deterministic defaults for every choice.
    #[arg(short, long)]
    pub yes: bool,
}

/// Executes the `add` command.
///
/// # Errors
///
/// Returns an error on conflicting or invalid sources, unknown
/// references, or store failures.
pub fn execute(args: AddArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    if !store.is_initialized() {
        bail!("petrel is not initialized; run 'petrel init' first");
    }

    let existing: Option<Project> = store.load(&args.name)?;
    if existing.is_some() {
        bail!("project '{}' already exists", args.name);
    }

    let mut project = Project::new(&args.name);
    set_source(&mut project, &args)?;

    let global = store.load_global()?;
    project.environment = args.environment.unwrap_or_default();
    project.security = args.security.unwrap_or_default();

    let agent_name = args
        .agent
        .clone()
        .filter(|a| !a.is_empty())
        .or_else(|| Some(global.defaults.agent.clone()).filter(|a| !a.is_empty()))
        .unwrap_or_else(|| constants::DEFAULT_AGENT.to_owned());
    project.agent = args.agent.unwrap_or_default();

    let agent: Option<AgentConfig> = store.load(&agent_name)?;
    project.credential = match &agent {
        Some(agent) => {
            select_credential(&store, agent, args.credential.as_deref(), args.no_credential, args.yes)?
        }
        None => {
            println!(
                "{YELLOW}Warning:{RESET} agent '{agent_name}' is not defined; skipping credential setup"
            );
            String::new()
        }
    };

    project.ssh.private_key = select_ssh_key(args.ssh_key.as_deref(), &global.defaults.ssh_key, args.yes);

    store.save(&project)?;

    let source = if project.directory.is_empty() {
        &project.repo
    } else {
        &project.directory
    };
    println!("{GREEN}Added{RESET} project {BOLD}{}{RESET} ({source})", project.name);
    println!("Start it with: petrel run {}", project.name);
    Ok(())
}

/// Applies `--dir` / `--repo`, enforcing mutual exclusivity and URL
/// shape.
fn set_source(project: &mut Project, args: &AddArgs) -> anyhow::Result<()> {
    match (&args.directory, &args.repo) {
        (Some(_), Some(_)) => Err(PetrelError::ConflictingSource {
            name: args.name.clone(),
        }
        .into()),
        (Some(dir), None) => {
            let path = Path::new(dir);
            if !path.is_dir() {
                bail!("directory does not exist: {dir}");
            }
            project.directory = path
                .canonicalize()
                .with_context(|| format!("cannot resolve {dir}"))?
                .to_string_lossy()
                .into_owned();
            Ok(())
        }
        (None, Some(repo)) => {
            if !git::is_git_url(repo) {
                bail!("not a git URL: {repo}");
            }
            project.repo = repo.clone();
            Ok(())
        }
        (None, None) => {
            bail!("provide a source: --dir <path> or --repo <url>")
        }
    }
}

/// Picks the credential reference for a new project.
///
/// Explicit flag wins; otherwise the first existing credential (sorted)
/// is used; otherwise auth files found on the host are offered for
/// import; otherwise setup is skipped.
fn select_credential(
    store: &ConfigStore,
    agent: &AgentConfig,
    requested: Option<&str>,
    no_credential: bool,
    yes: bool,
) -> anyhow::Result<String> {
    if no_credential {
        println!("Skipping credential setup (log in inside the sandbox).");
        return Ok(String::new());
    }

    if let Some(name) = requested {
        if store.load::<petrel_config::resources::Credential>(name)?.is_none() {
            return Err(PetrelError::not_found(ResourceKind::Credential, name).into());
        }
        return Ok(name.to_owned());
    }

    let existing = store.list(ResourceKind::Credential)?;
    if !existing.is_empty() {
        if yes || existing.len() == 1 {
            return Ok(existing[0].clone());
        }
        let index = prompt::select("Select credential:", &existing, 0);
        return Ok(existing[index].clone());
    }

    // Nothing stored yet: offer to capture the host's auth files.
    if credentials::any_auth_files_present(agent, None) {
        let fallback = format!("{}-default", agent.name);
        let name = if yes {
            fallback
        } else {
            prompt::input_or("Name for the imported credential", &fallback)
        };
        let imported = credentials::import(store, &name, agent, None)?;
        println!("Imported credential '{}' from {}", imported.name, imported.source_dir);
        return Ok(imported.name);
    }

    println!(
        "Skipping credential setup (no {} auth files found); log in inside the sandbox.",
        agent.name
    );
    Ok(String::new())
}

/// Picks the SSH key path: explicit flag, else (interactively) a
/// discovered key or the global default, else none.
fn select_ssh_key(requested: Option<&str>, global_default: &str, yes: bool) -> String {
    if let Some(key) = requested {
        return key.to_owned();
    }
    if yes {
        return global_default.to_owned();
    }

    let mut options: Vec<String> = Vec::new();
    if !global_default.is_empty() {
        options.push(global_default.to_owned());
    }
    for key in prompt::find_ssh_keys() {
        let key = key.to_string_lossy().into_owned();
        if !options.contains(&key) {
            options.push(key);
        }
    }
    if options.is_empty() {
        return String::new();
    }
    options.push("None".to_owned());

    let index = prompt::select("Select SSH key:", &options, 0);
    if options[index] == "None" {
        String::new()
    } else {
        options[index].clone()
    }
}
