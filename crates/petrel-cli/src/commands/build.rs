//! `petrel build` — Build the sandbox image.
//!
//! Compiles the image spec from the global defaults (optionally enriched
//! with one project's overrides), renders the Dockerfile, and invokes
//! `docker build`.

#![allow(clippy::print_stdout)]

use anyhow::bail;
use clap::Args;
use petrel_common::constants;
use petrel_config::credentials;
use petrel_config::resolve;
use petrel_config::resources::{AgentConfig, SecurityProfile};
use petrel_config::store::ConfigStore;
use petrel_engine::{docker, image};

use crate::output::{BOLD, DIM, GREEN, RESET};

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Include this project's image overrides and resolved
    /// security/agent instead of the global defaults.
    #[arg(long)]
    pub project: Option<String>,
}

/// Executes the `build` command.
///
/// # Errors
///
/// Returns an error if petrel is not initialized, Docker is missing, or
/// the build fails.
pub fn execute(args: &BuildArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    if !store.is_initialized() {
        bail!("petrel is not initialized; run 'petrel init' first");
    }
    if !docker::engine_available() {
        bail!("docker binary not found on PATH");
    }

    let global = store.load_global()?;
    let mut extra_packages = global.image.extra_packages.clone();
    let mut extra_commands = global.image.extra_commands.clone();

    let (security, agent) = match &args.project {
        Some(project) => {
            let cfg = resolve::resolve(&store, project)?;
            extra_packages.extend(cfg.project.image.extra_packages.iter().cloned());
            extra_commands.extend(cfg.project.image.extra_commands.iter().cloned());
            (Some(cfg.security), Some(cfg.agent))
        }
        None => {
            let security_name = default_name(&global.defaults.security, constants::DEFAULT_SECURITY);
            let agent_name = default_name(&global.defaults.agent, constants::DEFAULT_AGENT);
            let security: Option<SecurityProfile> = store.load(&security_name)?;
            let agent: Option<AgentConfig> = store.load(&agent_name)?;
            (security, agent)
        }
    };

    let spec = image::compile_image(
        agent.as_ref(),
        security.as_ref(),
        &global.base_image,
        &extra_packages,
        &extra_commands,
    );

    println!("Building sandbox image {BOLD}{}{RESET}", global.image_name);
    println!("  Base image: {}", spec.base_image);
    println!(
        "  Security:   {}",
        security.as_ref().map_or("(none)", |s| s.name.as_str())
    );
    println!(
        "  Agent:      {}",
        agent.as_ref().map_or("(none)", |a| a.name.as_str())
    );
    if !extra_packages.is_empty() {
        println!("  Extra pkgs: {}", extra_packages.join(", "));
    }
    println!();

    let settings_source = agent.as_ref().and_then(credentials::default_source_dir);
    docker::build_image(
        &spec,
        &global.image_name,
        store.root(),
        settings_source.as_deref(),
    )?;

    println!();
    println!("{GREEN}Build complete:{RESET} {}", global.image_name);
    println!("{DIM}Run 'petrel add <name> --dir <path>' to add a project.{RESET}");
    Ok(())
}

fn default_name(configured: &str, fallback: &str) -> String {
    if configured.is_empty() {
        fallback.to_owned()
    } else {
        configured.to_owned()
    }
}
