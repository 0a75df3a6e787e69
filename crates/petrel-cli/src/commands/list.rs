//! `petrel list` — List projects and their sandbox status.

#![allow(clippy::print_stdout)]

use std::collections::{HashMap, HashSet};

use clap::Args;
use petrel_common::constants;
use petrel_common::types::ResourceKind;
use petrel_config::resources::{Environment, Project};
use petrel_config::store::ConfigStore;
use petrel_engine::docker;

use crate::output::shorten_home;

/// Arguments for the `list` command.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Also show agent and credential columns.
    #[arg(long)]
    pub agent: bool,

    /// Also show security and network columns.
    #[arg(long)]
    pub security: bool,
}

/// Executes the `list` command.
///
/// Remote-host projects are queried over SSH, once per distinct host.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn execute(args: &ListArgs) -> anyhow::Result<()> {
    let store = ConfigStore::open_default();
    let names = store.list(ResourceKind::Project)?;
    if names.is_empty() {
        println!("No projects configured. Add one with: petrel add <name> --dir <path> or --repo <url>");
        return Ok(());
    }

    let global = store.load_global()?;
    let image_built = docker::image_exists(&global.image_name);

    let mut running: HashSet<String> = docker::running_sandboxes(None).into_iter().collect();
    let mut seen_hosts: HashMap<String, Vec<String>> = HashMap::new();

    print_header(args);

    let mut running_count = 0usize;
    for name in &names {
        let Some(project) = store.load::<Project>(name)? else {
            continue;
        };

        if project.is_remote() {
            let host_running = seen_hosts
                .entry(project.host.clone())
                .or_insert_with(|| docker::running_sandboxes(Some(&project.host)));
            running.extend(host_running.iter().cloned());
        }

        let container = constants::container_name(name);
        let status = if running.contains(&container) {
            running_count += 1;
            "running"
        } else if image_built {
            "stopped"
        } else {
            "missing"
        };

        print_row(&store, &project, status, args)?;
    }

    println!();
    println!("{} project(s), {running_count} running", names.len());
    Ok(())
}

fn print_header(args: &ListArgs) {
    print!("{:<16} {:<36} ", "NAME", "SOURCE");
    if args.agent {
        print!("{:<12} {:<14} ", "AGENT", "CREDENTIAL");
    }
    if args.security {
        print!("{:<12} {:<10} ", "SECURITY", "NETWORK");
    }
    println!("{:<10}", "STATUS");

    let width = 16 + 1 + 36 + 1 + 10
        + if args.agent { 12 + 1 + 14 + 1 } else { 0 }
        + if args.security { 12 + 1 + 10 + 1 } else { 0 };
    println!("{}", "-".repeat(width));
}

fn print_row(
    store: &ConfigStore,
    project: &Project,
    status: &str,
    args: &ListArgs,
) -> anyhow::Result<()> {
    let mut source = if project.directory.is_empty() {
        if project.repo.is_empty() {
            "(none)".to_owned()
        } else {
            project.repo.clone()
        }
    } else {
        shorten_home(&project.directory)
    };
    if project.is_remote() {
        source = format!("SSH:{} {source}", project.host);
    }

    print!("{:<16} {:<36} ", project.name, source);
    if args.agent {
        let agent = display_or(&project.agent, "(default)");
        let credential = display_or(&project.credential, "(none)");
        print!("{agent:<12} {credential:<14} ");
    }
    if args.security {
        let security = display_or(&project.security, "(default)");
        let network = environment_network(store, project)?;
        print!("{security:<12} {network:<10} ");
    }
    println!("{status:<10}");
    Ok(())
}

fn display_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_owned()
    } else {
        value.to_owned()
    }
}

/// Network mode of the project's environment, `?` when it cannot be
/// loaded (list stays usable with broken references).
fn environment_network(store: &ConfigStore, project: &Project) -> anyhow::Result<String> {
    let env_name = if project.environment.is_empty() {
        constants::DEFAULT_ENVIRONMENT
    } else {
        &project.environment
    };
    Ok(store
        .load::<Environment>(env_name)?
        .map_or_else(|| "?".to_owned(), |env| env.network.mode.to_string()))
}
