//! Run spec compilation.
//!
//! Assembles the exact ordered `docker run` argv for a resolved
//! configuration. Pure apart from read-only existence checks on the SSH
//! material and the project directory: two calls with identical inputs
//! and identical filesystem answers produce byte-identical output. The
//! caller creates the bind-mode data directory before invoking this.

use std::path::Path;

use petrel_common::constants::{
    self, DOCKER_DRIVER, PROJECT_MOUNT, SANDBOX_HOME, SSH_STAGING_MOUNT,
};
use petrel_common::types::{NetworkMode, PersistenceMode};
use petrel_config::resolve::EffectiveConfig;

/// Compiles the full run argv, engine binary included.
#[must_use]
pub fn compile_run(cfg: &EffectiveConfig, image_name: &str, data_dir: &Path) -> Vec<String> {
    let project = &cfg.project;
    let container = constants::container_name(&project.name);

    let mut argv: Vec<String> = ["docker", "run", "-it", "--rm", "--name"]
        .iter()
        .map(|&s| s.to_owned())
        .collect();
    argv.push(container);

    // Low-level OCI runtime override (gVisor, Kata, ...)
    let runtime = &cfg.environment.docker.container_runtime;
    if !runtime.is_empty() {
        argv.push("--runtime".to_owned());
        argv.push(runtime.clone());
    }

    // Git identity: author and committer travel as a pair
    if !project.git.name.is_empty() {
        for (var, value) in [
            ("GIT_AUTHOR_NAME", &project.git.name),
            ("GIT_AUTHOR_EMAIL", &project.git.email),
            ("GIT_COMMITTER_NAME", &project.git.name),
            ("GIT_COMMITTER_EMAIL", &project.git.email),
        ] {
            argv.push("-e".to_owned());
            argv.push(format!("{var}={value}"));
        }
    }

    push_ssh_mounts(&mut argv, &project.ssh.private_key);

    // Project source, read-write
    if !project.directory.is_empty() && Path::new(&project.directory).is_dir() {
        argv.push("-v".to_owned());
        argv.push(format!("{}:{PROJECT_MOUNT}", project.directory));
    }

    // Agent state persistence
    let state_dir = cfg.agent.state_dir();
    let state_target = format!("{SANDBOX_HOME}/{state_dir}");
    argv.push("-v".to_owned());
    match cfg.environment.persistence.mode {
        PersistenceMode::Bind => {
            argv.push(format!("{}:{state_target}", data_dir.display()));
        }
        PersistenceMode::Volume => {
            argv.push(format!("{}:{state_target}", volume_name(&project.name, state_dir)));
        }
    }

    match cfg.environment.network.mode {
        NetworkMode::Host => argv.push("--network=host".to_owned()),
        NetworkMode::None => argv.push("--network=none".to_owned()),
        NetworkMode::Internal => {
            // True internal networks need engine features the plain
            // driver does not have; non-plain drivers keep their default
            // network (the validator warns about this).
            if cfg.environment.driver == DOCKER_DRIVER {
                argv.push("--network=none".to_owned());
            }
        }
        NetworkMode::Bridge => {}
    }

    argv.push(image_name.to_owned());
    argv
}

/// Named volume for a project's agent state.
#[must_use]
pub fn volume_name(project: &str, state_dir: &str) -> String {
    let suffix = state_dir.trim_start_matches('.');
    let suffix = if suffix.is_empty() { "state" } else { suffix };
    format!("{}-{suffix}", constants::container_name(project))
}

/// Mounts the private key, its public half, and the adjacent
/// `known_hosts` into the staging directory, each only if it exists.
fn push_ssh_mounts(argv: &mut Vec<String>, private_key: &str) {
    if private_key.is_empty() || !Path::new(private_key).is_file() {
        return;
    }
    let key_path = Path::new(private_key);
    let key_name = key_path
        .file_name()
        .map_or_else(|| private_key.to_owned(), |n| n.to_string_lossy().into_owned());

    argv.push("-v".to_owned());
    argv.push(format!("{private_key}:{SSH_STAGING_MOUNT}/{key_name}:ro"));

    let public_key = format!("{private_key}.pub");
    if Path::new(&public_key).is_file() {
        argv.push("-v".to_owned());
        argv.push(format!("{public_key}:{SSH_STAGING_MOUNT}/{key_name}.pub:ro"));
    }

    if let Some(known_hosts) = key_path.parent().map(|p| p.join("known_hosts")) {
        if known_hosts.is_file() {
            argv.push("-v".to_owned());
            argv.push(format!(
                "{}:{SSH_STAGING_MOUNT}/known_hosts:ro",
                known_hosts.display()
            ));
        }
    }
}
