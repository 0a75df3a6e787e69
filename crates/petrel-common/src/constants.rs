//! System-wide constants and default paths.

use std::path::PathBuf;

/// Application name used in CLI output and resource files.
pub const APP_NAME: &str = "petrel";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "petrel";

/// Prefix for every sandbox container name.
pub const CONTAINER_PREFIX: &str = "petrel-";

/// Environment variable overriding the config root location.
pub const CONFIG_ROOT_ENV: &str = "PETREL_HOME";

/// Unprivileged user every sandbox runs as.
pub const SANDBOX_USER: &str = "dev";

/// Home directory of the sandbox user.
pub const SANDBOX_HOME: &str = "/home/dev";

/// Fixed mount point for the project source tree inside the sandbox.
pub const PROJECT_MOUNT: &str = "/home/dev/project";

/// Staging directory SSH material is mounted into read-only; the
/// entrypoint copies it into `~/.ssh` with correct modes.
pub const SSH_STAGING_MOUNT: &str = "/home/dev/.ssh-mount";

/// Default base image for sandbox builds.
pub const DEFAULT_BASE_IMAGE: &str = "debian:bookworm-slim";

/// Default tag for the sandbox image.
pub const DEFAULT_IMAGE_NAME: &str = "petrel-base";

/// Fallback environment name when neither the project nor the global
/// config names one.
pub const DEFAULT_ENVIRONMENT: &str = "local-docker";

/// Fallback security profile name.
pub const DEFAULT_SECURITY: &str = "open";

/// Fallback (and well-known) agent name.
pub const DEFAULT_AGENT: &str = "claude";

/// Driver identifier for the plain local Docker backend.
pub const DOCKER_DRIVER: &str = "docker";

/// Returns the config root, preferring `$PETREL_HOME`, then
/// `$HOME/.petrel`, falling back to a system path.
#[must_use]
pub fn config_root() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_ROOT_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    home_dir().map_or_else(
        || PathBuf::from("/var/lib/petrel"),
        |home| home.join(".petrel"),
    )
}

/// Returns the invoking user's home directory, if known.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Container name for a project's sandbox.
#[must_use]
pub fn container_name(project: &str) -> String {
    format!("{CONTAINER_PREFIX}{project}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_name_applies_prefix() {
        assert_eq!(container_name("demo"), "petrel-demo");
    }

    #[test]
    fn sandbox_paths_live_under_sandbox_home() {
        assert!(PROJECT_MOUNT.starts_with(SANDBOX_HOME));
        assert!(SSH_STAGING_MOUNT.starts_with(SANDBOX_HOME));
    }
}
