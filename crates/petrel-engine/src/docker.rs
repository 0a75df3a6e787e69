//! Subprocess glue around the Docker binary.
//!
//! Queries are best-effort: a missing engine binary or an unreachable
//! remote host reads as "nothing running" rather than an error, so
//! inspection commands keep working on machines without Docker. Mutating
//! operations (build, stop) report failures.
//!
//! Remote hosts are reached by prefixing the engine invocation with
//! `ssh <host>`; remote state is read-only from Petrel's point of view.

use std::path::{Path, PathBuf};
use std::process::Command;

use petrel_common::constants::CONTAINER_PREFIX;
use petrel_common::error::{PetrelError, Result};
use serde::Deserialize;

use crate::dockerfile;
use crate::image::ImageSpec;

/// Container entrypoint script, baked into every image.
pub const ENTRYPOINT_SCRIPT: &str = include_str!("../assets/entrypoint.sh");

/// Whether the Docker binary is on `PATH`.
#[must_use]
pub fn engine_available() -> bool {
    which::which("docker").is_ok()
}

fn local_engine() -> Command {
    Command::new("docker")
}

/// Runs a docker query locally or through `ssh <host>`. Remote arguments
/// are shell-quoted so filter patterns and format templates survive the
/// remote shell.
fn engine_output(host: Option<&str>, args: &[&str]) -> std::io::Result<std::process::Output> {
    match host {
        Some(host) => {
            let command = std::iter::once("docker")
                .chain(args.iter().copied())
                .map(shell_quote)
                .collect::<Vec<_>>()
                .join(" ");
            Command::new("ssh").arg(host).arg(command).output()
        }
        None => local_engine().args(args).output(),
    }
}

fn shell_quote(token: &str) -> String {
    let safe = token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':'));
    if safe && !token.is_empty() {
        token.to_owned()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

/// Whether a container with exactly this name is running.
#[must_use]
pub fn container_running(name: &str, host: Option<&str>) -> bool {
    let output = engine_output(host, &["ps", "-q", "--filter", &format!("name=^{name}$")]);
    match output {
        Ok(out) => !String::from_utf8_lossy(&out.stdout).trim().is_empty(),
        Err(_) => false,
    }
}

/// One line of `docker ps` JSON output; only the name matters here.
#[derive(Debug, Deserialize)]
struct PsEntry {
    #[serde(rename = "Names")]
    names: String,
}

/// Names of running sandbox containers (the `petrel-` prefix family).
#[must_use]
pub fn running_sandboxes(host: Option<&str>) -> Vec<String> {
    let output = engine_output(
        host,
        &[
            "ps",
            "--filter",
            &format!("name=^{CONTAINER_PREFIX}"),
            "--format",
            "{{json .}}",
        ],
    );
    match output {
        Ok(out) => parse_names(&String::from_utf8_lossy(&out.stdout)),
        Err(err) => {
            tracing::debug!(?host, %err, "container query failed");
            Vec::new()
        }
    }
}

fn parse_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<PsEntry>(line.trim()).ok())
        .map(|entry| entry.names)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Whether the image exists in the local engine store.
#[must_use]
pub fn image_exists(name: &str) -> bool {
    engine_output(None, &["image", "inspect", name]).is_ok_and(|out| out.status.success())
}

/// Stops a running container.
///
/// # Errors
///
/// Returns an error if the engine invocation fails or exits nonzero.
pub fn stop_container(name: &str) -> Result<()> {
    tracing::info!(name, "stopping container");
    let status = local_engine()
        .args(["stop", name])
        .status()
        .map_err(|e| PetrelError::io("docker", e))?;
    if status.success() {
        Ok(())
    } else {
        Err(PetrelError::Engine {
            message: format!("docker stop {name} exited with {status}"),
        })
    }
}

/// Removes a named volume. Returns `false` when the volume is absent or
/// in use.
#[must_use]
pub fn remove_volume(name: &str) -> bool {
    engine_output(None, &["volume", "rm", name]).is_ok_and(|out| out.status.success())
}

/// Stages the build context for an image: rendered Dockerfile, entrypoint
/// script, and whatever non-secret settings files exist in
/// `settings_source`.
///
/// # Errors
///
/// Returns an error if the context directory cannot be populated.
pub fn stage_build_context(
    spec: &ImageSpec,
    context_dir: &Path,
    settings_source: Option<&Path>,
) -> Result<()> {
    if context_dir.exists() {
        std::fs::remove_dir_all(context_dir).map_err(|e| PetrelError::io(context_dir, e))?;
    }
    std::fs::create_dir_all(context_dir).map_err(|e| PetrelError::io(context_dir, e))?;

    let dockerfile_path = context_dir.join("Dockerfile");
    std::fs::write(&dockerfile_path, dockerfile::render(spec))
        .map_err(|e| PetrelError::io(&dockerfile_path, e))?;

    let entrypoint_path = context_dir.join("entrypoint.sh");
    std::fs::write(&entrypoint_path, ENTRYPOINT_SCRIPT)
        .map_err(|e| PetrelError::io(&entrypoint_path, e))?;

    let settings_dir = context_dir.join("agent-settings");
    std::fs::create_dir_all(&settings_dir).map_err(|e| PetrelError::io(&settings_dir, e))?;
    if let Some(source) = settings_source {
        for file in &spec.settings_files {
            let from = source.join(file);
            if from.is_file() {
                let to = settings_dir.join(file);
                let _ = std::fs::copy(&from, &to).map_err(|e| PetrelError::io(&to, e))?;
            }
        }
    }
    Ok(())
}

/// Builds the sandbox image: stages a throwaway context under
/// `work_dir`, invokes `docker build` with the host UID/GID, and cleans
/// the context up afterwards.
///
/// # Errors
///
/// Returns an error if staging fails, the engine invocation fails, or
/// the build exits nonzero.
pub fn build_image(
    spec: &ImageSpec,
    image_name: &str,
    work_dir: &Path,
    settings_source: Option<&Path>,
) -> Result<()> {
    let context_dir = work_dir.join(".build-context");
    stage_build_context(spec, &context_dir, settings_source)?;

    let (uid, gid) = host_ids();
    tracing::info!(image = image_name, uid, gid, "building sandbox image");
    let status = local_engine()
        .args([
            "build",
            "--build-arg",
            &format!("USER_UID={uid}"),
            "--build-arg",
            &format!("USER_GID={gid}"),
            "-t",
            image_name,
        ])
        .arg(&context_dir)
        .status()
        .map_err(|e| PetrelError::io("docker", e));

    let cleanup = std::fs::remove_dir_all(&context_dir);
    if let Err(err) = cleanup {
        tracing::warn!(path = %context_dir.display(), %err, "failed to clean build context");
    }

    let status = status?;
    if status.success() {
        Ok(())
    } else {
        Err(PetrelError::Engine {
            message: format!("docker build exited with {status}"),
        })
    }
}

#[cfg(unix)]
fn host_ids() -> (u32, u32) {
    (
        nix::unistd::getuid().as_raw(),
        nix::unistd::getgid().as_raw(),
    )
}

#[cfg(not(unix))]
fn host_ids() -> (u32, u32) {
    (1000, 1000)
}

/// Replaces the current process with an interactive shell inside a
/// running container.
///
/// # Errors
///
/// Returns an error only if the exec itself fails.
pub fn exec_shell(container: &str) -> Result<()> {
    let argv: Vec<String> = [
        "docker", "exec", "-it", container, "/bin/bash",
    ]
    .iter()
    .map(|&s| s.to_owned())
    .collect();
    replace_process(&argv)
}

/// Replaces the current process with the given argv (Unix `execvp`). On
/// non-Unix hosts the command runs as a child instead and this returns
/// once it exits.
///
/// # Errors
///
/// Returns an error if the argv is empty or the process cannot be
/// started.
#[cfg(unix)]
pub fn replace_process(argv: &[String]) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let Some((program, args)) = argv.split_first() else {
        return Err(PetrelError::Engine {
            message: "empty run command".into(),
        });
    };
    tracing::debug!(?argv, "replacing process");
    let err = Command::new(program).args(args).exec();
    Err(PetrelError::io(PathBuf::from(program), err))
}

/// See the Unix variant; this one waits for the child.
///
/// # Errors
///
/// Returns an error if the argv is empty, the process cannot be started,
/// or it exits nonzero.
#[cfg(not(unix))]
pub fn replace_process(argv: &[String]) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Err(PetrelError::Engine {
            message: "empty run command".into(),
        });
    };
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| PetrelError::io(PathBuf::from(program), e))?;
    if status.success() {
        Ok(())
    } else {
        Err(PetrelError::Engine {
            message: format!("{program} exited with {status}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use petrel_config::resources::AgentConfig;

    use super::*;
    use crate::image::compile_image;

    #[test]
    fn parse_names_reads_json_lines() {
        let stdout = concat!(
            r#"{"Names":"petrel-a","State":"running"}"#,
            "\n",
            r#"{"Names":"petrel-b","State":"running"}"#,
            "\n\n",
        );
        let names = parse_names(stdout);
        assert_eq!(names, vec!["petrel-a".to_owned(), "petrel-b".to_owned()]);
        assert!(parse_names("").is_empty());
    }

    #[test]
    fn parse_names_skips_malformed_lines() {
        let names = parse_names("not json\n{\"Names\":\"petrel-c\"}\n");
        assert_eq!(names, vec!["petrel-c".to_owned()]);
    }

    #[test]
    fn shell_quote_protects_filters_and_templates() {
        assert_eq!(shell_quote("ps"), "ps");
        assert_eq!(shell_quote("--filter"), "--filter");
        assert_eq!(shell_quote("{{json .}}"), "'{{json .}}'");
        assert_eq!(shell_quote("name=^petrel-demo$"), "'name=^petrel-demo$'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn entrypoint_script_is_embedded() {
        assert!(ENTRYPOINT_SCRIPT.starts_with("#!"));
        assert!(ENTRYPOINT_SCRIPT.contains(".ssh-mount"));
    }

    #[test]
    fn stage_build_context_writes_manifest_and_entrypoint() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = dir.path().join("ctx");
        let spec = compile_image(
            Some(&AgentConfig::new("claude")),
            None,
            "debian:bookworm-slim",
            &[],
            &[],
        );
        stage_build_context(&spec, &context, None).expect("stage");

        let manifest = std::fs::read_to_string(context.join("Dockerfile")).expect("read");
        assert!(manifest.starts_with("FROM debian:bookworm-slim"));
        assert!(context.join("entrypoint.sh").is_file());
        assert!(context.join("agent-settings").is_dir());
    }

    #[test]
    fn stage_build_context_copies_only_existing_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("host-claude");
        std::fs::create_dir_all(&source).expect("mkdir");
        std::fs::write(source.join("settings.json"), "{}").expect("write");
        // settings.local.json intentionally absent.

        let context = dir.path().join("ctx");
        let spec = compile_image(None, None, "debian:bookworm-slim", &[], &[]);
        stage_build_context(&spec, &context, Some(&source)).expect("stage");

        assert!(context.join("agent-settings/settings.json").is_file());
        assert!(!context.join("agent-settings/settings.local.json").exists());
    }

    #[test]
    fn stage_build_context_replaces_stale_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = dir.path().join("ctx");
        std::fs::create_dir_all(&context).expect("mkdir");
        std::fs::write(context.join("stale.txt"), "old").expect("write");

        let spec = compile_image(None, None, "debian:bookworm-slim", &[], &[]);
        stage_build_context(&spec, &context, None).expect("stage");
        assert!(!context.join("stale.txt").exists());
    }
}
