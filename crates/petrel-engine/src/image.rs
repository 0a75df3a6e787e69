//! Image spec compilation.
//!
//! Expands agent, security, and package/command overrides into a
//! deterministic [`ImageSpec`]. The expansion is injective over its
//! inputs: identical inputs always yield identical package ordering and
//! step ordering, so the rendered build manifest is reproducible for
//! caching and diffing.

use std::collections::HashSet;

use petrel_config::resources::{AgentConfig, SecurityProfile};
use serde::Serialize;

/// Packages required for the sandbox to function at all.
pub const CORE_PACKAGES: &[&str] = &[
    "ca-certificates",
    "curl",
    "wget",
    "git",
    "openssh-client",
    "sudo",
    "vim",
];

/// General-purpose shell utilities included in every sandbox. Only ever
/// appended to, never removed.
pub const DEFAULT_PACKAGES: &[&str] = &[
    "python3",
    "python3-pip",
    "procps",
    "coreutils",
    "findutils",
    "grep",
    "gawk",
    "sed",
    "less",
    "tree",
    "file",
    "htop",
    "jq",
    "zip",
    "unzip",
    "tar",
    "gzip",
    "bzip2",
    "xz-utils",
    "diffutils",
    "patch",
    "man-db",
    "manpages",
    "net-tools",
    "iputils-ping",
    "dnsutils",
];

/// Provisioning step that strips administrative privilege from the
/// sandbox user. Runs after every provisioning step and before any extra
/// commands.
pub const PRIVILEGE_REMOVAL_STEP: &str = "sudo deluser dev sudo 2>/dev/null || true && \
     sudo sed -i '/^dev /d' /etc/sudoers && \
     sudo rm -f /etc/sudoers.d/* && \
     sudo chmod 0440 /etc/sudoers";

/// Non-secret agent settings files staged into the build context and
/// baked into the image as first-run defaults.
pub const SETTINGS_FILES: &[&str] = &["settings.json", "settings.local.json"];

/// Built-in provisioning fallback for agents with no install commands.
#[must_use]
pub fn fallback_install(agent_name: &str) -> &'static [&'static str] {
    match agent_name {
        "claude" => &["curl -fsSL https://claude.ai/install.sh | bash"],
        _ => &[],
    }
}

/// The expanded, deterministic description of a sandbox image build.
///
/// Sufficient for [`crate::dockerfile::render`] to produce the build
/// manifest; contains no filesystem state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSpec {
    /// Base image reference.
    pub base_image: String,
    /// Deduplicated package list: core, then defaults, then extras, in
    /// first-occurrence order.
    pub packages: Vec<String>,
    /// Ordered shell steps: agent provisioning, then privilege removal
    /// (when sudo is disabled), then extra commands.
    pub steps: Vec<String>,
    /// Environment variables set in the image.
    pub env: Vec<(String, String)>,
    /// Agent state directory name (e.g. `.claude`); used for the
    /// settings-defaults target and placeholder directories.
    pub state_dir: String,
    /// Non-secret settings file names to embed as defaults.
    pub settings_files: Vec<String>,
}

/// Compiles an image build specification.
///
/// `security` absent means privilege stays permissive (no removal step);
/// `agent` absent falls back to the built-in claude provisioning.
/// Infallible: every input has a safe default.
#[must_use]
pub fn compile_image(
    agent: Option<&AgentConfig>,
    security: Option<&SecurityProfile>,
    base_image: &str,
    extra_packages: &[String],
    extra_commands: &[String],
) -> ImageSpec {
    let mut packages: Vec<String> = CORE_PACKAGES
        .iter()
        .chain(DEFAULT_PACKAGES.iter())
        .map(|&p| p.to_owned())
        .collect();
    packages.extend(extra_packages.iter().cloned());
    let packages = dedup_stable(packages);

    let mut steps: Vec<String> = match agent {
        Some(a) if !a.install.commands.is_empty() => a.install.commands.clone(),
        Some(a) => fallback_install(&a.name)
            .iter()
            .map(|&c| c.to_owned())
            .collect(),
        None => fallback_install(petrel_common::constants::DEFAULT_AGENT)
            .iter()
            .map(|&c| c.to_owned())
            .collect(),
    };

    let remove_privilege = security.is_some_and(|s| !s.agent.sudo);
    if remove_privilege {
        steps.push(PRIVILEGE_REMOVAL_STEP.to_owned());
    }
    steps.extend(extra_commands.iter().cloned());

    ImageSpec {
        base_image: base_image.to_owned(),
        packages,
        steps,
        env: vec![
            ("EDITOR".to_owned(), "vim".to_owned()),
            (
                "PATH".to_owned(),
                format!("{}/.local/bin:$PATH", petrel_common::constants::SANDBOX_HOME),
            ),
        ],
        state_dir: agent.map_or_else(|| ".claude".to_owned(), |a| a.state_dir().to_owned()),
        settings_files: SETTINGS_FILES.iter().map(|&f| f.to_owned()).collect(),
    }
}

/// Deduplicates preserving first-occurrence order.
fn dedup_stable(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claude_agent() -> AgentConfig {
        AgentConfig::new("claude")
    }

    fn no_sudo_profile() -> SecurityProfile {
        let mut sec = SecurityProfile::new("locked");
        sec.agent.sudo = false;
        sec
    }

    #[test]
    fn package_list_starts_with_core_then_defaults() {
        let spec = compile_image(None, None, "debian:bookworm-slim", &[], &[]);
        assert_eq!(&spec.packages[..CORE_PACKAGES.len()], CORE_PACKAGES);
        assert_eq!(
            spec.packages.len(),
            CORE_PACKAGES.len() + DEFAULT_PACKAGES.len()
        );
    }

    #[test]
    fn extra_packages_dedup_preserves_first_occurrence() {
        let extras: Vec<String> = ["aaa", "bbb", "aaa", "ccc"]
            .iter()
            .map(|&s| s.to_owned())
            .collect();
        let spec = compile_image(None, None, "debian:bookworm-slim", &extras, &[]);

        let tail = &spec.packages[spec.packages.len() - 3..];
        assert_eq!(tail, ["aaa", "bbb", "ccc"]);
        for pkg in ["aaa", "bbb", "ccc"] {
            assert_eq!(spec.packages.iter().filter(|p| *p == pkg).count(), 1);
        }
    }

    #[test]
    fn duplicate_of_default_package_is_not_repeated() {
        let extras = vec!["jq".to_owned()];
        let spec = compile_image(None, None, "debian:bookworm-slim", &extras, &[]);
        assert_eq!(spec.packages.iter().filter(|p| *p == "jq").count(), 1);
    }

    #[test]
    fn compilation_is_deterministic() {
        let extras = vec!["jq".to_owned(), "ripgrep".to_owned()];
        let a = compile_image(None, None, "debian:bookworm-slim", &extras, &[]);
        let b = compile_image(None, None, "debian:bookworm-slim", &extras, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn agent_install_commands_are_used_verbatim() {
        let mut agent = claude_agent();
        agent.install.commands = vec!["npm install -g some-agent".to_owned()];
        let spec = compile_image(Some(&agent), None, "debian:bookworm-slim", &[], &[]);
        assert_eq!(spec.steps, vec!["npm install -g some-agent".to_owned()]);
    }

    #[test]
    fn empty_install_falls_back_to_builtin_claude() {
        let agent = claude_agent();
        let spec = compile_image(Some(&agent), None, "debian:bookworm-slim", &[], &[]);
        assert_eq!(spec.steps.len(), 1);
        assert!(spec.steps[0].contains("claude.ai/install.sh"));
    }

    #[test]
    fn unknown_agent_without_install_yields_no_steps() {
        let agent = AgentConfig::new("mystery");
        let spec = compile_image(Some(&agent), None, "debian:bookworm-slim", &[], &[]);
        assert!(spec.steps.is_empty());
    }

    #[test]
    fn privilege_removal_only_when_sudo_disabled() {
        let agent = claude_agent();
        let open = compile_image(Some(&agent), Some(&SecurityProfile::new("open")), "x", &[], &[]);
        assert!(!open.steps.iter().any(|s| s.contains("deluser")));

        let locked = compile_image(Some(&agent), Some(&no_sudo_profile()), "x", &[], &[]);
        assert!(locked.steps.iter().any(|s| s.contains("deluser")));

        let absent = compile_image(Some(&agent), None, "x", &[], &[]);
        assert!(!absent.steps.iter().any(|s| s.contains("deluser")));
    }

    #[test]
    fn privilege_removal_runs_after_install_before_extras() {
        let mut agent = claude_agent();
        agent.install.commands =
            vec!["step-one".to_owned(), "step-two".to_owned()];
        let extras = vec!["extra-one".to_owned()];
        let spec = compile_image(Some(&agent), Some(&no_sudo_profile()), "x", &[], &extras);

        let pos = |needle: &str| {
            spec.steps
                .iter()
                .position(|s| s.contains(needle))
                .expect(needle)
        };
        let removal = pos("deluser");
        assert!(pos("step-one") < removal);
        assert!(pos("step-two") < removal);
        assert!(removal < pos("extra-one"));
    }

    #[test]
    fn claude_fallback_with_sudo_disabled_and_jq_extra() {
        let agent = claude_agent();
        let extras = vec!["jq".to_owned()];
        let spec = compile_image(
            Some(&agent),
            Some(&no_sudo_profile()),
            "debian:bookworm-slim",
            &extras,
            &[],
        );

        assert!(spec.steps[0].contains("claude.ai/install.sh"));
        assert_eq!(spec.steps[1], PRIVILEGE_REMOVAL_STEP);
        assert_eq!(spec.packages.iter().filter(|p| *p == "jq").count(), 1);
    }

    #[test]
    fn state_dir_tracks_agent_auth_dir() {
        let mut agent = AgentConfig::new("aider");
        agent.auth.dir = ".aider".to_owned();
        let spec = compile_image(Some(&agent), None, "x", &[], &[]);
        assert_eq!(spec.state_dir, ".aider");

        let spec = compile_image(None, None, "x", &[], &[]);
        assert_eq!(spec.state_dir, ".claude");
    }
}
