//! Pure Dockerfile rendering from an [`ImageSpec`].
//!
//! The renderer owns the fixed scaffolding every sandbox image shares
//! (non-root user matched to the host UID/GID, entrypoint wiring); all
//! variable content comes from the spec. Identical specs render to
//! byte-identical text.

use std::fmt::Write as _;

use petrel_common::constants::{SANDBOX_HOME, SANDBOX_USER};

use crate::image::ImageSpec;

/// Renders the build manifest for a sandbox image.
#[must_use]
pub fn render(spec: &ImageSpec) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "FROM {}", spec.base_image);
    out.push_str(
        "\nARG DEBIAN_FRONTEND=noninteractive\nARG USER_UID=1000\nARG USER_GID=1000\n",
    );

    // Core system packages
    out.push_str("\nRUN apt-get update && apt-get install -y --no-install-recommends \\\n");
    let _ = writeln!(out, "    {} \\", spec.packages.join(" \\\n    "));
    out.push_str("    && rm -rf /var/lib/apt/lists/*\n");

    // Non-root user matching the host UID/GID when possible
    let _ = writeln!(
        out,
        r#"
RUN set -eux; \
    if ! getent group "$USER_GID" >/dev/null; then groupadd --gid "$USER_GID" {user}; fi; \
    if getent passwd "$USER_UID" >/dev/null; then \
        existing_user="$(getent passwd "$USER_UID" | cut -d: -f1)"; \
        if [ "$existing_user" != "{user}" ]; then usermod -l {user} "$existing_user"; fi; \
        usermod -d {home} -m {user}; \
        usermod -g "$USER_GID" {user}; \
    else \
        useradd --uid "$USER_UID" --gid "$USER_GID" -m -s /bin/bash {user}; \
    fi; \
    echo "{user} ALL=(ALL) NOPASSWD:ALL" >> /etc/sudoers"#,
        user = SANDBOX_USER,
        home = SANDBOX_HOME,
    );

    let _ = writeln!(out, "\nUSER {SANDBOX_USER}\nWORKDIR {SANDBOX_HOME}");

    // Non-secret agent settings, copied into the state dir on first run
    let _ = writeln!(
        out,
        "\nCOPY --chown={SANDBOX_USER}:{SANDBOX_USER} agent-settings/ {SANDBOX_HOME}/{}-defaults/",
        spec.state_dir
    );

    // Placeholder directories for run-time mounts
    let _ = writeln!(
        out,
        "RUN mkdir -p {SANDBOX_HOME}/.ssh {SANDBOX_HOME}/project {SANDBOX_HOME}/{}",
        spec.state_dir
    );

    out.push('\n');
    for (key, value) in &spec.env {
        let _ = writeln!(out, "ENV {key}=\"{value}\"");
    }

    if !spec.steps.is_empty() {
        out.push('\n');
        for step in &spec.steps {
            let _ = writeln!(out, "RUN {step}");
        }
    }

    let _ = writeln!(
        out,
        "\nCOPY --chown={SANDBOX_USER}:{SANDBOX_USER} entrypoint.sh {SANDBOX_HOME}/entrypoint.sh\n\
         RUN chmod +x {SANDBOX_HOME}/entrypoint.sh\n\
         \nENTRYPOINT [\"{SANDBOX_HOME}/entrypoint.sh\"]"
    );

    out
}

#[cfg(test)]
mod tests {
    use petrel_config::resources::{AgentConfig, SecurityProfile};

    use super::*;
    use crate::image::compile_image;

    fn spec() -> ImageSpec {
        compile_image(
            Some(&AgentConfig::new("claude")),
            None,
            "debian:bookworm-slim",
            &[],
            &[],
        )
    }

    #[test]
    fn renders_from_line_first() {
        let text = render(&spec());
        assert!(text.starts_with("FROM debian:bookworm-slim\n"));
    }

    #[test]
    fn renders_every_package_once() {
        let text = render(&spec());
        assert!(text.contains("ca-certificates"));
        assert!(text.contains("openssh-client"));
        assert_eq!(text.matches("\n    jq ").count(), 1);
    }

    #[test]
    fn renders_steps_in_order() {
        let mut agent = AgentConfig::new("claude");
        agent.install.commands = vec!["echo first".to_owned(), "echo second".to_owned()];
        let spec = compile_image(Some(&agent), None, "debian:bookworm-slim", &[], &[]);
        let text = render(&spec);
        let first = text.find("RUN echo first").expect("first");
        let second = text.find("RUN echo second").expect("second");
        assert!(first < second);
    }

    #[test]
    fn privilege_removal_renders_before_entrypoint() {
        let mut sec = SecurityProfile::new("locked");
        sec.agent.sudo = false;
        let spec = compile_image(
            Some(&AgentConfig::new("claude")),
            Some(&sec),
            "debian:bookworm-slim",
            &[],
            &[],
        );
        let text = render(&spec);
        let removal = text.find("deluser").expect("removal step");
        let entrypoint = text.find("ENTRYPOINT").expect("entrypoint");
        assert!(removal < entrypoint);
    }

    #[test]
    fn rendering_is_reproducible() {
        assert_eq!(render(&spec()), render(&spec()));
    }

    #[test]
    fn state_dir_appears_in_defaults_and_placeholders() {
        let text = render(&spec());
        assert!(text.contains("/home/dev/.claude-defaults/"));
        assert!(text.contains("mkdir -p /home/dev/.ssh /home/dev/project /home/dev/.claude"));
    }

    #[test]
    fn sandbox_user_is_unprivileged_by_default() {
        let text = render(&spec());
        assert!(text.contains("USER dev"));
        assert!(text.contains("NOPASSWD:ALL"));
    }
}
