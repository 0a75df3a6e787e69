//! Typed schema for the five resource kinds and their nested value objects.
//!
//! Resources are pure data: no behavior beyond defaults. Every resource is
//! identified by a `(kind, name)` pair; the name lives in the document
//! header (see [`crate::store`]), not in the spec payload, so it is never
//! duplicated on disk.

use petrel_common::constants;
use petrel_common::types::{NetworkMode, PersistenceMode, ResourceKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named, persisted configuration record.
///
/// Implemented by the five resource kinds. The associated [`ResourceKind`]
/// tags documents on disk and names the resource in `NotFound` errors.
pub trait NamedResource: Serialize + DeserializeOwned + Clone {
    /// Kind tag for this resource type.
    const KIND: ResourceKind;

    /// The resource name, unique within the kind.
    fn name(&self) -> &str;

    /// Sets the name when materializing from a document header.
    fn set_name(&mut self, name: &str);
}

macro_rules! impl_named_resource {
    ($ty:ty, $kind:expr) => {
        impl NamedResource for $ty {
            const KIND: ResourceKind = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn set_name(&mut self, name: &str) {
                self.name = name.to_owned();
            }
        }
    };
}

// ── Project ──────────────────────────────────────────────────────────────

/// Git author identity injected into a sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitIdentity {
    /// Author/committer name. Empty means no identity is injected.
    pub name: String,
    /// Author/committer email; paired with `name`.
    pub email: String,
}

/// SSH material made available to a sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshSpec {
    /// Host path of the private key to mount. Empty means none.
    pub private_key: String,
}

/// Per-scope image build additions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageOverrides {
    /// Extra packages appended to the core and default sets.
    pub extra_packages: Vec<String>,
    /// Extra shell steps appended after provisioning.
    pub extra_commands: Vec<String>,
}

/// Identity for one sandbox: where the source lives and which shared
/// resources govern it.
///
/// `directory` and `repo` are mutually exclusive at creation time; both are
/// non-empty only after a repo has been cloned to its deterministic local
/// path. Reference fields hold resource names; empty means "use default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Project {
    /// Resource name, from the document header.
    #[serde(skip)]
    pub name: String,
    /// Local source directory to mount.
    pub directory: String,
    /// Git URL to clone on first run.
    pub repo: String,
    /// Environment reference.
    pub environment: String,
    /// Security profile reference.
    pub security: String,
    /// Agent reference.
    pub agent: String,
    /// Credential reference; empty means no credential.
    pub credential: String,
    /// Remote execution host (SSH target); empty means local.
    pub host: String,
    /// Git author identity.
    pub git: GitIdentity,
    /// SSH key configuration.
    pub ssh: SshSpec,
    /// Per-project image build additions.
    pub image: ImageOverrides,
}

impl Project {
    /// Creates an empty project with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether this project runs on a remote host.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        !self.host.is_empty()
    }
}

impl_named_resource!(Project, ResourceKind::Project);

// ── Environment ──────────────────────────────────────────────────────────

/// Low-level Docker options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DockerOptions {
    /// OCI runtime override (e.g. `runsc`). Empty means engine default.
    pub container_runtime: String,
}

/// Network policy for sandboxes in an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSpec {
    /// Network mode applied at run time.
    pub mode: NetworkMode,
}

/// Agent-state persistence policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistenceSpec {
    /// How agent state survives restarts.
    pub mode: PersistenceMode,
}

/// Execution substrate policy for a set of sandboxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Environment {
    /// Resource name, from the document header.
    #[serde(skip)]
    pub name: String,
    /// Execution backend identifier.
    pub driver: String,
    /// Docker-specific options.
    pub docker: DockerOptions,
    /// Network policy.
    pub network: NetworkSpec,
    /// Persistence policy.
    pub persistence: PersistenceSpec,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            name: String::new(),
            driver: constants::DOCKER_DRIVER.to_owned(),
            docker: DockerOptions::default(),
            network: NetworkSpec::default(),
            persistence: PersistenceSpec::default(),
        }
    }
}

impl Environment {
    /// Creates an environment with the given name and default policy.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl_named_resource!(Environment, ResourceKind::Environment);

// ── SecurityProfile ──────────────────────────────────────────────────────

/// Privilege toggles for the agent inside a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentPrivileges {
    /// Whether the sandbox user keeps sudo after provisioning.
    pub sudo: bool,
}

impl Default for AgentPrivileges {
    fn default() -> Self {
        // Privilege defaults to permissive; restriction is opt-in.
        Self { sudo: true }
    }
}

/// Named bundle of privilege toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityProfile {
    /// Resource name, from the document header.
    #[serde(skip)]
    pub name: String,
    /// Agent privilege toggles.
    pub agent: AgentPrivileges,
}

impl SecurityProfile {
    /// Creates a profile with the given name and permissive defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl_named_resource!(SecurityProfile, ResourceKind::SecurityProfile);

// ── AgentConfig ──────────────────────────────────────────────────────────

/// Ordered shell steps that provision an agent into the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallSpec {
    /// Provisioning commands, run in order.
    pub commands: Vec<String>,
}

/// Where an agent keeps its authentication state in its home directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSpec {
    /// State directory relative to the home directory (e.g. `.claude`).
    pub dir: String,
    /// Credential file names inside (or beside) the state directory.
    pub files: Vec<String>,
    /// Command that starts an interactive login inside the sandbox.
    pub login_command: String,
}

/// Describes one coding-agent product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Resource name, from the document header.
    #[serde(skip)]
    pub name: String,
    /// Provisioning steps.
    pub install: InstallSpec,
    /// Authentication state layout.
    pub auth: AuthSpec,
}

impl AgentConfig {
    /// Creates an agent definition with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The agent's state directory name, defaulting to `.claude` when the
    /// definition leaves it empty.
    #[must_use]
    pub fn state_dir(&self) -> &str {
        if self.auth.dir.is_empty() {
            ".claude"
        } else {
            &self.auth.dir
        }
    }
}

impl_named_resource!(AgentConfig, ResourceKind::AgentConfig);

// ── Credential ───────────────────────────────────────────────────────────

/// A named, reusable stash of captured authentication files for one agent.
///
/// The file payloads live under the store's credential directory; this
/// record only carries provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Credential {
    /// Resource name, from the document header.
    #[serde(skip)]
    pub name: String,
    /// Agent this credential belongs to.
    pub agent: String,
    /// Host directory the files were imported from.
    pub source_dir: String,
}

impl Credential {
    /// Creates a credential record for the given agent.
    #[must_use]
    pub fn new(name: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent: agent.into(),
            source_dir: String::new(),
        }
    }
}

impl_named_resource!(Credential, ResourceKind::Credential);

// ── GlobalConfig ─────────────────────────────────────────────────────────

/// Default resource names substituted for empty project references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    /// Default security profile name.
    pub security: String,
    /// Default agent name.
    pub agent: String,
    /// Default SSH private key path offered when adding projects.
    pub ssh_key: String,
}

/// Process-wide defaults; a singleton per installation, not a named
/// resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Tag for the sandbox image.
    pub image_name: String,
    /// Base image for sandbox builds.
    pub base_image: String,
    /// Default resource names.
    pub defaults: Defaults,
    /// Installation-wide image build additions.
    pub image: ImageOverrides,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            image_name: constants::DEFAULT_IMAGE_NAME.to_owned(),
            base_image: constants::DEFAULT_BASE_IMAGE.to_owned(),
            defaults: Defaults::default(),
            image: ImageOverrides::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_defaults_are_empty() {
        let p = Project::new("test");
        assert_eq!(p.name, "test");
        assert_eq!(p.repo, "");
        assert_eq!(p.directory, "");
        assert_eq!(p.credential, "");
        assert!(!p.is_remote());
    }

    #[test]
    fn project_spec_roundtrips_without_name() {
        let mut p = Project::new("test");
        p.repo = "git@github.com:user/repo.git".to_owned();
        let yaml = serde_yaml::to_string(&p).expect("serialize");
        assert!(!yaml.contains("test"), "name must not appear in spec: {yaml}");

        let mut back: Project = serde_yaml::from_str(&yaml).expect("deserialize");
        back.set_name("test");
        assert_eq!(back, p);
    }

    #[test]
    fn project_directory_and_repo_coexist_after_materialization() {
        let mut p = Project::new("test");
        p.repo = "https://x.com/r.git".to_owned();
        p.directory = "/tmp/clone".to_owned();
        assert_eq!(p.repo, "https://x.com/r.git");
        assert_eq!(p.directory, "/tmp/clone");
    }

    #[test]
    fn environment_defaults_to_docker_bridge_bind() {
        let env = Environment::new("local-docker");
        assert_eq!(env.driver, "docker");
        assert_eq!(env.network.mode, NetworkMode::Bridge);
        assert_eq!(env.persistence.mode, PersistenceMode::Bind);
        assert_eq!(env.docker.container_runtime, "");
    }

    #[test]
    fn security_profile_defaults_permissive() {
        let sec = SecurityProfile::new("open");
        assert!(sec.agent.sudo);
    }

    #[test]
    fn agent_state_dir_falls_back_to_claude() {
        let mut agent = AgentConfig::new("mystery");
        assert_eq!(agent.state_dir(), ".claude");
        agent.auth.dir = ".mystery".to_owned();
        assert_eq!(agent.state_dir(), ".mystery");
    }

    #[test]
    fn unknown_spec_keys_are_rejected() {
        let yaml = "directory: /src\nbogus_field: 1\n";
        let parsed: std::result::Result<Project, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_config_defaults() {
        let g = GlobalConfig::default();
        assert_eq!(g.image_name, "petrel-base");
        assert_eq!(g.base_image, "debian:bookworm-slim");
        assert_eq!(g.defaults.security, "");
    }

    #[test]
    fn empty_global_document_parses_to_defaults() {
        let g: GlobalConfig = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(g, GlobalConfig::default());
    }
}
