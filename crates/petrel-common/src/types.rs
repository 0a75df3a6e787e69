//! Domain primitive types used across the Petrel workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The five persisted resource kinds.
///
/// Every stored resource is identified by a `(kind, name)` pair; names are
/// unique within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A sandbox project.
    Project,
    /// An execution environment policy.
    Environment,
    /// A privilege profile.
    SecurityProfile,
    /// A coding-agent product definition.
    AgentConfig,
    /// A stash of captured agent authentication files.
    Credential,
}

impl ResourceKind {
    /// All kinds, in the order resolution dereferences them.
    pub const ALL: [Self; 5] = [
        Self::Project,
        Self::Environment,
        Self::SecurityProfile,
        Self::AgentConfig,
        Self::Credential,
    ];

    /// Directory name this kind is stored under inside the config root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Environment => "environments",
            Self::SecurityProfile => "security",
            Self::AgentConfig => "agents",
            Self::Credential => "credentials",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Environment => write!(f, "environment"),
            Self::SecurityProfile => write!(f, "security profile"),
            Self::AgentConfig => write!(f, "agent"),
            Self::Credential => write!(f, "credential"),
        }
    }
}

/// Network mode for a sandbox container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Share the host network namespace.
    Host,
    /// Default engine-managed bridge network.
    #[default]
    Bridge,
    /// No network access.
    None,
    /// Isolated network with no external egress.
    ///
    /// Only honored by the plain `docker` driver, where it maps to no
    /// network; other drivers fall back to their default network.
    Internal,
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Bridge => write!(f, "bridge"),
            Self::None => write!(f, "none"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// How agent state survives sandbox restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Bind-mount a host directory into the sandbox.
    #[default]
    Bind,
    /// Use an engine-managed named volume.
    Volume,
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "bind"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_is_human_readable() {
        assert_eq!(ResourceKind::SecurityProfile.to_string(), "security profile");
        assert_eq!(ResourceKind::AgentConfig.to_string(), "agent");
    }

    #[test]
    fn kind_dir_names_are_distinct() {
        let mut dirs: Vec<_> = ResourceKind::ALL.iter().map(|k| k.dir_name()).collect();
        dirs.sort_unstable();
        dirs.dedup();
        assert_eq!(dirs.len(), ResourceKind::ALL.len());
    }

    #[test]
    fn network_mode_serializes_lowercase() {
        let yaml = serde_yaml::to_string(&NetworkMode::Internal).expect("serialize");
        assert_eq!(yaml.trim(), "internal");
    }

    #[test]
    fn persistence_mode_default_is_bind() {
        assert_eq!(PersistenceMode::default(), PersistenceMode::Bind);
    }
}
