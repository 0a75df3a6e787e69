//! Reference resolution and default substitution.
//!
//! Turns a project name into one fully-dereferenced [`EffectiveConfig`]:
//! empty reference fields are substituted from the global defaults (then
//! hard-coded fallbacks), and every resolved name is dereferenced through
//! an injected [`ResourceLookup`] capability. Missing references fail fast
//! with the exact `(kind, name)` pair, environment first, then security,
//! then agent, then credential.

use petrel_common::constants;
use petrel_common::error::{PetrelError, Result};
use petrel_common::types::ResourceKind;

use crate::resources::{
    AgentConfig, Credential, Environment, GlobalConfig, Project, SecurityProfile,
};
use crate::store::ConfigStore;

/// Read-only lookup capability the resolution engine runs against.
///
/// The file-backed [`ConfigStore`] is the production implementation; tests
/// inject an in-memory one.
pub trait ResourceLookup {
    /// Loads a project by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn project(&self, name: &str) -> Result<Option<Project>>;

    /// Loads an environment by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn environment(&self, name: &str) -> Result<Option<Environment>>;

    /// Loads a security profile by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn security(&self, name: &str) -> Result<Option<SecurityProfile>>;

    /// Loads an agent definition by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn agent(&self, name: &str) -> Result<Option<AgentConfig>>;

    /// Loads a credential record by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn credential(&self, name: &str) -> Result<Option<Credential>>;

    /// Loads the global config singleton.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn global(&self) -> Result<GlobalConfig>;
}

impl ResourceLookup for ConfigStore {
    fn project(&self, name: &str) -> Result<Option<Project>> {
        self.load(name)
    }

    fn environment(&self, name: &str) -> Result<Option<Environment>> {
        self.load(name)
    }

    fn security(&self, name: &str) -> Result<Option<SecurityProfile>> {
        self.load(name)
    }

    fn agent(&self, name: &str) -> Result<Option<AgentConfig>> {
        self.load(name)
    }

    fn credential(&self, name: &str) -> Result<Option<Credential>> {
        self.load(name)
    }

    fn global(&self) -> Result<GlobalConfig> {
        self.load_global()
    }
}

/// The fully dereferenced, defaulted configuration for one project.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// The project, with reference fields rewritten to their resolved
    /// names.
    pub project: Project,
    /// Resolved environment.
    pub environment: Environment,
    /// Resolved security profile.
    pub security: SecurityProfile,
    /// Resolved agent definition.
    pub agent: AgentConfig,
    /// Resolved credential, when the project references one.
    pub credential: Option<Credential>,
}

/// Substitutes an empty reference with the global default, then the
/// hard-coded fallback.
fn pick(reference: &str, global_default: &str, fallback: &str) -> String {
    if !reference.is_empty() {
        reference.to_owned()
    } else if !global_default.is_empty() {
        global_default.to_owned()
    } else {
        fallback.to_owned()
    }
}

/// Resolves a project name into an [`EffectiveConfig`].
///
/// Pure over the lookup's current contents: no side effects, safe to call
/// repeatedly.
///
/// # Errors
///
/// Returns [`PetrelError::NotFound`] for the project itself or the first
/// missing reference (environment, then security, then agent, then
/// credential), or any error from the underlying lookup.
pub fn resolve(lookup: &dyn ResourceLookup, project_name: &str) -> Result<EffectiveConfig> {
    let Some(mut project) = lookup.project(project_name)? else {
        return Err(PetrelError::not_found(ResourceKind::Project, project_name));
    };
    let global = lookup.global()?;

    project.environment = pick(&project.environment, "", constants::DEFAULT_ENVIRONMENT);
    project.security = pick(
        &project.security,
        &global.defaults.security,
        constants::DEFAULT_SECURITY,
    );
    project.agent = pick(
        &project.agent,
        &global.defaults.agent,
        constants::DEFAULT_AGENT,
    );

    tracing::debug!(
        project = project_name,
        environment = %project.environment,
        security = %project.security,
        agent = %project.agent,
        "resolving references"
    );

    let environment = lookup
        .environment(&project.environment)?
        .ok_or_else(|| PetrelError::not_found(ResourceKind::Environment, &project.environment))?;
    let security = lookup
        .security(&project.security)?
        .ok_or_else(|| PetrelError::not_found(ResourceKind::SecurityProfile, &project.security))?;
    let agent = lookup
        .agent(&project.agent)?
        .ok_or_else(|| PetrelError::not_found(ResourceKind::AgentConfig, &project.agent))?;

    let credential = if project.credential.is_empty() {
        None
    } else {
        Some(lookup.credential(&project.credential)?.ok_or_else(|| {
            PetrelError::not_found(ResourceKind::Credential, &project.credential)
        })?)
    };

    Ok(EffectiveConfig {
        project,
        environment,
        security,
        agent,
        credential,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::resources::NamedResource;

    #[derive(Default)]
    struct MemLookup {
        projects: HashMap<String, Project>,
        environments: HashMap<String, Environment>,
        securities: HashMap<String, SecurityProfile>,
        agents: HashMap<String, AgentConfig>,
        credentials: HashMap<String, Credential>,
        global: GlobalConfig,
    }

    impl MemLookup {
        fn with_defaults() -> Self {
            let mut lookup = Self::default();
            lookup.global.defaults.security = "open".to_owned();
            lookup.global.defaults.agent = "claude".to_owned();
            lookup.add_env(Environment::new("local-docker"));
            lookup.add_sec(SecurityProfile::new("open"));
            lookup.add_agent(AgentConfig::new("claude"));
            lookup
        }

        fn add_project(&mut self, p: Project) {
            let _ = self.projects.insert(p.name().to_owned(), p);
        }

        fn add_env(&mut self, e: Environment) {
            let _ = self.environments.insert(e.name().to_owned(), e);
        }

        fn add_sec(&mut self, s: SecurityProfile) {
            let _ = self.securities.insert(s.name().to_owned(), s);
        }

        fn add_agent(&mut self, a: AgentConfig) {
            let _ = self.agents.insert(a.name().to_owned(), a);
        }

        fn add_credential(&mut self, c: Credential) {
            let _ = self.credentials.insert(c.name().to_owned(), c);
        }
    }

    impl ResourceLookup for MemLookup {
        fn project(&self, name: &str) -> Result<Option<Project>> {
            Ok(self.projects.get(name).cloned())
        }

        fn environment(&self, name: &str) -> Result<Option<Environment>> {
            Ok(self.environments.get(name).cloned())
        }

        fn security(&self, name: &str) -> Result<Option<SecurityProfile>> {
            Ok(self.securities.get(name).cloned())
        }

        fn agent(&self, name: &str) -> Result<Option<AgentConfig>> {
            Ok(self.agents.get(name).cloned())
        }

        fn credential(&self, name: &str) -> Result<Option<Credential>> {
            Ok(self.credentials.get(name).cloned())
        }

        fn global(&self) -> Result<GlobalConfig> {
            Ok(self.global.clone())
        }
    }

    fn project_with_empty_refs(name: &str) -> Project {
        let mut p = Project::new(name);
        p.directory = "/src/p1".to_owned();
        p
    }

    #[test]
    fn empty_references_take_global_defaults() {
        let mut lookup = MemLookup::with_defaults();
        let mut p = project_with_empty_refs("p1");
        p.agent = "claude".to_owned();
        lookup.add_project(p);

        let cfg = resolve(&lookup, "p1").expect("resolve");
        assert_eq!(cfg.security.name, "open");
        assert_eq!(cfg.environment.name, "local-docker");
        assert_eq!(cfg.agent.name, "claude");
        assert!(cfg.credential.is_none());
    }

    #[test]
    fn changing_global_default_changes_resolution() {
        let mut lookup = MemLookup::with_defaults();
        lookup.add_sec(SecurityProfile::new("locked"));
        lookup.add_project(project_with_empty_refs("p1"));

        let before = resolve(&lookup, "p1").expect("resolve");
        assert_eq!(before.security.name, "open");

        lookup.global.defaults.security = "locked".to_owned();
        let after = resolve(&lookup, "p1").expect("resolve");
        assert_eq!(after.security.name, "locked");
        // The project itself is untouched.
        assert_eq!(lookup.projects["p1"].security, "");
    }

    #[test]
    fn empty_global_defaults_fall_back_to_builtins() {
        let mut lookup = MemLookup::with_defaults();
        lookup.global = GlobalConfig::default();
        lookup.add_project(project_with_empty_refs("p1"));

        let cfg = resolve(&lookup, "p1").expect("resolve");
        assert_eq!(cfg.security.name, "open");
        assert_eq!(cfg.agent.name, "claude");
    }

    #[test]
    fn explicit_reference_wins_over_default() {
        let mut lookup = MemLookup::with_defaults();
        lookup.add_sec(SecurityProfile::new("locked"));
        let mut p = project_with_empty_refs("p1");
        p.security = "locked".to_owned();
        lookup.add_project(p);

        let cfg = resolve(&lookup, "p1").expect("resolve");
        assert_eq!(cfg.security.name, "locked");
    }

    #[test]
    fn missing_project_is_not_found() {
        let lookup = MemLookup::with_defaults();
        let err = resolve(&lookup, "ghost").unwrap_err();
        assert_eq!(err.to_string(), "project not found: ghost");
    }

    #[test]
    fn missing_reference_names_the_resource() {
        let mut lookup = MemLookup::with_defaults();
        let mut p = project_with_empty_refs("p1");
        p.agent = "ghost-agent".to_owned();
        lookup.add_project(p);

        let err = resolve(&lookup, "p1").unwrap_err();
        assert_eq!(err.to_string(), "agent not found: ghost-agent");
    }

    #[test]
    fn environment_failure_reported_before_agent() {
        let mut lookup = MemLookup::with_defaults();
        let mut p = project_with_empty_refs("p1");
        p.environment = "missing-env".to_owned();
        p.agent = "missing-agent".to_owned();
        lookup.add_project(p);

        let err = resolve(&lookup, "p1").unwrap_err();
        assert_eq!(err.to_string(), "environment not found: missing-env");
    }

    #[test]
    fn security_failure_reported_before_agent() {
        let mut lookup = MemLookup::with_defaults();
        let mut p = project_with_empty_refs("p1");
        p.security = "missing-sec".to_owned();
        p.agent = "missing-agent".to_owned();
        lookup.add_project(p);

        let err = resolve(&lookup, "p1").unwrap_err();
        assert_eq!(err.to_string(), "security profile not found: missing-sec");
    }

    #[test]
    fn credential_reference_is_resolved_when_set() {
        let mut lookup = MemLookup::with_defaults();
        lookup.add_credential(Credential::new("work", "claude"));
        let mut p = project_with_empty_refs("p1");
        p.credential = "work".to_owned();
        lookup.add_project(p);

        let cfg = resolve(&lookup, "p1").expect("resolve");
        assert_eq!(cfg.credential.expect("credential").name, "work");
    }

    #[test]
    fn missing_credential_is_not_found() {
        let mut lookup = MemLookup::with_defaults();
        let mut p = project_with_empty_refs("p1");
        p.credential = "ghost-cred".to_owned();
        lookup.add_project(p);

        let err = resolve(&lookup, "p1").unwrap_err();
        assert_eq!(err.to_string(), "credential not found: ghost-cred");
    }

    #[test]
    fn resolution_is_reentrant() {
        let mut lookup = MemLookup::with_defaults();
        lookup.add_project(project_with_empty_refs("p1"));
        let a = resolve(&lookup, "p1").expect("first");
        let b = resolve(&lookup, "p1").expect("second");
        assert_eq!(a.project, b.project);
        assert_eq!(a.environment, b.environment);
    }
}
