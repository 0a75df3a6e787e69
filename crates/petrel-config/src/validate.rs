//! Semantic validation of a resolved configuration.
//!
//! Unlike resolution, validation accumulates: every rule runs and every
//! finding is reported, so the operator sees all problems in one pass.
//! Errors are fatal for commands that need a runnable sandbox; warnings
//! are always surfaced but never block.

use std::path::Path;

use petrel_common::constants;
use petrel_common::types::{NetworkMode, PersistenceMode};

use crate::resolve::EffectiveConfig;

/// Findings from one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Fatal inconsistencies.
    pub errors: Vec<String>,
    /// Informational findings; never fatal.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Whether the configuration has no fatal findings.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates a resolved configuration.
///
/// All rules are evaluated; none short-circuits another.
#[must_use]
pub fn validate(cfg: &EffectiveConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_source(cfg, &mut report);
    check_ssh_key(cfg, &mut report);
    check_sudo_install(cfg, &mut report);
    check_credential_persistence(cfg, &mut report);
    check_internal_network(cfg, &mut report);
    report
}

/// A project must have a source: a directory, or a repo to clone.
fn check_source(cfg: &EffectiveConfig, report: &mut ValidationReport) {
    let p = &cfg.project;
    if p.directory.is_empty() && p.repo.is_empty() {
        report.errors.push(format!(
            "project {} has neither a directory nor a repo",
            p.name
        ));
    } else if p.directory.is_empty() {
        report.warnings.push(format!(
            "project {} has no directory yet; {} will be cloned on first run",
            p.name, p.repo
        ));
    }
}

/// The configured private key must exist on the invoking host. Skipped for
/// remote projects, where the path is evaluated on the remote side.
fn check_ssh_key(cfg: &EffectiveConfig, report: &mut ValidationReport) {
    let key = &cfg.project.ssh.private_key;
    if key.is_empty() || cfg.project.is_remote() {
        return;
    }
    if !Path::new(key).exists() {
        report
            .errors
            .push(format!("ssh private key does not exist: {key}"));
    }
}

/// Install steps that rely on sudo will fail once the privilege-removal
/// step has run. Heuristic string match.
fn check_sudo_install(cfg: &EffectiveConfig, report: &mut ValidationReport) {
    if cfg.security.agent.sudo {
        return;
    }
    for cmd in &cfg.agent.install.commands {
        if cmd.contains("sudo") {
            report.warnings.push(format!(
                "security profile {} disables sudo but agent {} install step uses it: {cmd}",
                cfg.security.name, cfg.agent.name
            ));
        }
    }
}

/// Volume-backed persistence cannot be pre-seeded from an imported
/// credential; seeding only works for bind-mounted directories.
fn check_credential_persistence(cfg: &EffectiveConfig, report: &mut ValidationReport) {
    if cfg.environment.persistence.mode == PersistenceMode::Volume {
        if let Some(cred) = &cfg.credential {
            report.warnings.push(format!(
                "credential {} cannot pre-seed a volume-backed sandbox; log in once inside it",
                cred.name
            ));
        }
    }
}

/// Internal isolation is only honored by the plain docker driver; other
/// drivers silently fall back to their default network at run time.
fn check_internal_network(cfg: &EffectiveConfig, report: &mut ValidationReport) {
    if cfg.environment.network.mode == NetworkMode::Internal
        && cfg.environment.driver != constants::DOCKER_DRIVER
    {
        report.warnings.push(format!(
            "environment {} requests internal networking but driver {} falls back to its default network",
            cfg.environment.name, cfg.environment.driver
        ));
    }
}
