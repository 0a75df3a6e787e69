//! YAML file persistence for resources under the config root.
//!
//! Layout:
//!
//! ```text
//! ~/.petrel/
//!   global.yaml                     # GlobalConfig singleton
//!   resources/<kind-dir>/<name>.yaml
//!   credentials/<name>/             # imported credential payloads
//!   repos/<project>/                # deterministic clone paths
//!   data/<project>/                 # bind-mode agent state
//! ```
//!
//! Every command invocation re-reads from disk; the store keeps no cache.

use std::path::{Path, PathBuf};

use chrono::Utc;
use petrel_common::constants;
use petrel_common::error::{PetrelError, Result};
use petrel_common::types::ResourceKind;
use serde::{Deserialize, Serialize};

use crate::resources::{GlobalConfig, NamedResource};

/// On-disk document wrapper: the kind/name header plus the typed payload.
#[derive(Debug, Serialize, Deserialize)]
struct Document<T> {
    kind: ResourceKind,
    name: String,
    created_at: String,
    spec: T,
}

/// File-backed resource store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    /// Opens the store at the default config root.
    #[must_use]
    pub fn open_default() -> Self {
        Self::at(constants::config_root())
    }

    /// Opens the store at an explicit root (used by tests).
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The config root this store reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `petrel init` has been run for this root.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.global_path().is_file()
    }

    /// Creates the directory skeleton.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<()> {
        for kind in ResourceKind::ALL {
            create_dir(&self.resources_dir().join(kind.dir_name()))?;
        }
        create_dir(&self.credentials_dir())?;
        create_dir(&self.repos_dir())?;
        create_dir(&self.data_dir())?;
        Ok(())
    }

    // ── Resource documents ───────────────────────────────────────────

    /// Saves a resource, overwriting any existing document of the same
    /// `(kind, name)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the file cannot be
    /// written.
    pub fn save<T: NamedResource>(&self, resource: &T) -> Result<()> {
        validate_name(T::KIND, resource.name())?;
        let path = self.resource_path(T::KIND, resource.name());
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        let doc = Document {
            kind: T::KIND,
            name: resource.name().to_owned(),
            created_at: Utc::now().to_rfc3339(),
            spec: resource.clone(),
        };
        let yaml = serde_yaml::to_string(&doc).map_err(|e| PetrelError::Yaml {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(kind = %T::KIND, name = resource.name(), "saving resource");
        std::fs::write(&path, yaml).map_err(|e| PetrelError::io(&path, e))
    }

    /// Loads a resource by name; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or
    /// parsed, or carries the wrong kind tag.
    pub fn load<T: NamedResource>(&self, name: &str) -> Result<Option<T>> {
        let path = self.resource_path(T::KIND, name);
        if !path.is_file() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| PetrelError::io(&path, e))?;
        let doc: Document<T> = serde_yaml::from_str(&content).map_err(|e| PetrelError::Yaml {
            path: path.clone(),
            source: e,
        })?;
        if doc.kind != T::KIND {
            return Err(PetrelError::InvalidResource {
                message: format!(
                    "{} declares kind {} but is stored as a {}",
                    path.display(),
                    doc.kind,
                    T::KIND
                ),
            });
        }
        let mut spec = doc.spec;
        spec.set_name(&doc.name);
        Ok(Some(spec))
    }

    /// Lists resource names of a kind, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind directory exists but cannot be read.
    pub fn list(&self, kind: ResourceKind) -> Result<Vec<String>> {
        let dir = self.resources_dir().join(kind.dir_name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| PetrelError::io(&dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PetrelError::io(&dir, e))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Deletes a resource document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such resource exists, or an I/O error if
    /// the file cannot be removed.
    pub fn delete(&self, kind: ResourceKind, name: &str) -> Result<()> {
        let path = self.resource_path(kind, name);
        if !path.is_file() {
            return Err(PetrelError::not_found(kind, name));
        }
        tracing::debug!(%kind, name, "deleting resource");
        std::fs::remove_file(&path).map_err(|e| PetrelError::io(&path, e))
    }

    // ── Global config ────────────────────────────────────────────────

    /// Loads the global config, falling back to defaults when the file is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_global(&self) -> Result<GlobalConfig> {
        let path = self.global_path();
        if !path.is_file() {
            return Ok(GlobalConfig::default());
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| PetrelError::io(&path, e))?;
        serde_yaml::from_str(&content).map_err(|e| PetrelError::Yaml { path, source: e })
    }

    /// Persists the global config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_global(&self, global: &GlobalConfig) -> Result<()> {
        create_dir(&self.root)?;
        let path = self.global_path();
        let yaml = serde_yaml::to_string(global).map_err(|e| PetrelError::Yaml {
            path: path.clone(),
            source: e,
        })?;
        std::fs::write(&path, yaml).map_err(|e| PetrelError::io(&path, e))
    }

    // ── Path helpers ─────────────────────────────────────────────────

    /// Path of the global config file.
    #[must_use]
    pub fn global_path(&self) -> PathBuf {
        self.root.join("global.yaml")
    }

    /// Root of the per-kind resource directories.
    #[must_use]
    pub fn resources_dir(&self) -> PathBuf {
        self.root.join("resources")
    }

    /// Directory holding imported credential payloads.
    #[must_use]
    pub fn credentials_dir(&self) -> PathBuf {
        self.root.join("credentials")
    }

    /// Payload directory for one named credential.
    #[must_use]
    pub fn credential_dir(&self, name: &str) -> PathBuf {
        self.credentials_dir().join(name)
    }

    /// Root of the deterministic clone paths.
    #[must_use]
    pub fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    /// Deterministic clone path for a repo-backed project.
    #[must_use]
    pub fn repo_dir(&self, project: &str) -> PathBuf {
        self.repos_dir().join(project)
    }

    /// Root of the bind-mode agent state directories.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Bind-mode agent state directory for one project.
    #[must_use]
    pub fn agent_data_dir(&self, project: &str) -> PathBuf {
        self.data_dir().join(project)
    }

    fn resource_path(&self, kind: ResourceKind, name: &str) -> PathBuf {
        self.resources_dir()
            .join(kind.dir_name())
            .join(format!("{name}.yaml"))
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| PetrelError::io(path, e))
}

/// Rejects names that are empty or would escape the kind directory.
fn validate_name(kind: ResourceKind, name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(PetrelError::InvalidResource {
            message: format!("invalid {kind} name: {name:?}"),
        })
    }
}
