//! Host-side discovery and staging of agent authentication files.
//!
//! An agent declares where it keeps its authentication state
//! ([`AuthSpec`](crate::resources::AuthSpec)): a directory under the home
//! directory plus a list of file names. Some agents keep one of those
//! files at the home root instead, so discovery prefers the auth
//! directory and falls back to the home root per file.

use std::path::{Path, PathBuf};

use petrel_common::constants;
use petrel_common::error::{PetrelError, Result};

use crate::resources::{AgentConfig, Credential};
use crate::store::ConfigStore;

/// Default host directory an agent's auth files are imported from.
#[must_use]
pub fn default_source_dir(agent: &AgentConfig) -> Option<PathBuf> {
    constants::home_dir().map(|home| home.join(agent.state_dir()))
}

/// Resolves `(source path, destination file name)` pairs for an agent's
/// auth files, against the invoking user's home directory.
///
/// Paths are returned whether or not they exist; pair this with
/// [`any_auth_files_present`] to decide if an import is possible.
#[must_use]
pub fn credential_sources(agent: &AgentConfig, source_dir: Option<&Path>) -> Vec<(PathBuf, String)> {
    let home = constants::home_dir().unwrap_or_else(|| PathBuf::from("/"));
    credential_sources_in(&home, agent, source_dir)
}

/// [`credential_sources`] with an explicit home directory.
#[must_use]
pub fn credential_sources_in(
    home: &Path,
    agent: &AgentConfig,
    source_dir: Option<&Path>,
) -> Vec<(PathBuf, String)> {
    let base = source_dir.map_or_else(|| home.join(agent.state_dir()), Path::to_path_buf);
    agent
        .auth
        .files
        .iter()
        .map(|file| {
            let primary = base.join(file);
            let source = if primary.is_file() {
                primary
            } else {
                let fallback = home.join(file);
                if fallback.is_file() { fallback } else { primary }
            };
            (source, file.clone())
        })
        .collect()
}

/// Whether any of the agent's auth files can be found on the host.
#[must_use]
pub fn any_auth_files_present(agent: &AgentConfig, source_dir: Option<&Path>) -> bool {
    credential_sources(agent, source_dir)
        .iter()
        .any(|(source, _)| source.is_file())
}

/// Imports the agent's auth files into a named credential stash and saves
/// the [`Credential`] record.
///
/// # Errors
///
/// Returns an error if no auth files are present on the host, or if
/// copying or saving fails.
pub fn import(
    store: &ConfigStore,
    name: &str,
    agent: &AgentConfig,
    source_dir: Option<&Path>,
) -> Result<Credential> {
    let sources = credential_sources(agent, source_dir);
    let present: Vec<_> = sources
        .iter()
        .filter(|(source, _)| source.is_file())
        .collect();
    if present.is_empty() {
        return Err(PetrelError::InvalidResource {
            message: format!("no {} auth files found to import", agent.name),
        });
    }

    let dest_dir = store.credential_dir(name);
    std::fs::create_dir_all(&dest_dir).map_err(|e| PetrelError::io(&dest_dir, e))?;
    for (source, file) in &present {
        let dest = dest_dir.join(file);
        let _ = std::fs::copy(source, &dest).map_err(|e| PetrelError::io(&dest, e))?;
        tracing::debug!(source = %source.display(), file, "imported credential file");
    }

    let mut credential = Credential::new(name, &agent.name);
    credential.source_dir = source_dir
        .map(Path::to_path_buf)
        .or_else(|| default_source_dir(agent))
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    store.save(&credential)?;
    Ok(credential)
}

/// Seeds a bind-mode state directory before the sandbox starts.
///
/// First pass copies missing auth files from the credential stash. Second
/// pass copies home-root session files for agents that keep one there,
/// but only once some auth file is already present in the state dir (a
/// session file without its credential is useless).
///
/// Returns the names of the files that were seeded.
///
/// # Errors
///
/// Returns an error if the state directory cannot be created or a copy
/// fails.
pub fn seed_state_dir(
    agent: &AgentConfig,
    data_dir: &Path,
    credential_dir: Option<&Path>,
) -> Result<Vec<String>> {
    let home = constants::home_dir().unwrap_or_else(|| PathBuf::from("/"));
    seed_state_dir_in(&home, agent, data_dir, credential_dir)
}

/// [`seed_state_dir`] with an explicit home directory.
///
/// # Errors
///
/// Returns an error if the state directory cannot be created or a copy
/// fails.
pub fn seed_state_dir_in(
    home: &Path,
    agent: &AgentConfig,
    data_dir: &Path,
    credential_dir: Option<&Path>,
) -> Result<Vec<String>> {
    std::fs::create_dir_all(data_dir).map_err(|e| PetrelError::io(data_dir, e))?;
    let mut seeded = Vec::new();

    if let Some(stash) = credential_dir {
        for file in &agent.auth.files {
            let source = stash.join(file);
            let dest = data_dir.join(file);
            if source.is_file() && !dest.exists() {
                let _ = std::fs::copy(&source, &dest).map_err(|e| PetrelError::io(&dest, e))?;
                seeded.push(file.clone());
            }
        }
    }

    let any_present = agent
        .auth
        .files
        .iter()
        .any(|file| data_dir.join(file).exists());
    if any_present {
        for file in &agent.auth.files {
            let dest = data_dir.join(file);
            let fallback = home.join(file);
            if !dest.exists() && fallback.is_file() {
                let _ = std::fs::copy(&fallback, &dest).map_err(|e| PetrelError::io(&dest, e))?;
                seeded.push(file.clone());
            }
        }
    }

    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claude_agent() -> AgentConfig {
        let mut agent = AgentConfig::new("claude");
        agent.auth.dir = ".claude".to_owned();
        agent.auth.files = vec![".credentials.json".to_owned(), ".claude.json".to_owned()];
        agent.auth.login_command = "claude /login".to_owned();
        agent
    }

    #[test]
    fn sources_fall_back_to_home_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let home = dir.path();
        std::fs::create_dir_all(home.join(".claude")).expect("mkdir");
        std::fs::write(home.join(".claude/.credentials.json"), "{}").expect("write");
        std::fs::write(home.join(".claude.json"), "{}").expect("write");

        let sources = credential_sources_in(home, &claude_agent(), None);
        let by_dest: std::collections::HashMap<_, _> =
            sources.into_iter().map(|(src, dest)| (dest, src)).collect();

        assert_eq!(
            by_dest[".credentials.json"],
            home.join(".claude/.credentials.json")
        );
        assert_eq!(by_dest[".claude.json"], home.join(".claude.json"));
    }

    #[test]
    fn sources_prefer_auth_dir_over_home_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let home = dir.path();
        std::fs::create_dir_all(home.join(".claude")).expect("mkdir");
        std::fs::write(home.join(".claude/.claude.json"), "auth-dir").expect("write");
        std::fs::write(home.join(".claude.json"), "home-root").expect("write");

        let sources = credential_sources_in(home, &claude_agent(), None);
        let claude_json = sources
            .iter()
            .find(|(_, dest)| dest == ".claude.json")
            .expect("entry");
        assert_eq!(claude_json.0, home.join(".claude/.claude.json"));
    }

    #[test]
    fn missing_sources_keep_primary_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sources = credential_sources_in(dir.path(), &claude_agent(), None);
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|(src, _)| !src.exists()));
        assert!(sources[0].0.starts_with(dir.path().join(".claude")));
    }

    #[test]
    fn explicit_source_dir_overrides_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let custom = dir.path().join("exported");
        std::fs::create_dir_all(&custom).expect("mkdir");
        std::fs::write(custom.join(".credentials.json"), "{}").expect("write");

        let sources = credential_sources_in(dir.path(), &claude_agent(), Some(&custom));
        assert_eq!(sources[0].0, custom.join(".credentials.json"));
    }

    #[test]
    fn seed_copies_stash_files_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let home = dir.path().join("home");
        let stash = dir.path().join("stash");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&home).expect("mkdir");
        std::fs::create_dir_all(&stash).expect("mkdir");
        std::fs::write(stash.join(".credentials.json"), "stash").expect("write");

        let agent = claude_agent();
        let seeded =
            seed_state_dir_in(&home, &agent, &data, Some(&stash)).expect("seed");
        assert_eq!(seeded, vec![".credentials.json".to_owned()]);

        // Second seed is a no-op: the file is already present.
        let again = seed_state_dir_in(&home, &agent, &data, Some(&stash)).expect("seed");
        assert!(again.is_empty());
    }

    #[test]
    fn seed_pulls_home_session_file_only_alongside_credentials() {
        let dir = tempfile::tempdir().expect("tempdir");
        let home = dir.path().join("home");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&home).expect("mkdir");
        std::fs::write(home.join(".claude.json"), "session").expect("write");

        let agent = claude_agent();
        // No credential file anywhere: the session file must not be seeded.
        let seeded = seed_state_dir_in(&home, &agent, &data, None).expect("seed");
        assert!(seeded.is_empty());

        // Once a credential file exists in the state dir, it is.
        std::fs::write(data.join(".credentials.json"), "{}").expect("write");
        let seeded = seed_state_dir_in(&home, &agent, &data, None).expect("seed");
        assert_eq!(seeded, vec![".claude.json".to_owned()]);
    }
}
