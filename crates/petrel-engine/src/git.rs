//! Git URL classification and cloning.

use std::path::Path;
use std::process::Command;

use petrel_common::error::{PetrelError, Result};

/// Whether a string looks like a cloneable git URL.
///
/// Accepts `https://`, `http://`, `git://`, `ssh://`, and scp-style
/// `user@host:path` forms. Local paths and bare words are rejected; they
/// belong in `directory`, not `repo`.
#[must_use]
pub fn is_git_url(candidate: &str) -> bool {
    const SCHEMES: &[&str] = &["https://", "http://", "git://", "ssh://"];
    if SCHEMES.iter().any(|scheme| candidate.starts_with(scheme)) {
        return true;
    }
    if candidate.contains("://") {
        return false;
    }
    // scp-style: user@host:path
    match candidate.split_once(':') {
        Some((user_host, path)) => {
            user_host.contains('@')
                && !user_host.is_empty()
                && !path.is_empty()
                && !path.starts_with('/')
        }
        None => false,
    }
}

/// Clones a repository into `dest`, optionally pinning an SSH identity.
///
/// # Errors
///
/// Returns an error if git cannot be found, the invocation fails, or the
/// clone exits nonzero.
pub fn clone_repo(url: &str, dest: &Path, ssh_key: Option<&str>) -> Result<()> {
    if which::which("git").is_err() {
        return Err(PetrelError::Engine {
            message: "git binary not found on PATH".into(),
        });
    }

    let mut cmd = Command::new("git");
    if let Some(key) = ssh_key {
        let _ = cmd.arg("-c").arg(format!(
            "core.sshCommand=ssh -i {key} -o StrictHostKeyChecking=no"
        ));
    }
    let _ = cmd.arg("clone").arg(url).arg(dest);

    tracing::info!(url, dest = %dest.display(), "cloning repository");
    let status = cmd
        .status()
        .map_err(|e| PetrelError::io("git", e))?;
    if status.success() {
        Ok(())
    } else {
        Err(PetrelError::Engine {
            message: format!("git clone {url} exited with {status}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_schemes() {
        assert!(is_git_url("https://github.com/user/repo.git"));
        assert!(is_git_url("http://github.com/user/repo.git"));
        assert!(is_git_url("git://github.com/user/repo.git"));
        assert!(is_git_url("ssh://git@github.com/user/repo.git"));
    }

    #[test]
    fn accepts_scp_style() {
        assert!(is_git_url("git@github.com:user/repo.git"));
    }

    #[test]
    fn rejects_bare_words_and_paths() {
        assert!(!is_git_url("foo"));
        assert!(!is_git_url("/tmp/some/repo"));
        assert!(!is_git_url("some/repo"));
    }

    #[test]
    fn rejects_unknown_schemes() {
        assert!(!is_git_url("ftp://server/repo.git"));
    }

    #[test]
    fn rejects_colon_without_user() {
        assert!(!is_git_url("github.com:user/repo.git"));
    }
}
