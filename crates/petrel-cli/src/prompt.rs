//! Interactive terminal prompts and host-side discovery helpers.
//!
//! Every prompt has a flag-driven bypass in the commands that use it, so
//! `--yes` runs never block on stdin.

#![allow(clippy::print_stdout)]

use std::io::Write as _;
use std::path::PathBuf;

use petrel_common::constants;

/// Asks a yes/no question, defaulting to yes.
#[must_use]
pub fn confirm(question: &str) -> bool {
    print!("{question} [Y/n]: ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    !answer.trim().eq_ignore_ascii_case("n")
}

/// Presents a numbered list and returns the chosen index. Empty or
/// unparseable input selects the default.
#[must_use]
pub fn select(prompt: &str, options: &[String], default_index: usize) -> usize {
    println!("{prompt}");
    for (i, option) in options.iter().enumerate() {
        let marker = if i == default_index { "*" } else { " " };
        println!("  {marker} {}) {option}", i + 1);
    }
    print!("Choice [{}]: ", default_index + 1);
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return default_index;
    }
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => n - 1,
        _ => default_index,
    }
}

/// Reads one line of input with a prompt; empty input yields the
/// fallback.
#[must_use]
pub fn input_or(prompt: &str, fallback: &str) -> String {
    print!("{prompt} [{fallback}]: ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return fallback.to_owned();
    }
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Discovers private SSH keys under `~/.ssh`, sorted by name.
#[must_use]
pub fn find_ssh_keys() -> Vec<PathBuf> {
    let Some(ssh_dir) = constants::home_dir().map(|h| h.join(".ssh")) else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(&ssh_dir) else {
        return Vec::new();
    };
    let mut keys: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with("id_") && !name.ends_with(".pub"))
        })
        .collect();
    keys.sort();
    keys
}
