//! Formatted output helpers for CLI commands.

use std::path::Path;

use petrel_common::constants;

/// Bold ANSI sequence.
pub const BOLD: &str = "\x1b[1m";
/// Dim ANSI sequence.
pub const DIM: &str = "\x1b[2m";
/// Green ANSI sequence.
pub const GREEN: &str = "\x1b[32m";
/// Yellow ANSI sequence.
pub const YELLOW: &str = "\x1b[33m";
/// Red ANSI sequence.
pub const RED: &str = "\x1b[31m";
/// Reset ANSI sequence.
pub const RESET: &str = "\x1b[0m";

/// Shortens a path under the home directory to `~/...` for display.
#[must_use]
pub fn shorten_home(path: &str) -> String {
    if let Some(home) = constants::home_dir() {
        if let Ok(rest) = Path::new(path).strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.to_owned()
}
