#![forbid(unsafe_code)]

//! Launching `$EDITOR` on the current file ('v').
//!
//! The editor command gets validated here but launched by the caller after
//! the terminal is restored, so the editor finds a sane terminal.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::modes::{InfoState, PagerMode};
use crate::pager::Pager;

/// Error unless the path points to something executable.
pub fn err_unless_executable(path: &Path) -> Result<(), String> {
    let metadata = std::fs::metadata(path)
        .map_err(|error| format!("Not found: {}: {error}", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("Not a file: {}", path.display()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(format!("Not executable: {}", path.display()));
        }
    }

    Ok(())
}

/// Find a command on `$PATH`, or take it verbatim if it contains a slash.
fn resolve_command(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return err_unless_executable(&path).ok().map(|()| path);
    }

    let path_var = std::env::var_os("PATH")?;
    for directory in std::env::split_paths(&path_var) {
        let candidate = directory.join(name);
        if err_unless_executable(&candidate).is_ok() {
            return Some(candidate);
        }
    }
    None
}

/// Handle the 'v' keypress: validate `$EDITOR`, then quit with a command for
/// the launcher to run once the screen is back to normal.
pub fn handle_editing_request(pager: &mut Pager) {
    let editor_env = std::env::var("EDITOR").unwrap_or_default();
    if editor_env.trim().is_empty() {
        pager.mode = PagerMode::Info(InfoState::new(
            "Set the EDITOR environment variable to edit files",
        ));
        return;
    }

    // The variable may carry arguments, "code --wait" style
    let mut words = editor_env.split_whitespace();
    let Some(command_name) = words.next() else {
        return;
    };
    let editor_args: Vec<&str> = words.collect();

    let Some(editor) = resolve_command(command_name) else {
        warn!("EDITOR resolution failed: {editor_env:?}");
        pager.mode = PagerMode::Info(InfoState::new(format!(
            "Not executable: {command_name}"
        )));
        return;
    };

    let Some(file_name) = pager.active_reader().display_name().map(String::from) else {
        pager.mode = PagerMode::Info(InfoState::new("Can only edit files, this is a stream"));
        return;
    };
    if !Path::new(&file_name).is_file() {
        pager.mode = PagerMode::Info(InfoState::new("Can only edit files, this is a stream"));
        return;
    }

    let mut command = Command::new(editor);
    command.args(editor_args);
    if let Some(top) = pager.line_index() {
        // Both vi and emacs interpret +N as "go to line N"
        command.arg(format!("+{}", top.number().as_one_based()));
    }
    command.arg(&file_name);

    info!("Quitting to edit {file_name}");
    pager.after_exit = Some(command);
    pager.quit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executables_pass() {
        // Something that exists on any reasonable test machine
        let shell = Path::new("/bin/sh");
        if shell.exists() {
            assert!(err_unless_executable(shell).is_ok());
        }
    }

    #[test]
    fn plain_files_fail() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(err_unless_executable(file.path()).is_err());
    }

    #[test]
    fn missing_files_fail() {
        assert!(err_unless_executable(Path::new("/does/not/exist")).is_err());
    }
}
