#![forbid(unsafe_code)]

//! Search history: an in-memory ring persisted to `~/.moor_search_history`.
//!
//! Semantics:
//! - On startup, load our own history; if it's missing, try importing from
//!   less (`.lesshst` / `_lesshst`).
//! - Closing a search appends an entry, deduplicates keeping the last
//!   occurrence, and saves to disk.
//! - `$LESSSECURE=1` disables disk writes.
//! - Writes go to a `.tmp` sibling with mode 0600, then an atomic rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

const MAX_ENTRIES: usize = 640; // This should be enough for anyone
const MAX_ENTRY_LENGTH: usize = 640;
const HISTORY_FILE_NAME: &str = ".moor_search_history";

/// The search history ring.
#[derive(Debug, Default)]
pub struct SearchHistory {
    entries: Vec<String>,
    /// Set when loading failed; then we leave the on-disk state alone.
    broken: bool,
}

impl SearchHistory {
    /// Load from the user's home directory.
    #[must_use]
    pub fn load() -> Self {
        match home_dir() {
            Some(home) => Self::load_from(&home),
            None => {
                info!("Could not find a home directory, search history disabled");
                Self {
                    entries: Vec::new(),
                    broken: true,
                }
            }
        }
    }

    /// Load from the given directory. Missing files mean an empty history;
    /// I/O errors mean a history we won't write back.
    #[must_use]
    pub fn load_from(home: &Path) -> Self {
        match load_moor_history(home) {
            Ok(Some(entries)) => {
                info!("Loaded {} search history entries from ~/{HISTORY_FILE_NAME}", entries.len());
                return Self {
                    entries,
                    broken: false,
                };
            }
            Ok(None) => {}
            Err(error) => {
                info!("Could not load moor search history: {error}");
                return Self {
                    entries: Vec::new(),
                    broken: true,
                };
            }
        }

        match load_less_history(home) {
            Ok(Some(entries)) => {
                info!("Imported {} search history entries from less", entries.len());
                Self {
                    entries,
                    broken: false,
                }
            }
            Ok(None) => Self::default(),
            Err(error) => {
                info!("Could not import less search history: {error}");
                Self {
                    entries: Vec::new(),
                    broken: true,
                }
            }
        }
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Record a finished search and save to disk.
    pub fn add_entry(&mut self, entry: &str) {
        if !self.push_entry(entry) {
            return;
        }

        if std::env::var("LESSSECURE").as_deref() == Ok("1") {
            // LESSSECURE=1 means not writing anything to disk
            return;
        }

        let Some(home) = home_dir() else {
            return;
        };
        if let Err(error) = self.save_to(&home) {
            info!("Could not save search history: {error}");
        }
    }

    /// Update the in-memory ring. Returns false when nothing changed.
    fn push_entry(&mut self, entry: &str) -> bool {
        if self.broken {
            // Loading failed, don't touch anything
            return false;
        }
        if entry.is_empty() {
            return false;
        }
        if self.entries.last().map(String::as_str) == Some(entry) {
            // Same as last entry, do nothing
            return false;
        }

        self.entries.retain(|existing| existing != entry);
        self.entries.push(entry.to_string());
        while self.entries.len() > MAX_ENTRIES {
            self.entries.remove(0);
        }
        true
    }

    /// Write the history file under the given directory.
    pub fn save_to(&self, home: &Path) -> std::io::Result<()> {
        let target = home.join(HISTORY_FILE_NAME);
        let temp = home.join(format!("{HISTORY_FILE_NAME}.tmp"));

        {
            let mut file = fs::File::create(&temp)?;
            restrict_to_owner(&file);
            for entry in &self.entries {
                writeln!(file, "{entry}")?;
            }
            file.flush()?;
        }

        if let Err(error) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(error);
        }
        Ok(())
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Prevent others from reading the history file. Best effort.
fn restrict_to_owner(file: &fs::File) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(error) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
            warn!("Could not restrict history file permissions: {error}");
        }
    }
    #[cfg(not(unix))]
    let _ = file;
}

/// Returns Ok(None) when the file doesn't exist.
fn load_moor_history(home: &Path) -> std::io::Result<Option<Vec<String>>> {
    let path = home.join(HISTORY_FILE_NAME);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };

    let mut lines = Vec::new();
    for line in contents.lines() {
        if line.is_empty() || line.len() > MAX_ENTRY_LENGTH {
            continue;
        }
        lines.push(line.to_string());
        if lines.len() > MAX_ENTRIES {
            lines.remove(0);
        }
    }

    debug!("{} lines of search history read from {}", lines.len(), path.display());
    Ok(Some(dedupe_keeping_last(lines)))
}

/// File format ref: <https://unix.stackexchange.com/a/246641/384864>
/// Returns Ok(None) when no less history file exists.
fn load_less_history(home: &Path) -> std::io::Result<Option<Vec<String>>> {
    for file_name in [".lesshst", "_lesshst"] {
        let path = home.join(file_name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => continue,
            Err(error) => return Err(error),
        };

        let mut lines = Vec::new();
        for line in contents.lines() {
            let Some(search_line) = line.strip_prefix('"') else {
                // Not a search history line
                continue;
            };
            if line.is_empty() || line.len() > MAX_ENTRY_LENGTH {
                continue;
            }
            lines.push(without_unprintables(search_line));
            if lines.len() > MAX_ENTRIES {
                lines.remove(0);
            }
        }

        return Ok(Some(dedupe_keeping_last(lines)));
    }

    Ok(None)
}

fn without_unprintables(s: &str) -> String {
    s.chars().filter(|rune| !rune.is_control()).collect()
}

/// If there are duplicates, retain only the last of each.
fn dedupe_keeping_last(history: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut cleaned: Vec<String> = Vec::with_capacity(history.len());
    for entry in history.into_iter().rev() {
        if seen.insert(entry.clone()) {
            cleaned.push(entry);
        }
    }
    cleaned.reverse();
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_dedupe() {
        let mut history = SearchHistory::default();
        history.push_entry("apa");
        history.push_entry("bepa");
        history.push_entry("apa");
        assert_eq!(history.entries(), ["bepa", "apa"]);
    }

    #[test]
    fn repeated_last_entry_is_ignored() {
        let mut history = SearchHistory::default();
        history.push_entry("apa");
        history.push_entry("apa");
        assert_eq!(history.entries(), ["apa"]);
    }

    #[test]
    fn empty_entries_are_ignored() {
        let mut history = SearchHistory::default();
        history.push_entry("");
        assert!(history.entries().is_empty());
    }

    #[test]
    fn broken_history_stays_untouched() {
        let mut history = SearchHistory {
            entries: Vec::new(),
            broken: true,
        };
        history.push_entry("apa");
        assert!(history.entries().is_empty());
    }

    #[test]
    fn capped_at_max() {
        let mut history = SearchHistory::default();
        for i in 0..(MAX_ENTRIES + 7) {
            history.push_entry(&format!("entry {i}"));
        }
        assert_eq!(history.entries().len(), MAX_ENTRIES);
        assert_eq!(history.entries()[0], "entry 7");
    }

    #[test]
    fn save_and_load_round_trip() {
        let home = tempfile::tempdir().unwrap();
        let mut history = SearchHistory::default();
        history.push_entry("första");
        history.push_entry("andra");
        history.save_to(home.path()).unwrap();

        let loaded = SearchHistory::load_from(home.path());
        assert_eq!(loaded.entries(), ["första", "andra"]);
    }

    #[test]
    fn load_from_empty_home_is_empty_and_writable() {
        let home = tempfile::tempdir().unwrap();
        let history = SearchHistory::load_from(home.path());
        assert!(history.entries().is_empty());
        assert!(!history.broken);
    }

    #[test]
    fn import_from_less() {
        let home = tempfile::tempdir().unwrap();
        fs::write(
            home.path().join(".lesshst"),
            ".less-history-file:\n.search\n\"apa\n\"bepa\n\"apa\n",
        )
        .unwrap();

        let history = SearchHistory::load_from(home.path());
        assert_eq!(history.entries(), ["bepa", "apa"]);
    }

    #[test]
    fn less_import_drops_unprintables() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(".lesshst"), "\"a\x01pa\n").unwrap();

        let history = SearchHistory::load_from(home.path());
        assert_eq!(history.entries(), ["apa"]);
    }

    #[test]
    fn own_history_wins_over_less() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(HISTORY_FILE_NAME), "mine\n").unwrap();
        fs::write(home.path().join(".lesshst"), "\"theirs\n").unwrap();

        let history = SearchHistory::load_from(home.path());
        assert_eq!(history.entries(), ["mine"]);
    }

    #[test]
    fn load_dedupes_keeping_last() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(HISTORY_FILE_NAME), "a\nb\na\n").unwrap();

        let history = SearchHistory::load_from(home.path());
        assert_eq!(history.entries(), ["b", "a"]);
    }
}
