use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::storage;

/// What `delete()` actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeleteOutcome {
    pub file_removed: bool,
    pub entry_removed: bool,
}

/// Ordered list of known recordings
///
/// Entries are kept in insertion order and are not deduplicated. An entry
/// normally points at an existing file, but files deleted behind the
/// store's back stay listed until `prune_missing()`.
#[derive(Debug, Clone)]
pub struct CallLogStore {
    /// Folder imported recordings are copied into
    managed_dir: PathBuf,
    entries: Vec<PathBuf>,
}

impl CallLogStore {
    pub fn new(managed_dir: impl Into<PathBuf>) -> Self {
        Self {
            managed_dir: managed_dir.into(),
            entries: Vec::new(),
        }
    }

    /// Seed the store with the WAV files already in the managed folder
    pub fn load_existing(&mut self) -> Result<usize> {
        let found = storage::list_recordings(&self.managed_dir)?;
        let count = found.len();
        self.entries.extend(found);
        info!(
            "Loaded {} existing recording(s) from {}",
            count,
            self.managed_dir.display()
        );
        Ok(count)
    }

    pub fn managed_dir(&self) -> &Path {
        &self.managed_dir
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e == path)
    }

    pub fn add(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!("Call log += {}", path.display());
        self.entries.push(path);
    }

    /// Remove the first entry equal to `path`
    pub fn remove(&mut self, path: &Path) -> bool {
        match self.entries.iter().position(|e| e == path) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Case-insensitive substring search, store order preserved
    pub fn search(&self, query: &str) -> Vec<PathBuf> {
        self.search_with(query, true)
    }

    pub fn search_with(&self, query: &str, case_insensitive: bool) -> Vec<PathBuf> {
        if query.is_empty() {
            return self.entries.clone();
        }

        let needle = if case_insensitive {
            query.to_lowercase()
        } else {
            query.to_string()
        };

        self.entries
            .iter()
            .filter(|entry| {
                let haystack = entry.to_string_lossy();
                if case_insensitive {
                    haystack.to_lowercase().contains(&needle)
                } else {
                    haystack.contains(&needle)
                }
            })
            .cloned()
            .collect()
    }

    /// Delete a recording from disk and from the log
    ///
    /// A file that no longer exists only loses its log entry.
    pub fn delete(&mut self, path: &Path) -> Result<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();

        if path.is_file() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to delete {}", path.display()))?;
            outcome.file_removed = true;
        }

        outcome.entry_removed = self.remove(path);

        info!(
            "Deleted {} (file: {}, entry: {})",
            path.display(),
            outcome.file_removed,
            outcome.entry_removed
        );

        Ok(outcome)
    }

    /// Drop entries whose file has disappeared
    pub fn prune_missing(&mut self) -> Vec<PathBuf> {
        let (kept, missing): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|p| p.exists());
        self.entries = kept;
        for path in &missing {
            warn!("Dropping missing recording from log: {}", path.display());
        }
        missing
    }

    /// Write every entry to `path`, one per line, in store order
    pub fn export_as_text(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        for entry in &self.entries {
            writeln!(out, "{}", entry.display())?;
        }
        out.flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Export the log as `CallLogs_<timestamp>.txt` into `dir`
    pub fn export_logs(&self, dir: &Path) -> Result<PathBuf> {
        storage::ensure_dir(dir)?;
        let path = dir.join(storage::log_export_file_name(&Local::now()));
        self.export_as_text(&path)?;
        info!("Logs exported to {}", path.display());
        Ok(path)
    }

    /// Copy files into the managed folder and log the copies
    ///
    /// Existing files of the same name are overwritten. The first failed copy
    /// aborts the batch; files imported before it stay copied and logged.
    /// A source that already is the destination file counts as a failure,
    /// since copying a file onto itself truncates it.
    pub fn import_files<P: AsRef<Path>>(&mut self, sources: &[P]) -> Result<Vec<PathBuf>> {
        storage::ensure_dir(&self.managed_dir)?;

        let mut imported = Vec::with_capacity(sources.len());
        for source in sources {
            let source = source.as_ref();
            let file_name = source
                .file_name()
                .with_context(|| format!("Not a file path: {}", source.display()))?;
            let dest = self.managed_dir.join(file_name);
            if is_same_file(source, &dest) {
                bail!("{} is already in {}", source.display(), self.managed_dir.display());
            }

            fs::copy(source, &dest).with_context(|| {
                format!("Failed to import {} to {}", source.display(), dest.display())
            })?;

            self.add(dest.clone());
            imported.push(dest);
        }

        info!("Imported {} recording(s)", imported.len());
        Ok(imported)
    }

    /// Copy every logged recording into `dest_dir`
    ///
    /// Same abort-on-first-failure behaviour as `import_files`.
    pub fn export_files(&self, dest_dir: &Path) -> Result<Vec<PathBuf>> {
        storage::ensure_dir(dest_dir)?;

        let mut exported = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let file_name = entry
                .file_name()
                .with_context(|| format!("Not a file path: {}", entry.display()))?;
            let dest = dest_dir.join(file_name);
            if is_same_file(entry, &dest) {
                bail!("{} is already in {}", entry.display(), dest_dir.display());
            }

            fs::copy(entry, &dest).with_context(|| {
                format!("Failed to export {} to {}", entry.display(), dest.display())
            })?;
            exported.push(dest);
        }

        info!(
            "Exported {} recording(s) to {}",
            exported.len(),
            dest_dir.display()
        );
        Ok(exported)
    }
}

/// Whether both paths resolve to the same file on disk
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
