//! File Store
//!
//! Persistence layer: keeps the on-disk text representation of each
//! file entry synchronized with the engine, and replays the storage
//! directory at startup.
//!
//! Wire format: one plain-text file per named entry, content is a
//! single line of decimal ids separated by `,` (no header, no quoting,
//! no trailing newline required). Appends write a leading `,` so the
//! line stays parseable across restarts.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{FilerError, Result};

/// One file parsed from the storage directory during startup
#[derive(Debug)]
pub struct LoadedFile {
    pub name: String,
    pub ids: Vec<u32>,
}

/// Persistence layer bound to a single storage directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Bind to an existing storage directory.
    ///
    /// A missing directory is a fatal startup condition; the store
    /// never creates it.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(FilerError::Config(format!(
                "storage directory does not exist: {}",
                dir.display()
            )));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Read and parse every file in the storage directory.
    ///
    /// A file with empty content is a leftover artifact of a
    /// previously-emptied entry: it is deleted from disk and skipped.
    /// A parse failure is fatal for the whole load; the caller must
    /// not proceed with partially loaded state.
    pub fn scan(&self) -> Result<Vec<LoadedFile>> {
        let mut loaded = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let content = fs::read_to_string(entry.path())?;
            let line = content.lines().next().unwrap_or("");

            if line.is_empty() {
                tracing::info!(file = %name, "removing empty leftover file");
                fs::remove_file(entry.path())?;
                continue;
            }

            let mut ids = Vec::new();
            for token in line.split(',') {
                let id: u32 = token.parse().map_err(|_| FilerError::Parse {
                    file: name.clone(),
                    token: token.to_string(),
                })?;
                ids.push(id);
            }

            loaded.push(LoadedFile { name, ids });
        }

        Ok(loaded)
    }

    /// Create (truncate-or-create) a file with the given ids
    pub fn create(&self, name: &str, ids: &[u32]) -> Result<()> {
        fs::write(self.path(name), join_ids(ids))?;
        Ok(())
    }

    /// Append ids to an existing file, preceded by a `,` separator
    pub fn append(&self, name: &str, ids: &[u32]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))?;

        file.write_all(format!(",{}", join_ids(ids)).as_bytes())?;
        Ok(())
    }

    /// Truncate a file and write the full surviving id set.
    ///
    /// A missing file maps to `FileNotExist`; the caller decides
    /// whether that is recoverable.
    pub fn rewrite(&self, name: &str, ids: &[u32]) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.path(name))
            .map_err(|e| Self::map_not_found(e, name))?;

        file.write_all(join_ids(ids).as_bytes())?;
        Ok(())
    }

    /// Remove a file from disk, mapping a missing file to `FileNotExist`
    pub fn remove(&self, name: &str) -> Result<()> {
        fs::remove_file(self.path(name)).map_err(|e| Self::map_not_found(e, name))
    }

    /// Full path of a named entry within the storage directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// The storage directory this store is bound to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn map_not_found(err: std::io::Error, name: &str) -> FilerError {
        if err.kind() == std::io::ErrorKind::NotFound {
            FilerError::FileNotExist(name.to_string())
        } else {
            FilerError::Io(err)
        }
    }
}

/// Join ids as decimal tokens separated by `,`
fn join_ids(ids: &[u32]) -> String {
    let tokens: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    tokens.join(",")
}
