//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Own the file-name → id-set mapping and the bucket index
//! - Enforce global id uniqueness (unless the caller overrides it)
//! - Keep the on-disk text files consistent with in-memory state
//! - Rebuild all state from the storage directory on startup
//!
//! ## Concurrency Model: coarse-grained mutual exclusion
//!
//! All operations (reads included) take one engine-wide
//! `parking_lot::Mutex` for the duration of the index and set
//! mutation plus the matching disk write. This bounds throughput but
//! makes the uniqueness invariant trivially correct: a failed call is
//! fully rolled back before the lock is released, so no other caller
//! ever observes a half-applied write.
//!
//! ## Reference counting
//!
//! The bucket index answers "is this id known anywhere"; the `refs`
//! map counts how many files hold each id. An id leaves the index only
//! when its owning-file count reaches zero, so deleting an id from one
//! file never makes it look fresh while another file still holds it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{FilerError, Result};
use crate::index::BucketIndex;
use crate::store::FileStore;

/// In-memory representation of one named, persisted set of identifiers
#[derive(Debug, Default)]
struct FileEntry {
    ids: HashSet<u32>,
}

/// All mutable engine state, guarded by a single lock
struct State {
    /// File name → its id set (source of truth for per-file membership)
    files: HashMap<String, FileEntry>,

    /// Derived uniqueness index over all ids held by any file
    index: BucketIndex,

    /// id → number of files currently holding it
    refs: HashMap<u32, usize>,
}

/// The main storage engine
pub struct Engine {
    config: Config,
    store: FileStore,
    state: Mutex<State>,
}

impl Engine {
    /// Open an engine over an existing storage directory.
    ///
    /// On startup:
    /// 1. Validate config (bucket count, directory existence)
    /// 2. Scan the directory, deleting empty leftover files
    /// 3. Replay every parsed id through the load path
    ///
    /// The load path bypasses uniqueness rejection: the files on disk
    /// are the source of truth being replayed. Any parse failure
    /// aborts the open; the engine must not run with partial state.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let store = FileStore::open(&config.storage_dir)?;
        let index = BucketIndex::new(config.hash_buckets)?;

        let mut state = State {
            files: HashMap::new(),
            index,
            refs: HashMap::new(),
        };

        for file in store.scan()? {
            state.load_file(file.name, &file.ids);
        }

        info!(
            files = state.files.len(),
            ids = state.index.len(),
            "storage directory loaded"
        );

        Ok(Self {
            config,
            store,
            state: Mutex::new(state),
        })
    }

    /// Open with a storage directory path (convenience method)
    ///
    /// Uses default config with the specified directory.
    pub fn open_dir(path: &Path) -> Result<Self> {
        let config = Config::builder().storage_dir(path).build();
        Self::open(config)
    }

    /// Write ids into a named file.
    ///
    /// With `new_file`, the file is created; creating an existing name
    /// resets its set and truncates its disk file (replacement is the
    /// contract — prior membership is discarded). Without `new_file`,
    /// the file must already exist or the call fails with
    /// `UnknownFile`.
    ///
    /// Without `allow_duplicates`, an id already known in any file
    /// fails the whole call with `DuplicateId`. With it, a globally
    /// known id is still recorded in this file's set; inserting an id
    /// the file already holds is a no-op (set semantics).
    ///
    /// On any failure — duplicate or disk I/O — every id this call
    /// inserted is rolled back, and a replaced set is restored, before
    /// the error is returned.
    pub fn write(
        &self,
        name: &str,
        ids: &[u32],
        new_file: bool,
        allow_duplicates: bool,
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock();

        // Register (or replace) the entry before inserting ids.
        let previous = if new_file {
            let prev = state.files.remove(name);
            if let Some(entry) = &prev {
                for &id in &entry.ids {
                    state.unlink(id);
                }
            }
            state.files.insert(name.to_string(), FileEntry::default());
            prev
        } else {
            if !state.files.contains_key(name) {
                return Err(FilerError::UnknownFile(name.to_string()));
            }
            None
        };

        let mut inserted: Vec<u32> = Vec::with_capacity(ids.len());
        for &id in ids {
            if !allow_duplicates && state.index.contains(id) {
                state.abort_write(name, &inserted, new_file, previous);
                return Err(FilerError::DuplicateId(id));
            }

            if state.add_id(name, id) {
                inserted.push(id);
            }
        }

        let write_result = if new_file {
            self.store.create(name, ids)
        } else {
            self.store.append(name, ids)
        };

        if let Err(e) = write_result {
            error!(file = name, error = %e, "disk write failed, rolling back");
            if new_file && previous.is_none() {
                // Do not leave a half-created file behind.
                let _ = std::fs::remove_file(self.store.path(name));
            }
            state.abort_write(name, &inserted, new_file, previous);
            return Err(e);
        }

        Ok(())
    }

    /// Return the full current id set for a file, sorted.
    ///
    /// The contract is set equality only; ordering is an
    /// implementation convenience.
    pub fn read(&self, name: &str) -> Result<Vec<u32>> {
        let state = self.state.lock();

        let entry = state
            .files
            .get(name)
            .ok_or_else(|| FilerError::UnknownFile(name.to_string()))?;

        let mut ids: Vec<u32> = entry.ids.iter().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Remove ids from a file's set; ids not present are silently
    /// skipped.
    ///
    /// The disk file is rewritten with the full surviving set. If the
    /// set becomes empty, the file is deleted from disk and the entry
    /// is dropped — a file with zero ids does not persist. On disk
    /// failure the removals are rolled back before the error is
    /// returned.
    pub fn delete_ids(&self, name: &str, ids: &[u32]) -> Result<()> {
        let mut state = self.state.lock();

        if !state.files.contains_key(name) {
            return Err(FilerError::UnknownFile(name.to_string()));
        }

        let mut removed: Vec<u32> = Vec::new();
        for &id in ids {
            if state.remove_id(name, id) {
                removed.push(id);
            }
        }

        let survivors = state.snapshot(name);

        let write_result = if survivors.is_empty() {
            self.store.remove(name)
        } else {
            self.store.rewrite(name, &survivors)
        };

        if let Err(e) = write_result {
            error!(file = name, error = %e, "disk rewrite failed, rolling back");
            for &id in &removed {
                state.add_id(name, id);
            }
            return Err(e);
        }

        if survivors.is_empty() {
            state.files.remove(name);
        }

        Ok(())
    }

    /// Delete a file entirely, from disk and from the engine.
    ///
    /// All its ids' owning-file counts are decremented; ids held by no
    /// other file leave the uniqueness index.
    pub fn delete_file(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();

        if !state.files.contains_key(name) {
            return Err(FilerError::UnknownFile(name.to_string()));
        }

        // Disk first: if the unlink fails, in-memory state is untouched.
        self.store.remove(name)?;

        if let Some(entry) = state.files.remove(name) {
            for &id in &entry.ids {
                state.unlink(id);
            }
        }

        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of files currently registered
    pub fn file_count(&self) -> usize {
        self.state.lock().files.len()
    }

    /// Whether a file entry is registered
    pub fn has_file(&self, name: &str) -> bool {
        self.state.lock().files.contains_key(name)
    }

    /// Number of distinct ids known across all files
    pub fn unique_id_count(&self) -> usize {
        self.state.lock().index.len()
    }

    /// The storage directory path
    pub fn storage_dir(&self) -> &Path {
        self.store.dir()
    }

    /// The configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl State {
    /// Startup load path: populates an entry without uniqueness
    /// rejection. Duplicate ids across files raise the owning-file
    /// count instead of failing.
    fn load_file(&mut self, name: String, ids: &[u32]) {
        self.files.entry(name.clone()).or_default();
        for &id in ids {
            self.add_id(&name, id);
        }
    }

    /// Add an id to a file's set, linking it into the index and
    /// raising its owning-file count if the set did not hold it yet.
    fn add_id(&mut self, name: &str, id: u32) -> bool {
        let inserted = match self.files.get_mut(name) {
            Some(entry) => entry.ids.insert(id),
            None => false,
        };
        if inserted {
            self.link(id);
        }
        inserted
    }

    /// Remove an id from a file's set, dropping it from the index when
    /// no file holds it anymore.
    fn remove_id(&mut self, name: &str, id: u32) -> bool {
        let removed = match self.files.get_mut(name) {
            Some(entry) => entry.ids.remove(&id),
            None => false,
        };
        if removed {
            self.unlink(id);
        }
        removed
    }

    /// Raise an id's owning-file count, inserting it into the index on
    /// the first owner.
    fn link(&mut self, id: u32) {
        let count = self.refs.entry(id).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.index.insert(id);
        }
    }

    /// Lower an id's owning-file count, removing it from the index
    /// when the last owner lets go.
    fn unlink(&mut self, id: u32) {
        if let Some(count) = self.refs.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.refs.remove(&id);
                self.index.remove(id);
            }
        }
    }

    /// Undo a failed write: every id the call inserted is removed, and
    /// a set replaced by `new_file` is restored in full. Leaves every
    /// file's in-memory state exactly as before the call.
    fn abort_write(
        &mut self,
        name: &str,
        inserted: &[u32],
        new_file: bool,
        previous: Option<FileEntry>,
    ) {
        for &id in inserted {
            self.remove_id(name, id);
        }

        if new_file {
            self.files.remove(name);
            if let Some(prev) = previous {
                for &id in &prev.ids {
                    self.link(id);
                }
                self.files.insert(name.to_string(), prev);
            }
        }
    }

    /// Sorted copy of a file's current id set (empty if absent)
    fn snapshot(&self, name: &str) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .files
            .get(name)
            .map(|entry| entry.ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}
