// offstream - Offline HLS Stream Management
// Copyright (C) 2025 offstream contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Persisted mapping from resource name to relative storage path.
//!
//! The document is loaded once at open and every mutation rewrites it
//! whole, via a temp file and rename so a crash mid-write never leaves a
//! truncated store behind. Mutations report success as a boolean; callers
//! must not assume durability until they have observed it. A single
//! process owns the file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::warn;

/// Durable name → relative path mapping.
///
/// An entry exists only for a resource whose download reported a save
/// location; entries leave on explicit delete or when a cancelled
/// download's partial file is cleaned up.
#[derive(Debug)]
pub struct PathStore {
    file: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl PathStore {
    /// Open the store backed by `file`, loading any existing document.
    /// A missing file starts the store empty; an unreadable or corrupt
    /// document is logged and treated as empty.
    pub fn open(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let entries = match fs::read(&file) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!("ignoring corrupt path store {}: {}", file.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("ignoring unreadable path store {}: {}", file.display(), e);
                HashMap::new()
            }
        };
        Self {
            file,
            entries: RwLock::new(entries),
        }
    }

    /// Relative path recorded for `name`, if any.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.read().unwrap().get(name).cloned()
    }

    /// Record `path` for `name` and rewrite the document. Returns false
    /// when the rewrite failed; the in-memory entry is kept either way so
    /// a later mutation can persist it.
    pub fn set(&self, name: &str, path: &str) -> bool {
        let mut entries = self.entries.write().unwrap();
        entries.insert(name.to_string(), path.to_string());
        self.persist(&entries)
    }

    /// Drop the entry for `name` and rewrite the document. Returns false
    /// when no entry existed or the rewrite failed.
    pub fn remove(&self, name: &str) -> bool {
        let mut entries = self.entries.write().unwrap();
        if entries.remove(name).is_none() {
            return false;
        }
        self.persist(&entries)
    }

    /// Read-only copy of all entries.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().unwrap().clone()
    }

    fn persist(&self, entries: &HashMap<String, String>) -> bool {
        match self.try_persist(entries) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to persist path store {}: {}", self.file.display(), e);
                false
            }
        }
    }

    fn try_persist(&self, entries: &HashMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.file.with_extension("tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.file)
    }
}
