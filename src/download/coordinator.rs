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


//! Download coordinator: live-task bookkeeping, engine wiring, and
//! terminal-outcome classification.
//!
//! The coordinator owns the only mapping from engine task handles to
//! assets. Engine events are consumed one at a time by a single pump
//! task, so no two reports are ever processed concurrently; caller-facing
//! operations reach the task map through its lock and the path store is
//! internally synchronized, so they may run from any context.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

use super::asset::{Asset, Outcome};
use super::progress::completed_fraction;
use crate::engine::{
    EngineEvent, EventReceiver, StreamingEngine, TaskHandle, TaskId, TimeRange,
};
use crate::error::{EngineError, OffstreamError, Result};
use crate::file;
use crate::store::PathStore;

/// Quality floor handed to the engine at task creation, so constrained
/// networks do not lock in the lowest-quality rendition.
pub const DEFAULT_MIN_BITRATE_BPS: u32 = 265_000;

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Directory all stored relative paths resolve against.
    pub home_dir: PathBuf,
    /// Location of the durable name → relative path document.
    pub store_file: PathBuf,
    /// Minimum media bitrate hint for new tasks.
    pub min_bitrate_bps: u32,
}

impl DownloaderConfig {
    /// Defaults rooted at `home_dir`: the store document lives inside it
    /// and new tasks get the standard quality floor.
    pub fn for_home(home_dir: impl Into<PathBuf>) -> Self {
        let home_dir = home_dir.into();
        let store_file = home_dir.join("offstream-assets.json");
        Self {
            home_dir,
            store_file,
            min_bitrate_bps: DEFAULT_MIN_BITRATE_BPS,
        }
    }
}

/// A live download: the engine handle plus the asset it fetches.
struct TaskEntry {
    handle: TaskHandle,
    asset: Asset,
}

/// State shared between the coordinator facade, its assets, and the
/// event pump.
pub(crate) struct Shared {
    engine: Arc<dyn StreamingEngine>,
    pub(crate) store: PathStore,
    pub(crate) home_dir: PathBuf,
    min_bitrate_bps: u32,
    /// The only place a download is "live". Entries are added when the
    /// engine hands out a task and removed on terminal completion.
    tasks: RwLock<HashMap<TaskId, TaskEntry>>,
}

/// Owner of the live task map and the engine wiring.
///
/// Constructed explicitly and passed to whatever needs it; there is no
/// ambient global instance. Cloning is cheap and shares all state.
#[derive(Clone)]
pub struct Downloader {
    shared: Arc<Shared>,
}

impl Downloader {
    /// Wire up the coordinator and spawn the event pump consuming
    /// `events`. The pump runs until the engine drops its sender.
    pub fn new(
        engine: Arc<dyn StreamingEngine>,
        events: EventReceiver,
        config: DownloaderConfig,
    ) -> Self {
        let shared = Arc::new(Shared {
            engine,
            store: PathStore::open(config.store_file),
            home_dir: config.home_dir,
            min_bitrate_bps: config.min_bitrate_bps,
            tasks: RwLock::new(HashMap::new()),
        });
        tokio::spawn(pump(Arc::clone(&shared), events));
        Self { shared }
    }

    /// Create a handle to the named resource backed by this coordinator.
    pub fn asset(&self, source: Url, name: impl Into<String>) -> Asset {
        Asset::new(Arc::clone(&self.shared), source, name)
    }

    /// Re-attach to tasks the engine kept alive across a process restart.
    /// Call once at startup.
    ///
    /// Reconstructed assets carry no callbacks; a caller that wants to
    /// observe a resumed download registers callbacks on an equal asset
    /// (same name and locator). Returns the number of tasks re-attached.
    pub async fn restore_tasks(&self) -> usize {
        let existing = self.shared.engine.existing_tasks().await;
        let mut tasks = self.shared.tasks.write().await;
        let restored = existing.len();
        for handle in existing {
            let asset = Asset::new(
                Arc::clone(&self.shared),
                handle.locator.clone(),
                handle.description.clone(),
            );
            tasks.insert(handle.id, TaskEntry { handle, asset });
        }
        if restored > 0 {
            info!(restored, "re-attached to persisted download tasks");
        }
        restored
    }

    /// Whether `name` has a stored path and the file is actually present.
    pub async fn asset_exists(&self, name: &str) -> bool {
        self.shared.asset_exists(name).await
    }

    /// Delete the stored tree for `name` and drop its store entry. No-op
    /// when no entry exists; deletion failures propagate.
    pub async fn delete_asset(&self, name: &str) -> Result<()> {
        self.shared.delete_asset(name).await
    }

    /// Snapshot of every resource with a recorded save location.
    pub fn downloaded_assets(&self) -> HashMap<String, String> {
        self.shared.store.snapshot()
    }

    /// Number of live download tasks.
    pub async fn active_downloads(&self) -> usize {
        self.shared.tasks.read().await.len()
    }
}

impl Shared {
    pub(crate) async fn asset_exists(&self, name: &str) -> bool {
        match self.store.get(name) {
            Some(rel) => file::exists(&self.home_dir.join(rel)).await,
            None => false,
        }
    }

    pub(crate) async fn is_downloading(&self, asset: &Asset) -> bool {
        self.tasks
            .read()
            .await
            .values()
            .any(|entry| entry.asset == *asset)
    }

    /// Start a download for `asset`. Silent no-op when the asset is
    /// already cached, a task for its name is already live, or the engine
    /// refuses to create a task.
    pub(crate) async fn download_stream(&self, asset: &Asset) {
        if self.asset_exists(&asset.name).await {
            debug!(name = %asset.name, "already downloaded, ignoring download request");
            return;
        }
        let mut tasks = self.tasks.write().await;
        if tasks.values().any(|entry| entry.asset.name == asset.name) {
            debug!(name = %asset.name, "download already in flight");
            return;
        }
        let Some(handle) = self
            .engine
            .create_task(&asset.source, &asset.name, self.min_bitrate_bps)
            .await
        else {
            debug!(name = %asset.name, "engine refused to create a task");
            return;
        };
        info!(name = %asset.name, task = %handle.id, "starting download");
        tasks.insert(
            handle.id,
            TaskEntry {
                handle: handle.clone(),
                asset: asset.clone(),
            },
        );
        drop(tasks);
        self.engine.resume(&handle).await;
    }

    /// Ask the engine to cancel the live task equal to `asset`, if any.
    pub(crate) async fn cancel_download(&self, asset: &Asset) {
        let handle = {
            let tasks = self.tasks.read().await;
            tasks
                .values()
                .find(|entry| entry.asset == *asset)
                .map(|entry| entry.handle.clone())
        };
        match handle {
            Some(handle) => {
                info!(name = %asset.name, task = %handle.id, "cancelling download");
                self.engine.cancel(&handle).await;
            }
            None => debug!(name = %asset.name, "no live download to cancel"),
        }
    }

    pub(crate) async fn delete_asset(&self, name: &str) -> Result<()> {
        let Some(rel) = self.store.get(name) else {
            return Ok(());
        };
        file::remove_tree(&self.home_dir.join(&rel)).await?;
        self.store.remove(name);
        info!(name, "deleted local asset");
        Ok(())
    }

    async fn task_asset(&self, task: TaskId) -> Option<Asset> {
        self.tasks
            .read()
            .await
            .get(&task)
            .map(|entry| entry.asset.clone())
    }

    /// Periodic buffered-range report. A fresh progress signal
    /// invalidates any stale terminal outcome.
    async fn on_loaded_ranges(&self, task: TaskId, loaded: &[TimeRange], expected: &TimeRange) {
        let Some(asset) = self.task_asset(task).await else {
            return;
        };
        let callback = {
            let mut hooks = asset.hooks.lock().unwrap();
            hooks.result = None;
            hooks.on_progress.clone()
        };
        if let Some(callback) = callback {
            callback(completed_fraction(loaded, expected));
        }
    }

    /// The engine reported a save location. Non-terminating: a task may
    /// report several locations before completing and the store keeps
    /// the latest.
    async fn on_saved_to(&self, task: TaskId, relative_path: String) {
        let Some(asset) = self.task_asset(task).await else {
            return;
        };
        debug!(name = %asset.name, path = %relative_path, "engine reported save location");
        if !self.store.set(&asset.name, &relative_path) {
            warn!(name = %asset.name, "failed to persist save location");
        }
    }

    /// Terminal completion. Removing the map entry doubles as the
    /// double-completion guard.
    async fn on_complete(&self, task: TaskId, outcome: Option<EngineError>) {
        let Some(entry) = self.tasks.write().await.remove(&task) else {
            return;
        };
        let asset = entry.asset;
        match outcome {
            None => {
                info!(name = %asset.name, "download completed");
                let callback = {
                    let mut hooks = asset.hooks.lock().unwrap();
                    hooks.result = Some(Outcome::Success);
                    hooks.on_finish.clone()
                };
                if let Some(callback) = callback {
                    let relative_path = self
                        .store
                        .get(&asset.name)
                        .expect("completed download has no recorded save location");
                    callback(relative_path);
                }
            }
            Some(EngineError::Cancelled) => {
                // user-initiated: clean up the partial file, surface nothing
                if let Some(rel) = self.store.get(&asset.name) {
                    let path = self.home_dir.join(&rel);
                    if let Err(e) = file::remove_tree(&path).await {
                        warn!(
                            name = %asset.name,
                            path = %path.display(),
                            "failed to delete partial download: {e}"
                        );
                    }
                    // drop the entry even if the delete failed, so a
                    // leftover partial file can never read as Downloaded
                    self.store.remove(&asset.name);
                }
                info!(name = %asset.name, "download cancelled");
            }
            Some(err @ EngineError::Unsupported(_)) => {
                asset.hooks.lock().unwrap().result = Some(Outcome::Failure(err.clone()));
                error!(name = %asset.name, "aborting: {err}");
                std::process::abort();
            }
            Some(err) => {
                warn!(name = %asset.name, "download failed: {err}");
                let callback = {
                    let mut hooks = asset.hooks.lock().unwrap();
                    hooks.result = Some(Outcome::Failure(err.clone()));
                    hooks.on_error.clone()
                };
                if let Some(callback) = callback {
                    callback(OffstreamError::Download(err));
                }
            }
        }
    }
}

/// Consume engine events one at a time. This is the canonical sequence
/// every task-map transition driven by the engine happens on.
async fn pump(shared: Arc<Shared>, mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::LoadedRanges {
                task,
                loaded,
                expected,
            } => shared.on_loaded_ranges(task, &loaded, &expected).await,
            EngineEvent::SavedTo {
                task,
                relative_path,
            } => shared.on_saved_to(task, relative_path).await,
            EngineEvent::Completed { task, error } => shared.on_complete(task, error).await,
        }
    }
    debug!("engine event channel closed, pump exiting");
}
