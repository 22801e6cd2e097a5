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


//! Named handle to a remote streaming source.
//!
//! An [`Asset`] carries no download state of its own: its state is derived
//! on each access from the path store and the coordinator's live task map.
//! Cloning an asset shares its callback slots, which is how the instance
//! the coordinator retains in the task map and the caller's instance
//! observe the same registrations.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use url::Url;

use super::coordinator::Shared;
use crate::error::{EngineError, OffstreamError, Result};
use crate::file;

/// Download state of an asset, derived on each access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetState {
    /// No cached copy and no live task
    NotDownloaded,
    /// A live engine task is fetching this asset
    Downloading,
    /// A stored path exists and the file is present
    Downloaded,
}

/// Terminal result of a download attempt, held until the next progress
/// report invalidates it.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Success,
    Failure(EngineError),
}

/// Progress callback, invoked with the aggregated completion fraction.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;
/// Finish callback, invoked with the stored relative path on success.
pub type FinishFn = Arc<dyn Fn(String) + Send + Sync>;
/// Error callback, invoked when a download concludes in failure.
pub type ErrorFn = Arc<dyn Fn(OffstreamError) + Send + Sync>;

/// Callback slots plus the pending outcome, shared by every clone of the
/// asset. Latest registration wins.
#[derive(Default)]
pub(crate) struct Hooks {
    pub(crate) result: Option<Outcome>,
    pub(crate) on_progress: Option<ProgressFn>,
    pub(crate) on_finish: Option<FinishFn>,
    pub(crate) on_error: Option<ErrorFn>,
}

/// A named remote streaming source plus its local-cache bookkeeping.
///
/// Equality is by name and source locator, never object identity; any
/// number of instances may refer to the same logical resource. Instances
/// need no teardown: all durable state lives in the path store.
#[derive(Clone)]
pub struct Asset {
    pub(crate) name: String,
    pub(crate) source: Url,
    pub(crate) hooks: Arc<Mutex<Hooks>>,
    pub(crate) shared: Arc<Shared>,
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.source == other.source
    }
}

impl Eq for Asset {}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.source)
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("name", &self.name)
            .field("source", &self.source.as_str())
            .finish()
    }
}

impl Asset {
    pub(crate) fn new(shared: Arc<Shared>, source: Url, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source,
            hooks: Arc::new(Mutex::new(Hooks::default())),
            shared,
        }
    }

    /// Identifier name, also the path store key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote manifest location.
    pub fn source(&self) -> &Url {
        &self.source
    }

    /// Download state, derived from the path store and the live task map.
    pub async fn state(&self) -> AssetState {
        if self.shared.asset_exists(&self.name).await {
            return AssetState::Downloaded;
        }
        if self.shared.is_downloading(self).await {
            return AssetState::Downloading;
        }
        AssetState::NotDownloaded
    }

    /// Absolute path of the local copy, `None` if no save location was
    /// ever recorded.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.shared
            .store
            .get(&self.name)
            .map(|rel| self.shared.home_dir.join(rel))
    }

    /// Recursive size in bytes of the local copy; 0 unless downloaded.
    /// Unreadable entries contribute 0.
    pub async fn offline_size(&self) -> u64 {
        if self.state().await != AssetState::Downloaded {
            return 0;
        }
        match self.local_path() {
            Some(path) => file::tree_size(&path).await,
            None => 0,
        }
    }

    /// Start downloading this asset. Fire-and-forget: a no-op when the
    /// asset is already cached or already has a live task, and completion
    /// is reported only through the registered callbacks.
    pub async fn download(&self) -> &Self {
        self.shared.download_stream(self).await;
        self
    }

    /// [`download`](Self::download) with a progress callback registered
    /// first.
    pub async fn download_with_progress(
        &self,
        callback: impl Fn(f64) + Send + Sync + 'static,
    ) -> &Self {
        self.progress(callback);
        self.download().await
    }

    /// Register the progress callback, replacing any previous one.
    pub fn progress(&self, callback: impl Fn(f64) + Send + Sync + 'static) -> &Self {
        self.hooks.lock().unwrap().on_progress = Some(Arc::new(callback));
        self
    }

    /// Register the finish callback, invoked with the stored relative path
    /// once a download succeeds. Registering after the download already
    /// concluded replays the stored result immediately.
    pub fn finish(&self, callback: impl Fn(String) + Send + Sync + 'static) -> &Self {
        let callback: FinishFn = Arc::new(callback);
        let replay = {
            let mut hooks = self.hooks.lock().unwrap();
            hooks.on_finish = Some(callback.clone());
            matches!(hooks.result, Some(Outcome::Success))
        };
        if replay {
            let relative_path = self
                .shared
                .store
                .get(&self.name)
                .expect("completed download has no recorded save location");
            callback(relative_path);
        }
        self
    }

    /// Register the error callback; a stored failure replays immediately.
    pub fn on_error(&self, callback: impl Fn(OffstreamError) + Send + Sync + 'static) -> &Self {
        let callback: ErrorFn = Arc::new(callback);
        let replay = {
            let mut hooks = self.hooks.lock().unwrap();
            hooks.on_error = Some(callback.clone());
            match &hooks.result {
                Some(Outcome::Failure(e)) => Some(e.clone()),
                _ => None,
            }
        };
        if let Some(error) = replay {
            callback(OffstreamError::Download(error));
        }
        self
    }

    /// Cancel the live download for this asset, if any. Cooperative: the
    /// task leaves the live map only when the engine reports the
    /// cancelled completion.
    pub async fn cancel_download(&self) {
        self.shared.cancel_download(self).await;
    }

    /// Delete the local copy and drop its stored path. No-op when nothing
    /// was downloaded; local deletion failures propagate.
    pub async fn delete_local_copy(&self) -> Result<()> {
        self.shared.delete_asset(&self.name).await
    }
}
