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


//! Streaming download engine contract
//!
//! The engine is the platform service that performs the actual chunked
//! fetch of a streaming manifest and its segments, running fetches as
//! resumable background operations that survive process restarts. The
//! coordinator drives it through the commands on [`StreamingEngine`] and
//! consumes its asynchronous reports as [`EngineEvent`]s delivered over a
//! single channel.
//!
//! Implementations own the transfer entirely: retry, resumption, and the
//! on-disk write all happen behind this seam.

pub mod events;

pub use events::{event_channel, EngineEvent, EventReceiver, EventSender, TimeRange};

use std::fmt;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use url::Url;

/// Opaque identifier the engine assigns to one fetch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Handle to one in-progress fetch operation.
///
/// `description` carries the resource name the task was tagged with at
/// creation; that tag is how resources are re-identified when tasks are
/// recovered after a restart. Identity, equality, and hashing go by
/// [`TaskId`] alone.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub id: TaskId,
    /// Remote manifest location the task is fetching.
    pub locator: Url,
    /// Opaque tag supplied at creation (the resource name).
    pub description: String,
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TaskHandle {}

impl Hash for TaskHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Commands the coordinator issues to the platform download service.
///
/// Reports flow back over the [`EventSender`] the engine was constructed
/// with. Implementations must deliver events for a given task in order;
/// the coordinator consumes the channel serially, so no further ordering
/// guarantees are needed across tasks.
#[async_trait]
pub trait StreamingEngine: Send + Sync {
    /// Ask the engine for a new resumable download task for `locator`,
    /// tagged with `title` and constrained to renditions of at least
    /// `min_bitrate_bps`. `None` means the engine refused; callers treat
    /// that as a no-op.
    async fn create_task(
        &self,
        locator: &Url,
        title: &str,
        min_bitrate_bps: u32,
    ) -> Option<TaskHandle>;

    /// Start or resume the task.
    async fn resume(&self, task: &TaskHandle);

    /// Request cooperative cancellation. The engine later reports a
    /// `Completed` event carrying [`EngineError::Cancelled`].
    ///
    /// [`EngineError::Cancelled`]: crate::error::EngineError::Cancelled
    async fn cancel(&self, task: &TaskHandle);

    /// Tasks the engine still knows about, including ones persisted from
    /// previous runs of the process.
    async fn existing_tasks(&self) -> Vec<TaskHandle>;
}
