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


//! Event types the engine reports back to the coordinator.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::TaskId;
use crate::error::EngineError;

/// A buffered span of media time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        Self {
            start: Duration::from_secs_f64(start_secs),
            duration: Duration::from_secs_f64(duration_secs),
        }
    }
}

/// Asynchronous reports from the engine.
///
/// Delivered over a single channel and consumed serially by the
/// coordinator's event pump.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Periodic buffered-range progress for a task.
    LoadedRanges {
        task: TaskId,
        /// Ranges buffered so far. May contain disjoint spans that have
        /// not yet been consolidated.
        loaded: Vec<TimeRange>,
        /// The span the task is expected to load in total.
        expected: TimeRange,
    },
    /// The engine wrote the asset to disk. A task may report several
    /// locations before completing; the latest one wins.
    SavedTo {
        task: TaskId,
        /// Save location relative to the coordinator's home directory.
        relative_path: String,
    },
    /// Terminal completion. `error == None` means success.
    Completed {
        task: TaskId,
        error: Option<EngineError>,
    },
}

/// Channel for engine → coordinator reports
pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the engine → coordinator event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
