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


//! offstream — offline availability for remote HLS streams.
//!
//! The crate tracks which named streaming resources are cached locally,
//! coordinates fetches against an external streaming download engine, and
//! persists where completed downloads landed on disk. Construct a
//! [`Downloader`] with an engine implementation and its event channel,
//! call [`Downloader::restore_tasks`] once at startup to re-attach to
//! engine-persisted tasks, then hand out [`Asset`] handles and drive them
//! with `download`, `cancel_download`, and `delete_local_copy`.
//!
//! The engine itself — the platform service doing the chunked HTTP
//! fetching — stays behind the [`StreamingEngine`] trait and is supplied
//! by the embedding application.

pub mod download;
pub mod engine;
pub mod error;
pub mod file;
pub mod store;

pub use download::{Asset, AssetState, Downloader, DownloaderConfig, DEFAULT_MIN_BITRATE_BPS};
pub use engine::{
    event_channel, EngineEvent, EventReceiver, EventSender, StreamingEngine, TaskHandle, TaskId,
    TimeRange,
};
pub use error::{EngineError, OffstreamError, Result};
pub use store::PathStore;
