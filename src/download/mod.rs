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


//! Offline download coordination
//!
//! This module holds the two public faces of the crate: [`Asset`], the
//! named handle to a remote streaming source, and [`Downloader`], the
//! coordinator that owns the live task map and the engine wiring.
//!
//! A download is fire-and-forget. Callers register progress, finish, and
//! error callbacks on an asset (late registrations replay a stored
//! result), start it, and get notified from the coordinator's event pump
//! as the engine reports in.

pub mod asset;
pub mod coordinator;
pub mod progress;

pub use asset::{Asset, AssetState, ErrorFn, FinishFn, ProgressFn};
pub use coordinator::{Downloader, DownloaderConfig, DEFAULT_MIN_BITRATE_BPS};
pub use progress::completed_fraction;
