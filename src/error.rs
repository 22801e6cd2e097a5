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


//! Error types for offstream
//!
//! Two layers: [`EngineError`] is the terminal error the streaming engine
//! attaches to a completion report; the coordinator classifies it into
//! cleanup, fatal, or surfaced-failure handling. [`OffstreamError`] is the
//! crate-level error returned by caller-facing operations and delivered to
//! error callbacks.
//!
//! Path store write failures are deliberately part of neither type: the
//! store reports them as a boolean so a failed rewrite never unwinds
//! through the event pump.

use thiserror::Error;

/// Result type alias using our OffstreamError type
pub type Result<T> = std::result::Result<T, OffstreamError>;

/// Terminal error the streaming engine attaches to a completion report.
///
/// Cloneable so it can be stored as a pending outcome for replay and
/// handed to an error callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The task was cancelled by the user. Cleanup only, never surfaced
    /// as a failure.
    #[error("download cancelled")]
    Cancelled,

    /// The environment cannot run background streaming downloads at all.
    /// Fatal by policy: the coordinator aborts the process rather than
    /// letting the misconfiguration pass silently.
    #[error("streaming downloads unsupported: {0}")]
    Unsupported(String),

    /// Any other network or storage failure during transfer.
    #[error("transfer failed: {message}")]
    Transfer {
        message: String,
        /// Whether retrying the download later might succeed
        is_transient: bool,
    },
}

/// Main error type for offstream
#[derive(Error, Debug)]
pub enum OffstreamError {
    /// Local file deletion or inspection failed
    #[error("file I/O error: {0}")]
    FileIo(#[from] std::io::Error),

    /// A download attempt concluded with an engine failure
    #[error("download failed: {0}")]
    Download(EngineError),
}
