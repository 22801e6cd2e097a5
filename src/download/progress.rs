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


//! Progress aggregation for buffered-range reports.

use crate::engine::TimeRange;

/// Collapse the engine's loaded ranges into a single completion fraction.
///
/// The sum can legitimately exceed 1.0 when disjoint ranges are reported
/// before the engine consolidates them; callers must not assume
/// `fraction <= 1`. An expected range of zero duration yields 0.0.
pub fn completed_fraction(loaded: &[TimeRange], expected: &TimeRange) -> f64 {
    let expected_secs = expected.duration.as_secs_f64();
    if expected_secs <= 0.0 {
        return 0.0;
    }
    loaded
        .iter()
        .map(|range| range.duration.as_secs_f64() / expected_secs)
        .sum()
}
