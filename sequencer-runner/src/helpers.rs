// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for sequencer-runner.

use std::time::Duration;

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "item" if `count` is 1, otherwise "items".
    pub fn items_str(count: usize) -> &'static str {
        if count == 1 { "item" } else { "items" }
    }

    /// Returns "group" if `count` is 1, otherwise "groups".
    pub fn groups_str(count: usize) -> &'static str {
        if count == 1 { "group" } else { "groups" }
    }

    /// Returns "rule" if `count` is 1, otherwise "rules".
    pub fn rules_str(count: usize) -> &'static str {
        if count == 1 { "rule" } else { "rules" }
    }
}

/// Formats a timeout for display, e.g. `2m` or `35m`.
pub fn format_timeout(timeout: Duration) -> humantime::FormattedDuration {
    humantime::format_duration(timeout)
}
