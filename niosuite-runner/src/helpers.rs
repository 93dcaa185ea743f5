// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for niosuite-runner.

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "target" if `count` is 1, otherwise "targets".
    pub fn targets_str(count: usize) -> &'static str {
        if count == 1 { "target" } else { "targets" }
    }
}

/// Returns the first `max_chars` characters of `s`, cutting on a character boundary.
///
/// Captured output is arbitrary (possibly lossily-decoded) UTF-8, so a byte slice of a fixed
/// length could split a multi-byte character and panic.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
