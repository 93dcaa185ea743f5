// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Times build steps and test executions.
//!
//! Durations are measured with a monotonic [`Instant`] so that system clock adjustments mid-run
//! don't skew reported timings.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub(crate) struct StopwatchStart {
    instant: Instant,
}

impl StopwatchStart {
    pub(crate) fn now() -> Self {
        Self {
            instant: Instant::now(),
        }
    }

    /// Returns the time elapsed since the stopwatch was started.
    pub(crate) fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }
}
