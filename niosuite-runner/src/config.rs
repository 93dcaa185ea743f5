// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run configuration: which targets a suite run exercises, and how to reach them.

use crate::list::test_cases;

/// The build target example binaries are compiled for.
///
/// Every target currently runs host-side binaries: even the ESP32 target is exercised by
/// `linux` builds that talk to the device over its serial port.
pub const BUILD_TARGET: &str = "linux";

/// Configuration for a suite run: an ordered list of targets to build and test.
///
/// Targets run strictly in the order they appear here.
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    targets: Vec<RunTarget>,
}

impl SuiteConfig {
    /// Creates a new configuration from a list of targets.
    pub fn new(targets: Vec<RunTarget>) -> Self {
        Self { targets }
    }

    /// Returns the targets in run order.
    pub fn targets(&self) -> &[RunTarget] {
        &self.targets
    }

    /// Returns the total number of test executions planned across all targets.
    pub fn test_count(&self) -> usize {
        self.targets.len() * test_cases().len()
    }
}

/// A target to run the suite against.
#[derive(Clone, Debug)]
pub struct RunTarget {
    name: &'static str,
    build_target: &'static str,
    label: &'static str,
    port: String,
    host: String,
}

impl RunTarget {
    /// Creates the POSIX target: a host-side build reachable over a local serial port (usually
    /// a pty), with test services on localhost.
    pub fn posix(port: impl Into<String>) -> Self {
        Self {
            name: "POSIX",
            build_target: BUILD_TARGET,
            label: BUILD_TARGET,
            port: port.into(),
            host: "127.0.0.1".to_owned(),
        }
    }

    /// Creates the ESP32 target: a physical device on a serial port.
    ///
    /// The binaries are still host-side `linux` builds. They exercise the device over the
    /// serial transport and reach test services at `services_host`, which must be an address
    /// the device can route to (not localhost). Outcomes are recorded under the `esp32` label.
    pub fn esp32(port: impl Into<String>, services_host: impl Into<String>) -> Self {
        Self {
            name: "ESP32",
            build_target: BUILD_TARGET,
            label: "esp32",
            port: port.into(),
            host: services_host.into(),
        }
    }

    /// Returns the display name of this target, e.g. `POSIX`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the build target binaries are compiled for.
    pub fn build_target(&self) -> &'static str {
        self.build_target
    }

    /// Returns the label outcomes for this target are recorded under.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns the serial port passed to example binaries via `FN_PORT`.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Returns the host address test services are reached at.
    pub fn host(&self) -> &str {
        &self.host
    }
}
