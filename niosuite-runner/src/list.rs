// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test case registry, and resolution of example binaries on disk.
//!
//! The suite runs a fixed set of example programs, each exercising one protocol end to end
//! against live test services. Cases are described declaratively: the example binary to run,
//! the environment it needs, the substrings its output must contain, and a timeout.

use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;
use swrite::{SWrite, swrite};

/// Environment passed to an example binary.
///
/// Every case receives the target's serial port via `FN_PORT`. Beyond that, cases fall into
/// three shapes depending on which service they talk to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnvSpec {
    /// Only the serial port is passed.
    Serial,
    /// A URL-driven case: `FN_TEST_URL` is assembled from the scheme, service port and path.
    Url {
        /// URL scheme, e.g. `https`.
        scheme: &'static str,
        /// Port the test service listens on.
        port: u16,
        /// Path and query to request, e.g. `/get?testca=1`.
        path: &'static str,
    },
    /// A raw TCP case: the service address is passed via `FN_TCP_HOST` and `FN_TCP_PORT`.
    Tcp {
        /// Port the test service listens on.
        port: u16,
    },
}

impl EnvSpec {
    /// Builds the environment for one execution against the given serial port and service
    /// host.
    pub fn build(&self, serial_port: &str, host: &str) -> Vec<(&'static str, String)> {
        let mut env = vec![("FN_PORT", serial_port.to_owned())];
        match self {
            EnvSpec::Serial => {}
            EnvSpec::Url { scheme, port, path } => {
                env.push(("FN_TEST_URL", format!("{scheme}://{host}:{port}{path}")));
            }
            EnvSpec::Tcp { port } => {
                env.push(("FN_TCP_HOST", host.to_owned()));
                env.push(("FN_TCP_PORT", port.to_string()));
            }
        }
        env
    }
}

/// A single test case: one run of an example binary with expectations on its output.
#[derive(Clone, Debug)]
pub struct TestCase {
    /// Display name of the case, e.g. `TCP Stream`.
    pub name: &'static str,
    /// Name of the example binary to run.
    pub binary: &'static str,
    /// Environment the binary runs with.
    pub env: EnvSpec,
    /// Substrings that must all appear in the captured output for the case to pass.
    pub expected: &'static [&'static str],
    /// Hard wall-clock bound on the execution.
    pub timeout: Duration,
}

impl TestCase {
    /// Checks captured output and an exit code against this case's expectations.
    ///
    /// Returns whether the case passed, along with the output augmented with a diagnostic
    /// marker for every missing substring (in declaration order) and for a nonzero exit code.
    /// All failed expectations are reported, not just the first.
    pub fn check_output(&self, exit_code: i32, mut output: String) -> (bool, String) {
        let mut passed = true;
        for expected in self.expected {
            if !output.contains(expected) {
                passed = false;
                swrite!(output, "\n[MISSING EXPECTED: {expected}]");
            }
        }
        if exit_code != 0 {
            passed = false;
            swrite!(output, "\n[EXIT CODE: {exit_code}]");
        }
        (passed, output)
    }
}

static TEST_CASES: &[TestCase] = &[
    TestCase {
        name: "Clock",
        binary: "clock_test",
        env: EnvSpec::Serial,
        expected: &["FujiNet-NIO Clock", "Current time:"],
        timeout: Duration::from_secs(10),
    },
    TestCase {
        name: "HTTP",
        binary: "http_get",
        env: EnvSpec::Url {
            scheme: "http",
            port: 8080,
            path: "/get",
        },
        expected: &["HTTP GET", "bytes read"],
        timeout: Duration::from_secs(15),
    },
    TestCase {
        name: "HTTPS",
        binary: "http_get",
        env: EnvSpec::Url {
            scheme: "https",
            port: 8443,
            path: "/get?testca=1",
        },
        expected: &["HTTP GET", "bytes read"],
        timeout: Duration::from_secs(15),
    },
    TestCase {
        name: "TCP",
        binary: "tcp_get",
        env: EnvSpec::Tcp { port: 7777 },
        expected: &["TCP", "Connection established", "Hello"],
        timeout: Duration::from_secs(15),
    },
    TestCase {
        name: "TLS",
        binary: "tcp_get",
        env: EnvSpec::Url {
            scheme: "tls",
            port: 7778,
            path: "?testca=1",
        },
        expected: &["Connection established", "Hello"],
        timeout: Duration::from_secs(15),
    },
    TestCase {
        name: "TCP Stream",
        binary: "tcp_stream",
        env: EnvSpec::Tcp { port: 7777 },
        expected: &["TCP Streaming", "Connected", "Statistics"],
        timeout: Duration::from_secs(15),
    },
];

/// Returns the cases the suite runs, in execution order.
pub fn test_cases() -> &'static [TestCase] {
    TEST_CASES
}

/// Locates example binaries within a project checkout.
#[derive(Clone, Debug)]
pub struct TestList {
    project_root: Utf8PathBuf,
    examples_dir: Utf8PathBuf,
}

impl TestList {
    /// Creates a new test list rooted at a project checkout.
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        let project_root = project_root.into();
        let examples_dir = project_root.join("examples");
        Self {
            project_root,
            examples_dir,
        }
    }

    /// Returns the root of the project checkout.
    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    /// Returns the directory containing the example programs and their Makefile.
    pub fn examples_dir(&self) -> &Utf8Path {
        &self.examples_dir
    }

    /// Returns the path an example binary is built at for the given build target.
    pub fn binary_path(&self, build_target: &str, binary: &str) -> Utf8PathBuf {
        self.examples_dir.join("bin").join(build_target).join(binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registry_is_in_execution_order() {
        let names: Vec<_> = test_cases().iter().map(|case| case.name).collect();
        assert_eq!(names, ["Clock", "HTTP", "HTTPS", "TCP", "TLS", "TCP Stream"]);

        let binaries: Vec<_> = test_cases().iter().map(|case| case.binary).collect();
        assert_eq!(
            binaries,
            ["clock_test", "http_get", "http_get", "tcp_get", "tcp_get", "tcp_stream"]
        );

        let timeouts: Vec<_> = test_cases()
            .iter()
            .map(|case| case.timeout.as_secs())
            .collect();
        assert_eq!(timeouts, [10, 15, 15, 15, 15, 15]);
    }

    #[test]
    fn env_always_carries_the_serial_port() {
        for case in test_cases() {
            let env = case.env.build("/dev/pts/9", "192.168.1.7");
            assert_eq!(
                env[0],
                ("FN_PORT", "/dev/pts/9".to_owned()),
                "first env pair for {} is the serial port",
                case.name
            );
        }
    }

    #[test]
    fn env_urls_point_at_the_service_host() {
        let url = |name: &str| {
            let case = test_cases()
                .iter()
                .find(|case| case.name == name)
                .unwrap_or_else(|| panic!("case {name} exists"));
            let env = case.env.build("/dev/pts/9", "192.168.1.7");
            env.iter()
                .find(|(k, _)| *k == "FN_TEST_URL")
                .unwrap_or_else(|| panic!("case {name} sets FN_TEST_URL"))
                .1
                .clone()
        };

        assert_eq!(url("HTTP"), "http://192.168.1.7:8080/get");
        assert_eq!(url("HTTPS"), "https://192.168.1.7:8443/get?testca=1");
        assert_eq!(url("TLS"), "tls://192.168.1.7:7778?testca=1");
    }

    #[test]
    fn env_tcp_cases_use_host_and_port_pairs() {
        let env = EnvSpec::Tcp { port: 7777 }.build("/dev/pts/9", "192.168.1.7");
        assert_eq!(
            env,
            [
                ("FN_PORT", "/dev/pts/9".to_owned()),
                ("FN_TCP_HOST", "192.168.1.7".to_owned()),
                ("FN_TCP_PORT", "7777".to_owned()),
            ]
        );
    }

    #[test]
    fn check_output_passes_clean_runs() {
        let case = http_case();
        let output = "HTTP GET http://h:8080/get\n200 OK, 512 bytes read\n".to_owned();
        let (passed, augmented) = case.check_output(0, output.clone());
        assert!(passed, "all expectations present and exit code 0");
        assert_eq!(augmented, output, "passing output is left untouched");
    }

    #[test]
    fn check_output_reports_every_missing_substring() {
        let case = TestCase {
            name: "TLS",
            binary: "tcp_get",
            env: EnvSpec::Serial,
            expected: &["Connection established", "Hello"],
            timeout: Duration::from_secs(15),
        };
        let (passed, augmented) = case.check_output(0, "Connecting...\n".to_owned());
        assert!(!passed);
        assert_eq!(
            augmented,
            "Connecting...\n\
             \n[MISSING EXPECTED: Connection established]\
             \n[MISSING EXPECTED: Hello]"
        );
    }

    #[test]
    fn check_output_requires_a_zero_exit_code() {
        let case = http_case();
        let (passed, augmented) =
            case.check_output(3, "HTTP GET done, 512 bytes read\n".to_owned());
        assert!(!passed, "nonzero exit code fails even with all substrings present");
        assert_eq!(augmented, "HTTP GET done, 512 bytes read\n\n[EXIT CODE: 3]");
    }

    #[test]
    fn check_output_appends_exit_marker_after_missing_markers() {
        let case = http_case();
        let (passed, augmented) = case.check_output(-1, "TIMEOUT".to_owned());
        assert!(!passed);
        assert_eq!(
            augmented,
            "TIMEOUT\
             \n[MISSING EXPECTED: HTTP GET]\
             \n[MISSING EXPECTED: bytes read]\
             \n[EXIT CODE: -1]"
        );
    }

    #[test]
    fn binary_paths_follow_the_examples_layout() {
        let test_list = TestList::new("/work/fujinet-nio");
        assert_eq!(test_list.project_root(), "/work/fujinet-nio");
        assert_eq!(test_list.examples_dir(), "/work/fujinet-nio/examples");
        assert_eq!(
            test_list.binary_path("linux", "clock_test"),
            "/work/fujinet-nio/examples/bin/linux/clock_test"
        );
    }

    fn http_case() -> TestCase {
        TestCase {
            name: "HTTP",
            binary: "http_get",
            env: EnvSpec::Url {
                scheme: "http",
                port: 8080,
                path: "/get",
            },
            expected: &["HTTP GET", "bytes read"],
            timeout: Duration::from_secs(15),
        }
    }
}
