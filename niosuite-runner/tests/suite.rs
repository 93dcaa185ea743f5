// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs against a fake project checkout.
//!
//! These tests stand up a temporary project directory with shell scripts in place of the
//! example binaries, then drive a real [`SuiteRunner`] over it. The `MAKE` override turns the
//! build phase into a no-op so no real toolchain is needed.

#![cfg(unix)]

use camino_tempfile::{Utf8TempDir, tempdir};
use indoc::indoc;
use niosuite_runner::{
    config::{RunTarget, SuiteConfig},
    list::TestList,
    reporter::TestEvent,
    runner::{RunStats, SuiteRunner},
};
use std::{fs, os::unix::fs::PermissionsExt, sync::Once, time::Duration};

#[test]
fn posix_run_passes_end_to_end() {
    init_make();
    let project = fake_project();

    let config = SuiteConfig::new(vec![RunTarget::posix("/dev/pts/77")]);
    let test_list = TestList::new(project.path().to_owned());
    let runner = SuiteRunner::new(&config, &test_list).expect("config names a target");

    let mut outcomes = Vec::new();
    let stats = runner.execute(|event| {
        if let TestEvent::TestFinished { outcome } = event {
            outcomes.push(outcome);
        }
    });

    assert_eq!(
        stats,
        RunStats {
            initial_run_count: 6,
            finished_count: 6,
            passed: 6,
            ..RunStats::default()
        }
    );
    assert!(stats.is_success());

    let names: Vec<_> = outcomes.iter().map(|outcome| outcome.name).collect();
    assert_eq!(names, ["Clock", "HTTP", "HTTPS", "TCP", "TLS", "TCP Stream"]);
    for outcome in &outcomes {
        assert!(outcome.passed, "{} passed: {}", outcome.name, outcome.output);
        assert_eq!(outcome.target, "linux");
    }

    // The environment flows through to the binaries.
    assert!(
        outcomes[0].output.contains("Current time: /dev/pts/77"),
        "clock_test saw FN_PORT: {}",
        outcomes[0].output
    );
    assert!(
        outcomes[1]
            .output
            .contains("HTTP GET http://127.0.0.1:8080/get"),
        "http_get saw FN_TEST_URL: {}",
        outcomes[1].output
    );
}

#[test]
fn events_follow_the_build_then_test_sequence() {
    init_make();
    let project = fake_project();

    let config = SuiteConfig::new(vec![RunTarget::posix("/dev/pts/77")]);
    let test_list = TestList::new(project.path().to_owned());
    let runner = SuiteRunner::new(&config, &test_list).expect("config names a target");

    let mut tags = Vec::new();
    runner.execute(|event| {
        tags.push(match event {
            TestEvent::RunStarted { .. } => "run-started",
            TestEvent::BuildStarted { .. } => "build-started",
            TestEvent::BuildStepStarted { .. } => "step-started",
            TestEvent::BuildStepFinished { .. } => "step-finished",
            TestEvent::BuildStepFailed { .. } => "step-failed",
            TestEvent::BuildFailed { .. } => "build-failed",
            TestEvent::TargetStarted { .. } => "target-started",
            TestEvent::TestStarted { .. } => "test-started",
            TestEvent::TestFinished { .. } => "test-finished",
            TestEvent::RunFinished { .. } => "run-finished",
        });
    });

    let mut expected = vec![
        "run-started",
        "build-started",
        "step-started",
        "step-finished",
        "step-started",
        "step-finished",
        "target-started",
    ];
    for _ in 0..6 {
        expected.extend(["test-started", "test-finished"]);
    }
    expected.push("run-finished");
    assert_eq!(tags, expected);
}

#[test]
fn esp32_outcomes_keep_their_own_label() {
    init_make();
    let project = fake_project();

    let config = SuiteConfig::new(vec![
        RunTarget::posix("/dev/pts/77"),
        RunTarget::esp32("/dev/ttyUSB9", "192.168.4.20"),
    ]);
    let test_list = TestList::new(project.path().to_owned());
    let runner = SuiteRunner::new(&config, &test_list).expect("config names targets");

    let mut outcomes = Vec::new();
    let stats = runner.execute(|event| {
        if let TestEvent::TestFinished { outcome } = event {
            outcomes.push(outcome);
        }
    });

    assert_eq!(stats.finished_count, 12);
    assert_eq!(stats.passed, 12);
    assert!(stats.is_success());

    let labels: Vec<_> = outcomes.iter().map(|outcome| outcome.target).collect();
    assert_eq!(&labels[..6], &["linux"; 6]);
    assert_eq!(&labels[6..], &["esp32"; 6]);

    // Each target routes URL cases at its own services host.
    assert!(
        outcomes[1].output.contains("http://127.0.0.1:8080/get"),
        "POSIX reaches services on localhost: {}",
        outcomes[1].output
    );
    assert!(
        outcomes[7].output.contains("http://192.168.4.20:8080/get"),
        "ESP32 reaches services at the configured host: {}",
        outcomes[7].output
    );
}

#[test]
fn repeated_runs_yield_identical_outcomes() {
    init_make();
    let project = fake_project();

    let config = SuiteConfig::new(vec![RunTarget::posix("/dev/pts/77")]);
    let test_list = TestList::new(project.path().to_owned());
    let runner = SuiteRunner::new(&config, &test_list).expect("config names a target");

    let run_once = || {
        let mut outcomes = Vec::new();
        let stats = runner.execute(|event| {
            if let TestEvent::TestFinished { outcome } = event {
                outcomes.push((outcome.name, outcome.target, outcome.passed));
            }
        });
        (stats, outcomes)
    };

    let (first_stats, first) = run_once();
    let (second_stats, second) = run_once();

    assert_eq!(first.len(), 6);
    assert_eq!(
        first, second,
        "a rerun over an unchanged checkout reports the same outcomes"
    );
    assert_eq!(first_stats, second_stats);
    assert!(second_stats.is_success());
}

#[test]
fn spawn_failures_surface_the_error_description() {
    init_make();
    let project = fake_project();
    // Strip the execute bit from one binary so spawning it fails while the file still exists.
    let clock_test = project.path().join("examples/bin/linux/clock_test");
    fs::set_permissions(&clock_test, fs::Permissions::from_mode(0o644))
        .expect("marking clock_test non-executable");

    let config = SuiteConfig::new(vec![RunTarget::posix("/dev/pts/77")]);
    let test_list = TestList::new(project.path().to_owned());
    let runner = SuiteRunner::new(&config, &test_list).expect("config names a target");

    let mut outcomes = Vec::new();
    let stats = runner.execute(|event| {
        if let TestEvent::TestFinished { outcome } = event {
            outcomes.push(outcome);
        }
    });

    // One unrunnable binary fails its own case and nothing else.
    assert_eq!(stats.finished_count, 6);
    assert_eq!(stats.passed, 5);
    assert_eq!(stats.failed, 1);

    let clock = &outcomes[0];
    assert_eq!(clock.name, "Clock");
    assert!(!clock.passed);
    assert!(
        clock.output.starts_with("Permission denied"),
        "the output leads with the OS error description: {}",
        clock.output
    );
    assert!(
        clock.output.contains("[EXIT CODE: -1]"),
        "a failed spawn reports exit code -1: {}",
        clock.output
    );
}

#[test]
fn missing_binaries_fail_without_running() {
    init_make();
    let project = tempdir().expect("creating temp project dir");

    let config = SuiteConfig::new(vec![RunTarget::posix("/dev/pts/77")]);
    let test_list = TestList::new(project.path().to_owned());
    let runner = SuiteRunner::new(&config, &test_list).expect("config names a target");

    let mut outcomes = Vec::new();
    let stats = runner.execute(|event| {
        if let TestEvent::TestFinished { outcome } = event {
            outcomes.push(outcome);
        }
    });

    assert_eq!(stats.finished_count, 6);
    assert_eq!(stats.failed, 6);
    assert!(!stats.is_success());

    for outcome in &outcomes {
        assert!(!outcome.passed);
        assert!(
            outcome.output.starts_with("Binary not found: "),
            "unexpected output: {}",
            outcome.output
        );
        assert_eq!(outcome.duration, Duration::ZERO);
    }
}

#[test]
fn callback_errors_stop_the_run() {
    init_make();
    let project = fake_project();

    let config = SuiteConfig::new(vec![RunTarget::posix("/dev/pts/77")]);
    let test_list = TestList::new(project.path().to_owned());
    let runner = SuiteRunner::new(&config, &test_list).expect("config names a target");

    let mut seen = 0;
    let result: Result<RunStats, &str> = runner.try_execute(|event| {
        seen += 1;
        if matches!(event, TestEvent::TestStarted { .. }) {
            Err("stop here")
        } else {
            Ok(())
        }
    });

    assert_eq!(result, Err("stop here"));
    // RunStarted, BuildStarted, two started/finished step pairs, TargetStarted, and the first
    // TestStarted.
    assert_eq!(seen, 8);
}

/// Points `MAKE` at `true` so build steps always succeed without a real toolchain.
///
/// Synchronized so the write happens before any test thread reads the variable.
fn init_make() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // SAFETY: every reader of MAKE in this binary calls init_make first, so no read can
        // race this write.
        unsafe { std::env::set_var("MAKE", "true") };
    });
}

/// Creates a project checkout whose example binaries are shell scripts that print the output
/// the test cases expect, echoing their environment along the way.
fn fake_project() -> Utf8TempDir {
    let dir = tempdir().expect("creating temp project dir");
    let bin_dir = dir.path().join("examples/bin/linux");
    fs::create_dir_all(&bin_dir).expect("creating example bin dir");

    let scripts = [
        (
            "clock_test",
            indoc! {r#"
                #!/bin/sh
                echo "FujiNet-NIO Clock"
                echo "Current time: $FN_PORT"
            "#},
        ),
        (
            "http_get",
            indoc! {r#"
                #!/bin/sh
                echo "HTTP GET $FN_TEST_URL"
                echo "200 OK, 512 bytes read"
            "#},
        ),
        (
            "tcp_get",
            indoc! {r#"
                #!/bin/sh
                echo "TCP client -> $FN_TCP_HOST:$FN_TCP_PORT"
                echo "Connection established"
                echo "Hello from service"
            "#},
        ),
        (
            "tcp_stream",
            indoc! {r#"
                #!/bin/sh
                echo "TCP Streaming benchmark"
                echo "Connected to $FN_TCP_HOST:$FN_TCP_PORT"
                echo "Statistics: 1024 bytes in 10ms"
            "#},
        ),
    ];

    for (binary, script) in scripts {
        let path = bin_dir.join(binary);
        fs::write(&path, script).expect("writing fake example binary");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("marking fake example binary executable");
    }

    dir
}
