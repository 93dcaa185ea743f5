// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The suite runner.
//!
//! The main structure in this module is [`SuiteRunner`]. For each configured target it drives
//! the build phase (the library, then the examples that link against it) and, if that succeeds,
//! runs every case in the test registry sequentially. Progress is surfaced as [`TestEvent`]
//! values through a callback.

use crate::{
    command::run_command,
    config::{RunTarget, SuiteConfig},
    errors::SuiteRunnerBuildError,
    list::{TestCase, TestList, test_cases},
    reporter::TestEvent,
};
use camino::Utf8PathBuf;
use std::{convert::Infallible, marker::PhantomData, path::PathBuf, time::Duration};
use tokio::runtime::Runtime;
use tracing::debug;

/// Runs the suite against the configured targets.
///
/// Created using [`SuiteRunner::new`].
#[derive(Debug)]
pub struct SuiteRunner<'a> {
    inner: SuiteRunnerInner<'a>,
}

impl<'a> SuiteRunner<'a> {
    /// Creates a new suite runner.
    ///
    /// Returns an error if the configuration names no targets.
    pub fn new(
        config: &'a SuiteConfig,
        test_list: &'a TestList,
    ) -> Result<Self, SuiteRunnerBuildError> {
        if config.targets().is_empty() {
            return Err(SuiteRunnerBuildError::NoTargetsConfigured);
        }
        let runtime = Runtime::new().map_err(SuiteRunnerBuildError::TokioRuntimeCreate)?;

        Ok(Self {
            inner: SuiteRunnerInner {
                config,
                test_list,
                runtime,
            },
        })
    }

    /// Builds and runs the suite for every configured target.
    ///
    /// The callback is called with an event for every state change.
    pub fn execute<F>(&self, mut callback: F) -> RunStats
    where
        F: FnMut(TestEvent<'a>),
    {
        self.try_execute::<Infallible, _>(|event| {
            callback(event);
            Ok(())
        })
        .expect("Err branch is infallible")
    }

    /// Builds and runs the suite for every configured target.
    ///
    /// Accepts a callback that is called with an event for every state change. If the callback
    /// returns an error, the run terminates and the callback is no longer called.
    pub fn try_execute<E, F>(&self, callback: F) -> Result<RunStats, E>
    where
        F: FnMut(TestEvent<'a>) -> Result<(), E>,
    {
        self.inner.try_execute(callback)
    }
}

#[derive(Debug)]
struct SuiteRunnerInner<'a> {
    config: &'a SuiteConfig,
    test_list: &'a TestList,
    runtime: Runtime,
}

impl<'a> SuiteRunnerInner<'a> {
    fn try_execute<E, F>(&self, callback: F) -> Result<RunStats, E>
    where
        F: FnMut(TestEvent<'a>) -> Result<(), E>,
    {
        let mut ctx = CallbackContext::new(callback, self.config.test_count());

        ctx.run_started(self.config)?;

        for target in self.config.targets() {
            if !self.build_target(target, &mut ctx)? {
                ctx.build_failed(target)?;
                continue;
            }

            ctx.target_started(target)?;
            for case in test_cases() {
                ctx.test_started(case.name, target)?;
                let outcome = self.runtime.block_on(self.run_case(case, target));
                ctx.test_finished(outcome)?;
            }
        }

        ctx.run_finished()?;
        Ok(ctx.run_stats)
    }

    /// Runs both build steps for a target, in order. Returns false if a step failed, in which
    /// case the remaining steps were not attempted.
    fn build_target<E, F>(
        &self,
        target: &'a RunTarget,
        ctx: &mut CallbackContext<F, E>,
    ) -> Result<bool, E>
    where
        F: FnMut(TestEvent<'a>) -> Result<(), E>,
    {
        ctx.build_started(target)?;

        for step in [BuildStep::Library, BuildStep::Examples] {
            ctx.build_step_started(target, step)?;

            let command = step.make_command(self.test_list, target);
            let args: Vec<&str> = command.iter().map(String::as_str).collect();
            let output = self.runtime.block_on(run_command(&args, &[], step.timeout()));

            if output.exit_code != 0 {
                debug!(
                    "{} build for {} failed with exit code {}",
                    step.description(),
                    target.build_target(),
                    output.exit_code,
                );
                ctx.build_step_failed(target, step, output.output)?;
                return Ok(false);
            }
            ctx.build_step_finished(target, step)?;
        }

        Ok(true)
    }

    async fn run_case(&self, case: &'static TestCase, target: &'a RunTarget) -> TestOutcome {
        let binary = self
            .test_list
            .binary_path(target.build_target(), case.binary);
        if !binary.exists() {
            debug!("example binary missing at {binary}");
            return TestOutcome {
                name: case.name,
                target: target.label(),
                passed: false,
                output: format!("Binary not found: {binary}"),
                duration: Duration::ZERO,
            };
        }

        let env = case.env.build(target.port(), target.host());
        let command = [binary.as_str()];
        let cmd_output = run_command(&command, &env, case.timeout).await;
        let (passed, output) = case.check_output(cmd_output.exit_code, cmd_output.output);

        TestOutcome {
            name: case.name,
            target: target.label(),
            passed,
            output,
            duration: cmd_output.duration,
        }
    }
}

/// A step of the two-step build for a target.
///
/// The library must be built before the examples that link against it, so the steps are
/// strictly ordered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildStep {
    /// Builds the library: `make <target>` at the project root.
    Library,
    /// Builds the example binaries: `make TARGET=<target>` in the examples directory.
    Examples,
}

impl BuildStep {
    /// Returns the 1-based position of this step, for `[1/2]`-style progress output.
    pub fn number(self) -> usize {
        match self {
            BuildStep::Library => 1,
            BuildStep::Examples => 2,
        }
    }

    /// Returns what this step builds, lowercase.
    pub fn description(self) -> &'static str {
        match self {
            BuildStep::Library => "library",
            BuildStep::Examples => "examples",
        }
    }

    /// Returns what this step builds, capitalized.
    pub fn title(self) -> &'static str {
        match self {
            BuildStep::Library => "Library",
            BuildStep::Examples => "Examples",
        }
    }

    fn timeout(self) -> Duration {
        match self {
            // A full library build takes much longer than linking the examples against it.
            BuildStep::Library => Duration::from_secs(120),
            BuildStep::Examples => Duration::from_secs(60),
        }
    }

    fn make_command(self, test_list: &TestList, target: &RunTarget) -> Vec<String> {
        let make = make_path().into_string();
        match self {
            BuildStep::Library => vec![
                make,
                target.build_target().to_owned(),
                "-C".to_owned(),
                test_list.project_root().to_string(),
            ],
            BuildStep::Examples => vec![
                make,
                format!("TARGET={}", target.build_target()),
                "-C".to_owned(),
                test_list.examples_dir().to_string(),
            ],
        }
    }
}

/// Path to the `make` executable: the `MAKE` environment variable if set, `make` on PATH
/// otherwise.
fn make_path() -> Utf8PathBuf {
    match std::env::var_os("MAKE") {
        Some(make_path) => PathBuf::from(make_path)
            .try_into()
            .expect("MAKE env var is not valid UTF-8"),
        None => Utf8PathBuf::from("make"),
    }
}

/// The outcome of running one test case against one target.
#[derive(Clone, Debug)]
pub struct TestOutcome {
    /// Name of the test case.
    pub name: &'static str,

    /// Label of the target the case ran against.
    ///
    /// This is the target's logical label, not the build target of the binary that ran: ESP32
    /// outcomes are recorded under `esp32` even though host-side builds produced them.
    pub target: &'static str,

    /// Whether the case passed: exit code 0 and every expected substring present.
    pub passed: bool,

    /// Captured output, augmented with markers for any failed expectations.
    pub output: String,

    /// Wall-clock duration of the execution. Zero if the binary was missing.
    pub duration: Duration,
}

/// Statistics for a suite run.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The total number of tests that were expected to run at the beginning.
    ///
    /// If a build fails, this will be greater than `finished_count` at the end of the run.
    pub initial_run_count: usize,

    /// The total number of tests that finished running.
    pub finished_count: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The number of targets whose build failed.
    pub build_failed: usize,
}

impl RunStats {
    /// Returns true if this run is considered a success.
    ///
    /// A run is marked as failed if any of the following are true:
    /// * any tests failed
    /// * any builds failed
    /// * not every planned test finished (a failed build skips its target's tests)
    pub fn is_success(&self) -> bool {
        if self.initial_run_count > self.finished_count {
            return false;
        }
        if self.any_failed() {
            return false;
        }
        true
    }

    /// Returns true if any tests or builds failed.
    pub fn any_failed(&self) -> bool {
        self.failed > 0 || self.build_failed > 0
    }

    fn on_test_finished(&mut self, outcome: &TestOutcome) {
        self.finished_count += 1;
        if outcome.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

struct CallbackContext<F, E> {
    callback: F,
    run_stats: RunStats,
    phantom: PhantomData<E>,
}

impl<'a, F, E> CallbackContext<F, E>
where
    F: FnMut(TestEvent<'a>) -> Result<(), E>,
{
    fn new(callback: F, initial_run_count: usize) -> Self {
        Self {
            callback,
            run_stats: RunStats {
                initial_run_count,
                ..RunStats::default()
            },
            phantom: PhantomData,
        }
    }

    fn run_started(&mut self, config: &'a SuiteConfig) -> Result<(), E> {
        (self.callback)(TestEvent::RunStarted { config })
    }

    fn build_started(&mut self, target: &'a RunTarget) -> Result<(), E> {
        (self.callback)(TestEvent::BuildStarted { target })
    }

    fn build_step_started(&mut self, target: &'a RunTarget, step: BuildStep) -> Result<(), E> {
        (self.callback)(TestEvent::BuildStepStarted { target, step })
    }

    fn build_step_finished(&mut self, target: &'a RunTarget, step: BuildStep) -> Result<(), E> {
        (self.callback)(TestEvent::BuildStepFinished { target, step })
    }

    fn build_step_failed(
        &mut self,
        target: &'a RunTarget,
        step: BuildStep,
        output: String,
    ) -> Result<(), E> {
        (self.callback)(TestEvent::BuildStepFailed {
            target,
            step,
            output,
        })
    }

    fn build_failed(&mut self, target: &'a RunTarget) -> Result<(), E> {
        self.run_stats.build_failed += 1;
        (self.callback)(TestEvent::BuildFailed { target })
    }

    fn target_started(&mut self, target: &'a RunTarget) -> Result<(), E> {
        (self.callback)(TestEvent::TargetStarted { target })
    }

    fn test_started(&mut self, name: &'static str, target: &'a RunTarget) -> Result<(), E> {
        (self.callback)(TestEvent::TestStarted { name, target })
    }

    fn test_finished(&mut self, outcome: TestOutcome) -> Result<(), E> {
        self.run_stats.on_test_finished(&outcome);
        (self.callback)(TestEvent::TestFinished { outcome })
    }

    fn run_finished(&mut self) -> Result<(), E> {
        (self.callback)(TestEvent::RunFinished {
            run_stats: self.run_stats,
        })
    }
}
