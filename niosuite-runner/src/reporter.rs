// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints out and aggregates suite execution results.
//!
//! The main structure in this module is [`SuiteReporter`]. It renders the event stream produced
//! by a [`SuiteRunner`](crate::runner::SuiteRunner): build and target banners, a progress line
//! per test, and a final summary grouped by target.

use crate::{
    config::{RunTarget, SuiteConfig},
    errors::WriteEventError,
    helpers::{plural, truncate_chars},
    runner::{BuildStep, RunStats, TestOutcome},
};
use debug_ignore::DebugIgnore;
use owo_colors::{OwoColorize, Style};
use std::{
    collections::BTreeSet,
    io::{self, Write},
    time::Duration,
};

/// Separator line used by phase banners and the final summary.
const BANNER: &str = "============================================================";

/// Failing output is cut off after this many characters when displayed.
const FAIL_OUTPUT_CHAR_LIMIT: usize = 500;

/// Suite reporter builder.
#[derive(Debug, Default)]
pub struct SuiteReporterBuilder {
    verbose: bool,
}

impl SuiteReporterBuilder {
    /// Sets verbose output.
    ///
    /// In this mode, failing output is shown inline as tests finish, and the full output of a
    /// failed build command is shown after the failure notice.
    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.verbose = verbose;
        self
    }

    /// Creates a new suite reporter.
    pub fn build(&self) -> SuiteReporter {
        SuiteReporter {
            verbose: self.verbose,
            styles: Box::new(Styles::default()),
            outcomes: DebugIgnore(vec![]),
        }
    }
}

/// Functionality to report suite results to a writer.
#[derive(Debug)]
pub struct SuiteReporter {
    verbose: bool,
    styles: Box<Styles>,

    // Every finished outcome, in finish order. Replayed grouped by target once the run is done.
    outcomes: DebugIgnore<Vec<TestOutcome>>,
}

impl SuiteReporter {
    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Report a suite event.
    pub fn report_event(
        &mut self,
        event: TestEvent<'_>,
        writer: impl Write,
    ) -> Result<(), WriteEventError> {
        self.write_event_impl(&event, writer)
            .map_err(WriteEventError::Io)
    }

    fn write_event_impl(
        &mut self,
        event: &TestEvent<'_>,
        mut writer: impl Write,
    ) -> io::Result<()> {
        match event {
            TestEvent::RunStarted { config } => {
                write!(writer, "{:>12} ", "Starting".style(self.styles.pass))?;

                let count_style = self.styles.count;
                let test_count = config.test_count();
                let target_count = config.targets().len();

                writeln!(
                    writer,
                    "{} {} across {} {}",
                    test_count.style(count_style),
                    plural::tests_str(test_count),
                    target_count.style(count_style),
                    plural::targets_str(target_count),
                )?;
            }
            TestEvent::BuildStarted { target } => {
                writeln!(writer, "\n{BANNER}")?;
                writeln!(writer, "Building for {}", target.build_target().to_uppercase())?;
                writeln!(writer, "{BANNER}")?;
            }
            TestEvent::BuildStepStarted { target, step } => {
                writeln!(
                    writer,
                    "\n[{}/2] Building {} for {}...",
                    step.number(),
                    step.description(),
                    target.build_target(),
                )?;
            }
            TestEvent::BuildStepFinished { target: _target, step } => {
                writeln!(
                    writer,
                    "  {} {} built",
                    "✓".style(self.styles.pass),
                    step.title(),
                )?;
            }
            TestEvent::BuildStepFailed { target, step, output } => {
                writeln!(
                    writer,
                    "{}: {} build failed for {}",
                    "FAILED".style(self.styles.fail),
                    step.title(),
                    target.build_target(),
                )?;
                if self.verbose {
                    writeln!(writer, "{output}")?;
                }
            }
            TestEvent::BuildFailed { target } => {
                writeln!(
                    writer,
                    "\n{} {} build failed, skipping tests",
                    "✗".style(self.styles.fail),
                    target.name(),
                )?;
            }
            TestEvent::TargetStarted { target } => {
                writeln!(writer, "\n{BANNER}")?;
                writeln!(writer, "Running tests for {}", target.build_target().to_uppercase())?;
                writeln!(writer, "  Port: {}", target.port())?;
                writeln!(writer, "  Host IP: {}", target.host())?;
                writeln!(writer, "{BANNER}")?;
            }
            TestEvent::TestStarted { name, target: _target } => {
                // No trailing newline: the outcome is appended to this line once the test
                // finishes. The caller is expected to flush after every event.
                write!(writer, "\n  [{name}] ")?;
            }
            TestEvent::TestFinished { outcome } => {
                let status = if outcome.passed {
                    "✓ PASSED".style(self.styles.pass)
                } else {
                    "✗ FAILED".style(self.styles.fail)
                };
                write!(writer, "{status} ")?;
                self.write_duration(outcome.duration, &mut writer)?;
                writeln!(writer)?;

                if !outcome.passed && self.verbose {
                    writeln!(
                        writer,
                        "    Output: {}",
                        truncate_chars(&outcome.output, FAIL_OUTPUT_CHAR_LIMIT),
                    )?;
                }

                self.outcomes.push(outcome.clone());
            }
            TestEvent::RunFinished { run_stats } => {
                writeln!(writer, "\n{BANNER}")?;
                writeln!(writer, "TEST SUMMARY")?;
                writeln!(writer, "{BANNER}")?;

                let targets: BTreeSet<&str> =
                    self.outcomes.iter().map(|outcome| outcome.target).collect();

                let mut total_passed = 0;
                let mut total_failed = 0;

                for target in targets {
                    let mut passed = 0;
                    let mut failed = 0;

                    writeln!(writer, "\n{}:", target.to_uppercase())?;
                    for outcome in self.outcomes.iter().filter(|o| o.target == target) {
                        let marker = if outcome.passed {
                            passed += 1;
                            "✓".style(self.styles.pass)
                        } else {
                            failed += 1;
                            "✗".style(self.styles.fail)
                        };
                        write!(writer, "  {marker} {} ", outcome.name)?;
                        self.write_duration(outcome.duration, &mut writer)?;
                        writeln!(writer)?;
                    }
                    writeln!(
                        writer,
                        "  Total: {} passed, {} failed",
                        passed.style(self.styles.count),
                        failed.style(self.styles.count),
                    )?;

                    total_passed += passed;
                    total_failed += failed;
                }

                let overall_style = if run_stats.any_failed() {
                    self.styles.fail
                } else {
                    self.styles.pass
                };

                writeln!(writer, "\n{BANNER}")?;
                writeln!(
                    writer,
                    "{} {} passed, {} failed",
                    "OVERALL:".style(overall_style),
                    total_passed.style(self.styles.count),
                    total_failed.style(self.styles.count),
                )?;
                writeln!(writer, "{BANNER}")?;

                if total_failed > 0 {
                    writeln!(writer, "\n{}", "Failed tests:".style(self.styles.fail))?;
                    for outcome in self.outcomes.iter().filter(|outcome| !outcome.passed) {
                        writeln!(writer, "\n[{}] {}:", outcome.target, outcome.name)?;
                        writeln!(
                            writer,
                            "  {}",
                            truncate_chars(&outcome.output, FAIL_OUTPUT_CHAR_LIMIT),
                        )?;
                    }
                }
            }
        }

        Ok(())
    }

    fn write_duration(&self, duration: Duration, mut writer: impl Write) -> io::Result<()> {
        // * .0 means print no digits after the decimal point, i.e. whole milliseconds.
        write!(writer, "({:.0}ms)", duration.as_secs_f64() * 1000.0)
    }
}

/// A suite event.
///
/// Events are produced by a [`SuiteRunner`](crate::runner::SuiteRunner) and consumed by a
/// [`SuiteReporter`].
#[derive(Clone, Debug)]
pub enum TestEvent<'a> {
    /// The suite run started.
    RunStarted {
        /// The configuration for the run, describing the targets about to be exercised.
        config: &'a SuiteConfig,
    },

    /// The build phase for a target started.
    BuildStarted {
        /// The target being built.
        target: &'a RunTarget,
    },

    /// A build step started running.
    BuildStepStarted {
        /// The target being built.
        target: &'a RunTarget,
        /// The step that started.
        step: BuildStep,
    },

    /// A build step finished successfully.
    BuildStepFinished {
        /// The target being built.
        target: &'a RunTarget,
        /// The step that finished.
        step: BuildStep,
    },

    /// A build step exited nonzero or could not run. Later steps are not attempted.
    BuildStepFailed {
        /// The target being built.
        target: &'a RunTarget,
        /// The step that failed.
        step: BuildStep,
        /// Captured output of the failed build command.
        output: String,
    },

    /// The build phase for a target failed. The target's tests are skipped.
    BuildFailed {
        /// The target whose build failed.
        target: &'a RunTarget,
    },

    /// The test phase for a target started.
    TargetStarted {
        /// The target tests are about to run against.
        target: &'a RunTarget,
    },

    /// A test case started running.
    TestStarted {
        /// Name of the test case.
        name: &'static str,
        /// The target the test is running against.
        target: &'a RunTarget,
    },

    /// A test case finished running.
    TestFinished {
        /// The outcome of the execution.
        outcome: TestOutcome,
    },

    /// The suite run finished.
    RunFinished {
        /// Statistics for the run.
        run_stats: RunStats,
    },
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
    }
}
