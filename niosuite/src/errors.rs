// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::exit_codes::NiosuiteExitCode;
use camino::Utf8PathBuf;
use niosuite_runner::errors::{SuiteRunnerBuildError, WriteEventError};
use owo_colors::{OwoColorize, Stream};
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print
// out errors is with the display_to_stderr method, which colorizes errors.

/// An error expected during a suite run, not a bug in niosuite itself.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("project dir invalid")]
    ProjectDirInvalid {
        project_dir: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("building suite runner failed")]
    SuiteRunnerBuildError {
        #[from]
        err: SuiteRunnerBuildError,
    },
    #[error("writing event failed")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
    #[error("test run failed")]
    TestRunFailed,
}

impl ExpectedError {
    pub(crate) fn project_dir_invalid(
        project_dir: impl Into<Utf8PathBuf>,
        err: std::io::Error,
    ) -> Self {
        Self::ProjectDirInvalid {
            project_dir: project_dir.into(),
            err,
        }
    }

    pub(crate) fn test_run_failed() -> Self {
        Self::TestRunFailed
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ProjectDirInvalid { .. } | Self::SuiteRunnerBuildError { .. } => {
                NiosuiteExitCode::SETUP_ERROR
            }
            Self::WriteEventError { .. } => NiosuiteExitCode::WRITE_OUTPUT_ERROR,
            Self::TestRunFailed => NiosuiteExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self) {
        let mut next_error = match &self {
            Self::ProjectDirInvalid { project_dir, err } => {
                log::error!(
                    "project dir `{}` could not be resolved",
                    project_dir.if_supports_color(Stream::Stderr, |x| x.bold())
                );
                Some(err as &dyn Error)
            }
            Self::SuiteRunnerBuildError { err } => {
                log::error!("failed to build suite runner");
                Some(err as &dyn Error)
            }
            Self::WriteEventError { err } => {
                log::error!("failed to write event to output");
                Some(err as &dyn Error)
            }
            Self::TestRunFailed => {
                log::error!("test run failed");
                None
            }
        };

        while let Some(err) = next_error {
            log::error!(target: "niosuite::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
