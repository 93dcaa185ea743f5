// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by niosuite.

use thiserror::Error;

/// An error that occurs while building a [`SuiteRunner`](crate::runner::SuiteRunner).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SuiteRunnerBuildError {
    /// The run configuration does not name any targets.
    #[error(
        "no targets configured\n\
         (hint: configure at least one of the POSIX and ESP32 targets)"
    )]
    NoTargetsConfigured,

    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] std::io::Error),
}

/// An error that occurs while writing an event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing the event to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),
}
