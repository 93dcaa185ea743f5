// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An integration test suite driver for the FujiNet-NIO library examples.
//!
//! For documentation and usage, run `niosuite --help`, or see the
//! [niosuite-runner](https://docs.rs/niosuite-runner) library that backs it.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use exit_codes::*;
#[doc(hidden)]
pub use output::OutputWriter;
