// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core functionality for [niosuite](https://crates.io/crates/niosuite). For a higher-level
//! overview, see that documentation.

#![warn(missing_docs)]

mod command;
pub mod config;
pub mod errors;
mod helpers;
pub mod list;
pub mod reporter;
pub mod runner;
mod stopwatch;
