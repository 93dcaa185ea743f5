// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `niosuite` failures.
///
/// Suite runs may fail for a variety of reasons. This structure documents the exit codes that
/// may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum NiosuiteExitCode {}

impl NiosuiteExitCode {
    /// No errors occurred and every test passed.
    pub const OK: i32 = 0;

    /// One or more tests or builds failed.
    pub const TEST_RUN_FAILED: i32 = 1;

    /// A user issue happened while setting up the invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
