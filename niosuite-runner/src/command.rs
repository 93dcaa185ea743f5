// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs a single external command, capturing its output and enforcing a timeout.
//!
//! Build commands and example binaries both go through [`run_command`]. Failures are returned
//! as data rather than errors: a command that can't be spawned, times out, or is killed by a
//! signal produces a [`CommandOutput`] with exit code `-1`, so one broken execution never tears
//! down the rest of the suite.

use crate::stopwatch::StopwatchStart;
use std::{process::Stdio, time::Duration};
use tokio::io::{AsyncReadExt, BufReader};
use tracing::debug;

/// Once a command exits, wait up to this long for its pipes to shut down. Grandchildren that
/// inherit stdout/stderr can keep the pipes open past the command's own exit.
const LEAK_TIMEOUT: Duration = Duration::from_millis(100);

/// The observable result of one command execution.
#[derive(Clone, Debug)]
pub(crate) struct CommandOutput {
    /// Exit code of the command. `-1` if it timed out, was killed by a signal, or could not
    /// be run at all.
    pub(crate) exit_code: i32,
    /// Captured stdout followed by captured stderr, decoded lossily. The literal `TIMEOUT` if
    /// the command timed out, or an error description if it could not be run.
    pub(crate) output: String,
    /// Wall-clock duration of the execution.
    pub(crate) duration: Duration,
}

/// Runs `command` to completion with `env` overlaid on the inherited environment.
///
/// The command is killed once `timeout` elapses.
pub(crate) async fn run_command(
    command: &[&str],
    env: &[(&str, String)],
    timeout: Duration,
) -> CommandOutput {
    let stopwatch = StopwatchStart::now();
    match run_command_inner(command, env, timeout, &stopwatch).await {
        Ok(output) => output,
        Err(error) => {
            debug!("running command `{}` failed: {error}", shell_words::join(command));
            CommandOutput {
                exit_code: -1,
                output: error.to_string(),
                duration: stopwatch.elapsed(),
            }
        }
    }
}

async fn run_command_inner(
    command: &[&str],
    env: &[(&str, String)],
    timeout: Duration,
    stopwatch: &StopwatchStart,
) -> std::io::Result<CommandOutput> {
    let (program, args) = command
        .split_first()
        .expect("command invocations always name a program");

    let mut cmd = std::process::Command::new(program);
    cmd.args(args);
    // Overlaid on the inherited environment: the examples also rely on ambient variables such
    // as PATH and HOME.
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut cmd = tokio::process::Command::from(cmd);
    let mut child = cmd.spawn()?;

    let child_stdout = child.stdout.take().map(BufReader::new);
    let child_stderr = child.stderr.take().map(BufReader::new);
    let mut stdout = bytes::BytesMut::with_capacity(4096);
    let mut stderr = bytes::BytesMut::with_capacity(4096);

    let mut timed_out = false;

    let exit_status = {
        // Set up futures for reading from stdout and stderr.
        let stdout_fut = async {
            if let Some(mut child_stdout) = child_stdout {
                loop {
                    stdout.reserve(4096);
                    let bytes_read = child_stdout.read_buf(&mut stdout).await?;
                    if bytes_read == 0 {
                        break;
                    }
                }
            }
            Ok::<_, std::io::Error>(())
        };
        tokio::pin!(stdout_fut);
        let mut stdout_done = false;

        let stderr_fut = async {
            if let Some(mut child_stderr) = child_stderr {
                loop {
                    stderr.reserve(4096);
                    let bytes_read = child_stderr.read_buf(&mut stderr).await?;
                    if bytes_read == 0 {
                        break;
                    }
                }
            }
            Ok::<_, std::io::Error>(())
        };
        tokio::pin!(stderr_fut);
        let mut stderr_done = false;

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let exit_status = loop {
            tokio::select! {
                res = &mut stdout_fut, if !stdout_done => {
                    stdout_done = true;
                    res?;
                }
                res = &mut stderr_fut, if !stderr_done => {
                    stderr_done = true;
                    res?;
                }
                res = child.wait() => {
                    // The command finished executing.
                    break res?;
                }
                () = &mut deadline, if !timed_out => {
                    timed_out = true;
                    debug!(
                        "command `{}` timed out after {timeout:?}, killing it",
                        shell_words::join(command)
                    );
                    // Kill the command and keep looping so the wait arm can reap it. Errors
                    // here mean the command already exited.
                    let _ = child.start_kill();
                }
            }
        };

        // Once the command is done executing, wait up to LEAK_TIMEOUT for the pipes to shut
        // down before giving up on the remaining output.
        loop {
            let sleep = tokio::time::sleep(LEAK_TIMEOUT);

            tokio::select! {
                res = &mut stdout_fut, if !stdout_done => {
                    stdout_done = true;
                    res?;
                }
                res = &mut stderr_fut, if !stderr_done => {
                    stderr_done = true;
                    res?;
                }
                () = sleep, if !(stdout_done && stderr_done) => {
                    break;
                }
                else => {
                    break;
                }
            }
        }

        exit_status
    };

    if timed_out {
        return Ok(CommandOutput {
            exit_code: -1,
            output: "TIMEOUT".to_owned(),
            duration: stopwatch.elapsed(),
        });
    }

    // A command killed by a signal has no exit code; report it the same way as one that could
    // not run.
    let exit_code = exit_status.code().unwrap_or(-1);

    let mut output = String::from_utf8_lossy(&stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&stderr));

    Ok(CommandOutput {
        exit_code,
        output,
        duration: stopwatch.elapsed(),
    })
}
