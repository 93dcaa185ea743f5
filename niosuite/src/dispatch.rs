// Copyright (c) The niosuite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    exit_codes::NiosuiteExitCode,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::Utf8PathBuf;
use clap::{ArgGroup, builder::NonEmptyStringValueParser};
use niosuite_runner::{
    config::{RunTarget, SuiteConfig},
    errors::WriteEventError,
    list::TestList,
    reporter::SuiteReporterBuilder,
    runner::SuiteRunner,
};
use std::{io::Write, net::UdpSocket};
use supports_color::Stream;
use tracing::debug;

const AFTER_HELP: &str = "\
Examples:
    # Run against POSIX only
    niosuite --posix-port /dev/pts/2

    # Run against ESP32 only
    niosuite --esp32-port /dev/ttyUSB0

    # Run against both with an explicit services IP
    niosuite --posix-port /dev/pts/2 --esp32-port /dev/ttyUSB0 --services-ip 192.168.1.101

Prerequisites:
    - Test services must be running: ./scripts/start_test_services.sh all
    - The ESP32 must be flashed with fujinet-nio firmware";

/// Run the FujiNet-NIO library examples against POSIX and ESP32 targets.
///
/// Builds the library and its examples for each selected target, runs every example against
/// live test services, and checks the captured output for expected markers.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    name = "niosuite",
    styles = clap_styles::style(),
    max_term_width = 100,
    after_help = AFTER_HELP,
    group(ArgGroup::new("targets").multiple(true).required(true)),
)]
pub struct NiosuiteApp {
    /// Serial port for the POSIX target (e.g. /dev/pts/2)
    #[arg(
        long,
        short = 'p',
        value_name = "PORT",
        group = "targets",
        value_parser = NonEmptyStringValueParser::new(),
    )]
    posix_port: Option<String>,

    /// Serial port for the ESP32 target (e.g. /dev/ttyUSB0)
    #[arg(
        long,
        short = 'e',
        value_name = "PORT",
        group = "targets",
        value_parser = NonEmptyStringValueParser::new(),
    )]
    esp32_port: Option<String>,

    /// IP address where the test services run, reachable from the device
    ///
    /// Defaults to this machine's outbound IP address.
    #[arg(
        long,
        short = 's',
        value_name = "IP",
        requires = "esp32_port",
        value_parser = NonEmptyStringValueParser::new(),
    )]
    services_ip: Option<String>,

    /// Root of the FujiNet-NIO checkout to build and test
    #[arg(long, value_name = "DIR", default_value = ".")]
    project_dir: Utf8PathBuf,

    #[command(flatten)]
    output: OutputOpts,
}

impl NiosuiteApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let project_dir = self
            .project_dir
            .canonicalize_utf8()
            .map_err(|err| ExpectedError::project_dir_invalid(self.project_dir.clone(), err))?;

        let config = SuiteConfig::new(self.build_targets());
        let test_list = TestList::new(project_dir);

        let mut reporter = SuiteReporterBuilder::default()
            .set_verbose(output.verbose)
            .build();
        if output.color.should_colorize(Stream::Stdout) {
            reporter.colorize();
        }

        let runner = SuiteRunner::new(&config, &test_list)?;

        let mut writer = output_writer.stdout_writer();
        let run_stats = runner.try_execute(|event| {
            // Write and flush the event: progress lines are partial lines.
            reporter.report_event(event, &mut writer)?;
            writer.flush().map_err(WriteEventError::Io)
        })?;

        if !run_stats.is_success() {
            return Err(ExpectedError::test_run_failed());
        }
        Ok(NiosuiteExitCode::OK)
    }

    /// Builds the run targets in execution order: POSIX first, then ESP32.
    fn build_targets(&self) -> Vec<RunTarget> {
        let mut targets = Vec::new();
        if let Some(port) = &self.posix_port {
            targets.push(RunTarget::posix(port.clone()));
        }
        if let Some(port) = &self.esp32_port {
            let services_host = self.services_ip.clone().unwrap_or_else(default_services_ip);
            targets.push(RunTarget::esp32(port.clone(), services_host));
        }
        targets
    }
}

/// Best-effort discovery of this machine's outbound IP address.
///
/// Connecting a UDP socket does not send any packets. The local address the kernel picks to
/// reach a public destination is one that devices on the local network can route back to.
fn default_services_ip() -> String {
    fn outbound_ip() -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip().to_string())
    }

    match outbound_ip() {
        Ok(ip) => ip,
        Err(error) => {
            debug!("outbound IP discovery failed, falling back to localhost: {error}");
            "127.0.0.1".to_owned()
        }
    }
}
