/*
 * SPDX-FileCopyrightText: Copyright (c) 2023 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */

/* Configure secure boot and TPM on a server through its BMC.
 *
 * USAGE: ./fwsec --ip 10.22.22.139 -u root -p calvin --sb on -r
 * Run with `-v` for the full request/response exchange.
 * The tool does not reboot by default; pass `-r` if the operation
 * performed requires it.
 */

use std::fmt;
use std::process::ExitCode;

use anyhow::bail;
use clap::{Parser, ValueEnum};
use libfwsec::{Bmc, EnabledDisabled, Endpoint, OnOff, RedfishClientPool};
use tracing::{error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "fwsec",
    about = "Performs secure boot and TPM management operations on an iDRAC or Supermicro machine over Redfish.",
    after_help = "A get operation exits as soon as it has an answer, so combine it with \
                  nothing else. Exit code 0 means enabled, 1 means disabled."
)]
struct Args {
    /// MGMT IP address
    #[arg(long)]
    ip: String,

    /// MGMT username
    #[arg(short, long)]
    user: String,

    /// MGMT password
    #[arg(short, long)]
    password: String,

    /// Proxy server for traffic redirection
    #[arg(long)]
    proxy: Option<String>,

    /// Reboot remote machine after operation performed
    #[arg(short, long)]
    reboot: bool,

    /// Log at DEBUG level. Default is INFO
    #[arg(short, long)]
    verbose: bool,

    /// Secure boot configuration
    #[arg(long, value_enum)]
    sb: Option<Setting>,

    /// Trusted platform module configuration
    #[arg(long, value_enum)]
    tpm: Option<Setting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Setting {
    On,
    Off,
    Get,
}

#[derive(Debug, Clone, Copy)]
enum Feature {
    SecureBoot,
    Tpm,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::SecureBoot => write!(f, "secure boot"),
            Feature::Tpm => write!(f, "trusted platform module"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("hyper=warn".parse().unwrap());
    tracing_subscriber::registry()
        .with(Layer::default().compact())
        .with(env_filter)
        .init();

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, anyhow::Error> {
    if args.sb.is_none() && args.tpm.is_none() {
        bail!("nothing to do, pass --sb and/or --tpm");
    }

    let endpoint = Endpoint {
        host: args.ip.clone(),
        user: Some(args.user.clone()),
        password: Some(args.password.clone()),
        ..Default::default()
    };

    let mut bmc = connect(endpoint, args.proxy.as_deref())?;
    info!("Retrieved system id: {}", bmc.system_id()?);

    for (feature, setting) in [(Feature::SecureBoot, args.sb), (Feature::Tpm, args.tpm)] {
        let Some(setting) = setting else { continue };
        if let Some(code) = apply(&mut bmc, feature, setting)? {
            return Ok(code);
        }
    }

    bmc.finalize_bios_settings()?;

    if args.reboot {
        bmc.power_cycle()?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Reach the endpoint directly first; the proxy is a fallback, not a
/// default route.
fn connect(endpoint: Endpoint, proxy: Option<&str>) -> Result<Bmc, anyhow::Error> {
    let pool = RedfishClientPool::builder().build()?;
    let bmc = pool.create_session(endpoint.clone());
    if bmc.check_connectivity() {
        return Ok(bmc);
    }
    let Some(proxy) = proxy else {
        bail!("Redfish is inaccessible. Please ensure ip address is correct.");
    };
    info!("Endpoint inaccessible without proxy, retrying via {proxy}");
    let pool = RedfishClientPool::builder().proxy(proxy).build()?;
    let bmc = pool.create_session(endpoint);
    if !bmc.check_connectivity() {
        bail!("Redfish is inaccessible via proxy. Please ensure address is correct.");
    }
    Ok(bmc)
}

/// Run one feature operation. Returns the process exit code when the run
/// should stop here: a `get` answers immediately, and a state that is
/// already as requested leaves nothing to finalize or reboot for.
fn apply(
    bmc: &mut Bmc,
    feature: Feature,
    setting: Setting,
) -> Result<Option<ExitCode>, anyhow::Error> {
    let current = match feature {
        Feature::SecureBoot => bmc.get_secure_boot()?,
        Feature::Tpm => bmc.get_tpm()?,
    };
    let human = if current { "enabled" } else { "disabled" };
    info!("Retrieved {feature} status: {human}");

    match setting {
        Setting::Get => Ok(Some(if current {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })),
        Setting::On if current => {
            info!("System has {feature} already enabled, exiting");
            Ok(Some(ExitCode::SUCCESS))
        }
        Setting::Off if !current => {
            info!("System has {feature} already disabled, exiting");
            Ok(Some(ExitCode::SUCCESS))
        }
        Setting::On => {
            match feature {
                Feature::SecureBoot => bmc.set_secure_boot(EnabledDisabled::Enabled)?,
                Feature::Tpm => bmc.set_tpm(OnOff::On)?,
            }
            Ok(None)
        }
        Setting::Off => {
            match feature {
                Feature::SecureBoot => bmc.set_secure_boot(EnabledDisabled::Disabled)?,
                Feature::Tpm => bmc.set_tpm(OnOff::Off)?,
            }
            Ok(None)
        }
    }
}
