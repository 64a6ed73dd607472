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
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use tracing::{info, warn};

use crate::bmc::Bmc;
use crate::model::{ComputerSystem, PowerState, SystemPowerControl};
use crate::RedfishError;

// Graceful ACPI shutdown resolves in single-digit seconds on healthy
// hardware, so a fixed 1s interval with a 20 poll budget is plenty.
pub(crate) const POWER_OFF_WAIT_ATTEMPTS: u32 = 20;
pub(crate) const POWER_POLL_INTERVAL: Duration = Duration::from_secs(1);

impl Bmc {
    pub fn get_power_state(&self) -> Result<PowerState, RedfishError> {
        let url = format!("Systems/{}/", self.system_id()?);
        let (_status_code, system): (_, ComputerSystem) = self.client.get(&url)?;
        Ok(system.power_state)
    }

    /// Send a reset action to the host
    pub fn power(&self, action: SystemPowerControl) -> Result<StatusCode, RedfishError> {
        let url = format!(
            "Systems/{}/Actions/ComputerSystem.Reset",
            self.system_id()?
        );
        let mut arg = HashMap::new();
        arg.insert("ResetType", action.to_string());
        self.client.post(&url, arg)
    }

    /// Gracefully shut the host down, wait for it to reach Off, then power
    /// it back on. A host that is already off is powered on directly.
    ///
    /// If the host never reaches Off within the poll budget the sequence
    /// aborts without a power-on attempt; power-cycling on top of a stuck
    /// shutdown is worse than leaving the machine alone.
    pub fn power_cycle(&self) -> Result<(), RedfishError> {
        let state = self.get_power_state()?;
        warn!("Current server power state is {state}");
        match state {
            PowerState::On => {
                self.power(SystemPowerControl::GracefulShutdown)?;
                self.wait_for_power_off()?;
                let status_code = self.power(SystemPowerControl::On)?;
                info!("Command passed to power on server, status {status_code}");
                Ok(())
            }
            PowerState::Off => {
                let status_code = self.power(SystemPowerControl::On)?;
                info!("Command passed to power on server, status {status_code}");
                Ok(())
            }
            PowerState::PoweringOn | PowerState::PoweringOff => {
                warn!("Power state {state} is transitional, leaving the server alone");
                Ok(())
            }
        }
    }

    // Transient errors while the host shuts down are expected; the polls
    // are unchecked and a failed read just burns one attempt.
    fn wait_for_power_off(&self) -> Result<(), RedfishError> {
        let url = format!("Systems/{}", self.system_id()?);
        for _ in 0..self.off_wait_attempts {
            if let Ok((_status_code, Some(system))) =
                self.client
                    .req::<ComputerSystem, String>(Method::GET, &url, None, None, false)
            {
                if system.power_state == PowerState::Off {
                    info!("Server verified in Off state");
                    return Ok(());
                }
            }
            thread::sleep(self.off_poll_interval);
        }
        Err(RedfishError::PowerOffTimeout {
            attempts: self.off_wait_attempts,
        })
    }
}
