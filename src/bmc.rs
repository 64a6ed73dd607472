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
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::Method;
use tracing::info;

use crate::model::{
    Bios, BiosConfigJob, SecureBoot, SetBiosAttributes, SetSecureBoot, SetSecureBootEnable,
    Systems,
};
use crate::network::RedfishHttpClient;
use crate::{EnabledDisabled, OnOff, RedfishError};

const CONNECT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// The two BMC families this tool knows how to talk to. Their Redfish
/// renditions diverge on payload key names, value types, and whether a
/// config job must be created after a BIOS settings patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Supermicro,
    Dell,
}

impl Dialect {
    /// The system id is the only cheap discriminator the BMCs give us.
    /// Supermicro uses the DMTF-suggested "1", Dell "System.Embedded.1".
    /// Anything else gets the Dell conventions, which are closest to the
    /// plain Redfish spec. That fallback has never been confirmed against
    /// a third vendor.
    fn from_system_id(id: &str) -> Dialect {
        match id {
            "1" => Dialect::Supermicro,
            _ => Dialect::Dell,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A session against one BMC. Construction is free of network calls; the
/// system id (and with it the dialect) is fetched on first use and kept
/// for the lifetime of the session.
pub struct Bmc {
    pub(crate) client: RedfishHttpClient,
    system_id: OnceCell<String>,
    pending_bios_attrs: HashMap<String, serde_json::Value>,
    pub(crate) off_wait_attempts: u32,
    pub(crate) off_poll_interval: Duration,
}

impl Bmc {
    pub fn new(client: RedfishHttpClient) -> Self {
        Self {
            client,
            system_id: OnceCell::new(),
            pending_bios_attrs: HashMap::new(),
            off_wait_attempts: crate::power::POWER_OFF_WAIT_ATTEMPTS,
            off_poll_interval: crate::power::POWER_POLL_INTERVAL,
        }
    }

    /// Tune how long the power-cycle sequencer waits for the host to
    /// reach Off after a graceful shutdown. Mostly useful to shorten
    /// tests; the defaults suit real hardware.
    pub fn power_cycle_budget(&mut self, attempts: u32, interval: Duration) {
        self.off_wait_attempts = attempts;
        self.off_poll_interval = interval;
    }

    /// Whether the Redfish root answers at all. Status is not inspected;
    /// a 401 still proves the endpoint is there.
    pub fn check_connectivity(&self) -> bool {
        self.client
            .req::<serde_json::Value, String>(
                Method::GET,
                "",
                None,
                Some(CONNECT_PROBE_TIMEOUT),
                false,
            )
            .is_ok()
    }

    /// Id of the first system managed by this BMC, fetched once per
    /// session. All `Systems/{id}/...` calls hang off it.
    pub fn system_id(&self) -> Result<&str, RedfishError> {
        if let Some(id) = self.system_id.get() {
            return Ok(id);
        }
        let url = "Systems/";
        let (_status_code, systems): (_, Systems) = self.client.get(url)?;
        let member = systems
            .members
            .first()
            .ok_or_else(|| RedfishError::MissingKey {
                key: "Members".to_string(),
                url: url.to_string(),
            })?;
        let id = member
            .odata_id
            .strip_prefix("/redfish/v1/Systems/")
            .unwrap_or(&member.odata_id)
            .to_string();
        Ok(self.system_id.get_or_init(|| id))
    }

    pub fn dialect(&self) -> Result<Dialect, RedfishError> {
        Ok(Dialect::from_system_id(self.system_id()?))
    }

    pub fn get_secure_boot(&self) -> Result<bool, RedfishError> {
        let url = format!("Systems/{}/SecureBoot", self.system_id()?);
        let (_status_code, body): (_, SecureBoot) = self.client.get(&url)?;
        match self.dialect()? {
            Dialect::Supermicro => body
                .secure_boot
                .map(EnabledDisabled::is_enabled)
                .ok_or_else(|| RedfishError::MissingKey {
                    key: "SecureBoot".to_string(),
                    url,
                }),
            Dialect::Dell => {
                body.secure_boot_enable
                    .ok_or_else(|| RedfishError::MissingKey {
                        key: "SecureBootEnable".to_string(),
                        url,
                    })
            }
        }
    }

    /// Set secure boot. The patch applies as-is on both families; Dell
    /// queues its own config job for this endpoint, unlike `Bios/Settings`.
    pub fn set_secure_boot(&self, target: EnabledDisabled) -> Result<(), RedfishError> {
        let url = format!("Systems/{}/SecureBoot", self.system_id()?);
        let status_code = match self.dialect()? {
            Dialect::Supermicro => self.client.patch(&url, SetSecureBoot { secure_boot: target })?,
            Dialect::Dell => self.client.patch(
                &url,
                SetSecureBootEnable {
                    secure_boot_enable: target.is_enabled(),
                },
            )?,
        };
        info!("Secure boot command successful, status {status_code}");
        Ok(())
    }

    pub fn get_tpm(&self) -> Result<bool, RedfishError> {
        if self.dialect()? == Dialect::Supermicro {
            return Err(RedfishError::NotSupported("get_tpm".to_string()));
        }
        let url = format!("Systems/{}/Bios", self.system_id()?);
        let (_status_code, bios): (_, Bios) = self.client.get(&url)?;
        match bios.attributes.get("TpmSecurity") {
            Some(v) => Ok(v.as_str() == Some("On")),
            None => Err(RedfishError::FeatureNotPresent {
                feature: "TpmSecurity".to_string(),
                url,
            }),
        }
    }

    /// Stage a TPM state change. Takes effect once
    /// [`finalize_bios_settings`](Self::finalize_bios_settings) runs and
    /// the host reboots.
    pub fn set_tpm(&mut self, target: OnOff) -> Result<(), RedfishError> {
        if self.dialect()? == Dialect::Supermicro {
            return Err(RedfishError::NotSupported("set_tpm".to_string()));
        }
        self.pending_bios_attrs
            .insert("TpmSecurity".to_string(), target.to_string().into());
        Ok(())
    }

    /// Flush staged BIOS attribute changes as a single patch, then create
    /// the config job that commits them on next boot. A no-op when
    /// nothing is staged, so it is always safe to call at the end of a
    /// run.
    pub fn finalize_bios_settings(&mut self) -> Result<(), RedfishError> {
        if self.pending_bios_attrs.is_empty() {
            return Ok(());
        }
        let attributes = std::mem::take(&mut self.pending_bios_attrs);
        let url = format!("Systems/{}/Bios/Settings", self.system_id()?);
        let status_code = self.client.patch(&url, SetBiosAttributes { attributes })?;
        info!("Bios patch command successful, status {status_code}");
        self.create_bios_config_job()
    }

    // Changes staged at Bios/Settings sit there until a config job picks
    // them up; the job target is fixed by the iDRAC firmware.
    fn create_bios_config_job(&self) -> Result<(), RedfishError> {
        let job = BiosConfigJob {
            target_settings_uri: "/redfish/v1/Systems/System.Embedded.1/Bios/Settings".to_string(),
        };
        self.client
            .post("Managers/iDRAC.Embedded.1/Jobs", job)
            .map(|_status_code| ())
    }
}
