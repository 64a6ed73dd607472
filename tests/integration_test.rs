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
//! Tests against a mocked BMC. The mock serves plain HTTP; the session
//! accepts an explicit scheme in the host for exactly this purpose.
use std::time::Duration;

use httpmock::prelude::*;
use httpmock::Method::PATCH;
use libfwsec::{Bmc, EnabledDisabled, Endpoint, OnOff, RedfishClientPool, RedfishError};
use serde_json::json;

const SUPERMICRO_ID: &str = "1";
const DELL_ID: &str = "System.Embedded.1";

fn session(server: &MockServer) -> Bmc {
    let pool = RedfishClientPool::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .expect("client pool");
    pool.create_session(Endpoint {
        host: server.base_url(),
        ..Default::default()
    })
}

fn mock_systems<'a>(server: &'a MockServer, system_id: &str) -> httpmock::Mock<'a> {
    let member = format!("/redfish/v1/Systems/{system_id}");
    server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/");
        then.status(200)
            .json_body(json!({ "Members": [ { "@odata.id": member } ] }));
    })
}

#[test]
fn system_id_is_resolved_once_per_session() {
    let server = MockServer::start();
    let systems = mock_systems(&server, DELL_ID);
    server.mock(|when, then| {
        when.method(GET)
            .path("/redfish/v1/Systems/System.Embedded.1/SecureBoot");
        then.status(200).json_body(json!({"SecureBootEnable": true}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/redfish/v1/Systems/System.Embedded.1/Bios");
        then.status(200)
            .json_body(json!({"Attributes": {"TpmSecurity": "On"}}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/redfish/v1/Systems/System.Embedded.1/");
        then.status(200).json_body(json!({"PowerState": "On"}));
    });

    let bmc = session(&server);
    assert_eq!(bmc.dialect().unwrap(), libfwsec::Dialect::Dell);
    assert!(bmc.get_secure_boot().unwrap());
    assert!(bmc.get_secure_boot().unwrap());
    assert!(bmc.get_tpm().unwrap());
    assert_eq!(bmc.get_power_state().unwrap(), libfwsec::PowerState::On);

    systems.assert_hits(1);
}

#[test]
fn missing_members_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/");
        then.status(200).json_body(json!({ "Members": [] }));
    });

    let bmc = session(&server);
    let err = bmc.system_id().unwrap_err();
    assert!(matches!(err, RedfishError::MissingKey { .. }), "{err}");
}

#[test]
fn secure_boot_round_trip_supermicro() {
    let server = MockServer::start();
    mock_systems(&server, SUPERMICRO_ID);
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/redfish/v1/Systems/1/SecureBoot")
            .json_body(json!({"SecureBoot": "Enabled"}));
        then.status(200).json_body(json!({}));
    });
    let get = server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/1/SecureBoot");
        then.status(200).json_body(json!({"SecureBoot": "Enabled"}));
    });

    let bmc = session(&server);
    bmc.set_secure_boot(EnabledDisabled::Enabled).unwrap();
    assert!(bmc.get_secure_boot().unwrap());

    patch.assert();
    get.assert();
}

#[test]
fn secure_boot_round_trip_dell() {
    let server = MockServer::start();
    mock_systems(&server, DELL_ID);
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/redfish/v1/Systems/System.Embedded.1/SecureBoot")
            .json_body(json!({"SecureBootEnable": false}));
        then.status(200).json_body(json!({}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/redfish/v1/Systems/System.Embedded.1/SecureBoot");
        then.status(200).json_body(json!({"SecureBootEnable": false}));
    });

    let bmc = session(&server);
    bmc.set_secure_boot(EnabledDisabled::Disabled).unwrap();
    assert!(!bmc.get_secure_boot().unwrap());

    patch.assert();
}

#[test]
fn secure_boot_enable_on_supermicro_creates_no_config_job() {
    let server = MockServer::start();
    mock_systems(&server, SUPERMICRO_ID);
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/redfish/v1/Systems/1/SecureBoot")
            .json_body(json!({"SecureBoot": "Enabled"}));
        then.status(200).json_body(json!({}));
    });
    let settings = server.mock(|when, then| {
        when.method(PATCH).path("/redfish/v1/Systems/1/Bios/Settings");
        then.status(200);
    });
    let jobs = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Managers/iDRAC.Embedded.1/Jobs");
        then.status(200);
    });

    let mut bmc = session(&server);
    bmc.set_secure_boot(EnabledDisabled::Enabled).unwrap();
    // nothing staged, so this must not touch the wire
    bmc.finalize_bios_settings().unwrap();

    patch.assert_hits(1);
    settings.assert_hits(0);
    jobs.assert_hits(0);
}

#[test]
fn tpm_enable_on_dell_patches_settings_then_creates_one_job() {
    let server = MockServer::start();
    mock_systems(&server, DELL_ID);
    server.mock(|when, then| {
        when.method(GET)
            .path("/redfish/v1/Systems/System.Embedded.1/Bios");
        then.status(200)
            .json_body(json!({"Attributes": {"TpmSecurity": "Off"}}));
    });
    let settings = server.mock(|when, then| {
        when.method(PATCH)
            .path("/redfish/v1/Systems/System.Embedded.1/Bios/Settings")
            .json_body(json!({"Attributes": {"TpmSecurity": "On"}}));
        then.status(200).json_body(json!({}));
    });
    let jobs = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Managers/iDRAC.Embedded.1/Jobs")
            .json_body(json!({
                "TargetSettingsURI": "/redfish/v1/Systems/System.Embedded.1/Bios/Settings"
            }));
        then.status(200).json_body(json!({}));
    });

    let mut bmc = session(&server);
    assert!(!bmc.get_tpm().unwrap());
    bmc.set_tpm(OnOff::On).unwrap();
    bmc.finalize_bios_settings().unwrap();

    settings.assert_hits(1);
    jobs.assert_hits(1);
}

#[test]
fn missing_tpm_attribute_is_feature_not_present() {
    let server = MockServer::start();
    mock_systems(&server, DELL_ID);
    server.mock(|when, then| {
        when.method(GET)
            .path("/redfish/v1/Systems/System.Embedded.1/Bios");
        then.status(200)
            .json_body(json!({"Attributes": {"BootMode": "Uefi"}}));
    });

    let bmc = session(&server);
    let err = bmc.get_tpm().unwrap_err();
    assert!(
        matches!(err, RedfishError::FeatureNotPresent { .. }),
        "{err}"
    );
}

#[test]
fn tpm_is_not_supported_on_supermicro() {
    let server = MockServer::start();
    mock_systems(&server, SUPERMICRO_ID);

    let mut bmc = session(&server);
    assert!(matches!(
        bmc.get_tpm().unwrap_err(),
        RedfishError::NotSupported(_)
    ));
    assert!(matches!(
        bmc.set_tpm(OnOff::On).unwrap_err(),
        RedfishError::NotSupported(_)
    ));
}

#[test]
fn power_cycle_from_on_shuts_down_then_powers_on() {
    let server = MockServer::start();
    mock_systems(&server, SUPERMICRO_ID);
    server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/1/");
        then.status(200).json_body(json!({"PowerState": "On"}));
    });
    // the poll hits the id without a trailing slash
    let poll = server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/1");
        then.status(200).json_body(json!({"PowerState": "Off"}));
    });
    let shutdown = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset")
            .json_body(json!({"ResetType": "GracefulShutdown"}));
        then.status(204);
    });
    let power_on = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset")
            .json_body(json!({"ResetType": "On"}));
        then.status(204);
    });

    let bmc = session(&server);
    bmc.power_cycle().unwrap();

    shutdown.assert_hits(1);
    poll.assert_hits(1);
    power_on.assert_hits(1);
}

#[test]
fn power_cycle_timeout_never_powers_on() {
    let server = MockServer::start();
    mock_systems(&server, SUPERMICRO_ID);
    server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/1/");
        then.status(200).json_body(json!({"PowerState": "On"}));
    });
    let poll = server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/1");
        then.status(200).json_body(json!({"PowerState": "On"}));
    });
    let shutdown = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset")
            .json_body(json!({"ResetType": "GracefulShutdown"}));
        then.status(204);
    });
    let power_on = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset")
            .json_body(json!({"ResetType": "On"}));
        then.status(204);
    });

    let mut bmc = session(&server);
    bmc.power_cycle_budget(20, Duration::from_millis(5));
    let err = bmc.power_cycle().unwrap_err();
    assert!(
        matches!(err, RedfishError::PowerOffTimeout { attempts: 20 }),
        "{err}"
    );

    shutdown.assert_hits(1);
    poll.assert_hits(20);
    power_on.assert_hits(0);
}

#[test]
fn power_cycle_from_off_skips_shutdown() {
    let server = MockServer::start();
    mock_systems(&server, SUPERMICRO_ID);
    server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/Systems/1/");
        then.status(200).json_body(json!({"PowerState": "Off"}));
    });
    let shutdown = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset")
            .json_body(json!({"ResetType": "GracefulShutdown"}));
        then.status(204);
    });
    let power_on = server.mock(|when, then| {
        when.method(POST)
            .path("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset")
            .json_body(json!({"ResetType": "On"}));
        then.status(204);
    });

    let bmc = session(&server);
    bmc.power_cycle().unwrap();

    shutdown.assert_hits(0);
    power_on.assert_hits(1);
}

#[test]
fn connectivity_probe_ignores_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/redfish/v1/");
        then.status(401)
            .json_body(json!({"error": {"message": "unauthorized"}}));
    });

    let bmc = session(&server);
    assert!(bmc.check_connectivity());
}

#[test]
fn connectivity_probe_fails_on_dead_endpoint() {
    let pool = RedfishClientPool::builder().build().expect("client pool");
    let bmc = pool.create_session(Endpoint {
        // nothing listens on the discard port
        host: "http://127.0.0.1:9".to_string(),
        ..Default::default()
    });
    assert!(!bmc.check_connectivity());
}

#[test]
fn http_error_carries_extended_info() {
    let server = MockServer::start();
    mock_systems(&server, DELL_ID);
    server.mock(|when, then| {
        when.method(GET)
            .path("/redfish/v1/Systems/System.Embedded.1/SecureBoot");
        then.status(400).json_body(json!({
            "error": { "@Message.ExtendedInfo": [ { "Message": "Invalid request" } ] }
        }));
    });

    let bmc = session(&server);
    let err = bmc.get_secure_boot().unwrap_err();
    match err {
        RedfishError::HTTPErrorCode { extended_info, .. } => {
            assert!(extended_info.contains("Invalid request"));
        }
        other => panic!("expected HTTPErrorCode, got {other}"),
    }
}
