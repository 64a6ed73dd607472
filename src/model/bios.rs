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

use serde::{Deserialize, Serialize};

/// The Bios resource. Vendors each dump hundreds of keys into
/// `Attributes`, so it stays an untyped map.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Bios {
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// PATCH payload for staging BIOS attribute changes at `Bios/Settings`
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct SetBiosAttributes {
    pub attributes: HashMap<String, serde_json::Value>,
}

/// POST payload that creates the iDRAC config job committing staged
/// BIOS settings on next boot
#[derive(Debug, Serialize, Clone)]
pub struct BiosConfigJob {
    #[serde(rename = "TargetSettingsURI")]
    pub target_settings_uri: String,
}

#[cfg(test)]
mod test {
    #[test]
    fn test_bios_parser() {
        let data = include_str!("testdata/bios_dell.json");
        let result: super::Bios = serde_json::from_str(data).unwrap();
        assert_eq!(
            result.attributes.get("TpmSecurity").and_then(|v| v.as_str()),
            Some("On")
        );
    }

    #[test]
    fn test_config_job_encoding() {
        let job = super::BiosConfigJob {
            target_settings_uri: "/redfish/v1/Systems/System.Embedded.1/Bios/Settings".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&job).unwrap(),
            r#"{"TargetSettingsURI":"/redfish/v1/Systems/System.Embedded.1/Bios/Settings"}"#
        );
    }
}
