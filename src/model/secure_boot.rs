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
use serde::{Deserialize, Serialize};

use crate::EnabledDisabled;

/// The SecureBoot resource of a system, as far as the two BMC families
/// agree on it. Supermicro reports the state as a string enum under
/// `SecureBoot`; Dell reports a native bool under `SecureBootEnable`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct SecureBoot {
    pub secure_boot: Option<EnabledDisabled>,
    pub secure_boot_enable: Option<bool>,
}

/// PATCH payload for the Supermicro flavour of the SecureBoot endpoint
#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "PascalCase")]
pub struct SetSecureBoot {
    pub secure_boot: EnabledDisabled,
}

/// PATCH payload for the Dell flavour of the SecureBoot endpoint
#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "PascalCase")]
pub struct SetSecureBootEnable {
    pub secure_boot_enable: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secure_boot_parser_supermicro() {
        let data = include_str!("testdata/secure_boot_supermicro.json");
        let result: SecureBoot = serde_json::from_str(data).unwrap();
        assert_eq!(result.secure_boot, Some(EnabledDisabled::Disabled));
        assert_eq!(result.secure_boot_enable, None);
    }

    #[test]
    fn test_secure_boot_parser_dell() {
        let data = include_str!("testdata/secure_boot_dell.json");
        let result: SecureBoot = serde_json::from_str(data).unwrap();
        assert_eq!(result.secure_boot_enable, Some(true));
        assert_eq!(result.secure_boot, None);
    }

    #[test]
    fn test_payload_encodings() {
        let supermicro = SetSecureBoot {
            secure_boot: EnabledDisabled::Enabled,
        };
        assert_eq!(
            serde_json::to_string(&supermicro).unwrap(),
            r#"{"SecureBoot":"Enabled"}"#
        );

        let dell = SetSecureBootEnable {
            secure_boot_enable: false,
        };
        assert_eq!(
            serde_json::to_string(&dell).unwrap(),
            r#"{"SecureBootEnable":false}"#
        );
    }
}
