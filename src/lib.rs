/*
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

//! Secure boot and TPM configuration for server BMCs over the Redfish API.
//!
//! The two supported BMC families, Supermicro and Dell iDRAC, disagree on
//! payload shapes and on whether BIOS changes need an explicit config job.
//! A [`Bmc`] session figures out which family it is talking to from the
//! managed system's id and hides the difference behind plain get/set
//! calls, plus a graceful power-cycle to make the changes stick.

pub mod model;

mod bmc;
mod common;
mod error;
mod network;
mod power;

pub use bmc::{Bmc, Dialect};
pub use common::{EnabledDisabled, OnOff};
pub use error::RedfishError;
pub use model::{PowerState, SystemPowerControl};
pub use network::{Endpoint, RedfishClientPool, RedfishClientPoolBuilder, REDFISH_ENDPOINT};
