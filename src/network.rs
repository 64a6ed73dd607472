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
use std::time::Duration;

use reqwest::{
    blocking::Client as HttpClient, blocking::ClientBuilder as HttpClientBuilder,
    header::HeaderValue, header::ACCEPT, header::CONTENT_TYPE, Method, Proxy, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::bmc::Bmc;
pub use crate::RedfishError;

pub const REDFISH_ENDPOINT: &str = "redfish/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct RedfishClientPoolBuilder {
    timeout: Duration,
    proxy: Option<String>,
}

impl RedfishClientPoolBuilder {
    /// Overwrites the timeout that will be applied to every request
    pub fn timeout(mut self, timeout: Duration) -> RedfishClientPoolBuilder {
        self.timeout = timeout;
        self
    }

    /// Route all traffic, HTTP and HTTPS alike, through a forward proxy
    pub fn proxy(mut self, url: &str) -> RedfishClientPoolBuilder {
        self.proxy = Some(url.to_string());
        self
    }

    /// Builds a Redfish Client Network Configuration
    pub fn build(&self) -> Result<RedfishClientPool, RedfishError> {
        let mut builder = HttpClientBuilder::new()
            // BMCs ship a self-signed cert, so verification stays off
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout);
        if let Some(url) = &self.proxy {
            let proxy = Proxy::all(url).map_err(|e| RedfishError::ClientBuild { source: e })?;
            builder = builder.proxy(proxy);
        }
        let http_client = builder
            .build()
            .map_err(|e| RedfishError::ClientBuild { source: e })?;

        Ok(RedfishClientPool { http_client })
    }
}

/// The endpoint that the redfish client connects to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP address of BMC. May carry an explicit scheme;
    /// plain `https://` is assumed otherwise.
    pub host: String,
    /// BMC port. If absent the default HTTPS port 443 will be used
    pub port: Option<u16>,
    /// BMC username
    pub user: Option<String>,
    /// BMC password
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RedfishClientPool {
    http_client: HttpClient,
}

impl RedfishClientPool {
    /// Returns Builder for configuring a Redfish HTTP connection pool
    pub fn builder() -> RedfishClientPoolBuilder {
        RedfishClientPoolBuilder {
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
        }
    }

    /// Creates a BMC session for a certain endpoint.
    ///
    /// No network calls happen here; the system id is resolved on first use.
    pub fn create_session(&self, endpoint: Endpoint) -> Bmc {
        Bmc::new(RedfishHttpClient::new(self.http_client.clone(), endpoint))
    }
}

/// A HTTP client which targets a single Redfish endpoint
pub struct RedfishHttpClient {
    endpoint: Endpoint,
    http_client: HttpClient,
}

impl RedfishHttpClient {
    pub fn new(http_client: HttpClient, endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            http_client,
        }
    }

    pub fn get<T>(&self, api: &str) -> Result<(StatusCode, T), RedfishError>
    where
        T: DeserializeOwned + ::std::fmt::Debug,
    {
        let (status_code, resp_opt) = self.req::<T, String>(Method::GET, api, None, None, true)?;
        match resp_opt {
            Some(response_body) => Ok((status_code, response_body)),
            None => Err(RedfishError::NoContent),
        }
    }

    pub fn post<B>(&self, api: &str, data: B) -> Result<StatusCode, RedfishError>
    where
        B: Serialize + ::std::fmt::Debug,
    {
        let (status_code, _resp_body): (_, Option<serde_json::Value>) =
            self.req(Method::POST, api, Some(data), None, true)?;
        Ok(status_code)
    }

    pub fn patch<B>(&self, api: &str, data: B) -> Result<StatusCode, RedfishError>
    where
        B: Serialize + ::std::fmt::Debug,
    {
        let (status_code, _resp_body): (_, Option<serde_json::Value>) =
            self.req(Method::PATCH, api, Some(data), None, true)?;
        Ok(status_code)
    }

    // All the HTTP requests happen from here.
    //
    // With `check_status` set, a non-2xx response is an error carrying the
    // decoded extended-info body the BMC sent along. Without it the status is
    // not inspected and an undecodable body degrades to `None` instead of
    // failing; connectivity probes and power polling expect transient garbage.
    pub fn req<T, B>(
        &self,
        method: Method,
        api: &str,
        body: Option<B>,
        override_timeout: Option<Duration>,
        check_status: bool,
    ) -> Result<(StatusCode, Option<T>), RedfishError>
    where
        T: DeserializeOwned + ::std::fmt::Debug,
        B: Serialize + ::std::fmt::Debug,
    {
        let base = if self.endpoint.host.contains("://") {
            self.endpoint.host.clone()
        } else {
            format!("https://{}", self.endpoint.host)
        };
        let api = api.trim_start_matches('/');
        let url = match self.endpoint.port {
            Some(p) => format!("{}:{}/{}/{}", base, p, REDFISH_ENDPOINT, api),
            None => format!("{}/{}/{}", base, REDFISH_ENDPOINT, api),
        };
        let body_enc = match body {
            Some(b) => {
                let url = url.clone();
                let body_enc =
                    serde_json::to_string(&b).map_err(|e| RedfishError::JsonSerializeError {
                        url,
                        object_debug: format!("{b:?}"),
                        source: e,
                    })?;
                Some(body_enc)
            }
            None => None,
        };
        debug!(
            "TX {} {} {}",
            method,
            url,
            body_enc.as_deref().unwrap_or_default()
        );

        let mut req_b = match method {
            Method::GET => self.http_client.get(&url),
            Method::POST => self.http_client.post(&url),
            Method::PATCH => self.http_client.patch(&url),
            _ => unreachable!("Only GET, POST and PATCH http methods are used."),
        };
        req_b = req_b
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(user) = &self.endpoint.user {
            req_b = req_b.basic_auth(user, self.endpoint.password.as_ref());
        }
        if let Some(t) = override_timeout {
            req_b = req_b.timeout(t);
        }
        if let Some(b) = body_enc {
            req_b = req_b.body(b);
        }
        let response = req_b.send().map_err(|e| RedfishError::NetworkError {
            url: url.clone(),
            source: e,
        })?;
        let status_code = response.status();
        // read the body even if not status 2XX, because BMCs give useful error messages as JSON
        let response_body = response.text().map_err(|e| RedfishError::NetworkError {
            url: url.clone(),
            source: e,
        })?;
        if response_body.is_empty() {
            debug!("RX {status_code}");
        } else {
            debug!("RX {status_code} {response_body}");
        }

        if check_status && !status_code.is_success() {
            let extended_info = match serde_json::from_str::<serde_json::Value>(&response_body) {
                Ok(v) => serde_json::to_string_pretty(&v).unwrap_or(response_body),
                Err(_) => response_body,
            };
            return Err(RedfishError::HTTPErrorCode {
                url,
                status_code,
                extended_info,
            });
        }

        let mut res = None;
        if !response_body.is_empty() {
            match serde_json::from_str(&response_body) {
                Ok(v) => res = Some(v),
                Err(e) if check_status => {
                    return Err(RedfishError::JsonDeserializeError {
                        url,
                        body: response_body,
                        source: e,
                    });
                }
                Err(_) => {}
            }
        }
        Ok((status_code, res))
    }
}
