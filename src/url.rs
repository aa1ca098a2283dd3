//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The URL configuration carrier.
//!
//! A [`Url`] identifies one remote service instance (host, port, group) and
//! carries a map of named string parameters. The endpoint core reads timing
//! and size knobs from the parameter map through typed getters; everything
//! else is opaque and travels with the URL untouched.

use std::collections::HashMap;
use std::time::Duration;

/// Parameter key for the connect timeout, in milliseconds.
pub const CONNECT_TIMEOUT_KEY: &str = "connectTimeout";
/// Parameter key for the per-request timeout, in milliseconds.
pub const REQUEST_TIMEOUT_KEY: &str = "requestTimeout";
/// Parameter key for the gzip size hint, in bytes.
pub const GZIP_SIZE_KEY: &str = "gzipSize";

/// Identifies one remote service instance and its configuration.
///
/// The core consumes `host`, `port`, `group`, and the typed getters over
/// [`parameters`](Url::parameters); it never writes back into a URL.
///
/// # Example
///
/// ```rust
/// use motan_endpoint::url::Url;
/// use std::time::Duration;
///
/// let url = Url::new("10.0.0.7", 8002)
///     .with_group("rpc-test")
///     .with_parameter("requestTimeout", "250");
///
/// assert_eq!(url.address(), "10.0.0.7:8002");
/// assert_eq!(
///     url.get_duration_ms("requestTimeout", Duration::from_secs(1)),
///     Duration::from_millis(250),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Service group this endpoint belongs to. Empty means ungrouped.
    pub group: String,
    /// Service path (interface name), used for identity only.
    pub path: String,
    /// Named string parameters.
    pub parameters: HashMap<String, String>,
}

impl Url {
    /// Creates a URL for the given host and port with no group, path, or
    /// parameters.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            group: String::new(),
            path: String::new(),
            parameters: HashMap::new(),
        }
    }

    /// Sets the service group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Sets the service path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds a named parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the `host:port` address string used for dialing.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns a human-readable identity for logging: `group/path@host:port`.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}/{}@{}", self.group, self.path, self.address())
    }

    /// Reads a millisecond-valued parameter as a [`Duration`].
    ///
    /// Returns `default` if the parameter is absent, non-numeric, or zero.
    #[must_use]
    pub fn get_duration_ms(&self, key: &str, default: Duration) -> Duration {
        match self.parameters.get(key).and_then(|v| v.parse::<u64>().ok()) {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => default,
        }
    }

    /// Reads an integer parameter.
    ///
    /// Returns `default` if the parameter is absent or non-numeric.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.parameters
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(default)
    }
}


// Made with Bob
