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

//! Configuration for endpoints.

use crate::channel::ChannelConfig;
use std::time::Duration;

/// Configuration for a [`MotanEndpoint`](super::MotanEndpoint).
///
/// The per-call timeouts can be overridden per URL through the
/// `connectTimeout` and `requestTimeout` parameters; everything else is
/// fixed at construction.
///
/// # Examples
///
/// ```rust
/// use motan_endpoint::endpoint::EndpointConfig;
/// use std::time::Duration;
///
/// // Use default configuration
/// let config = EndpointConfig::default();
///
/// // Customize configuration
/// let config = EndpointConfig::default()
///     .with_pool_size(5)
///     .with_keepalive_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Number of pooled connections to the remote instance.
    ///
    /// Default: 3
    pub pool_size: usize,

    /// Connect timeout when the URL does not override it.
    ///
    /// Default: 1000 ms
    pub connect_timeout: Duration,

    /// Per-call timeout when the URL does not override it.
    ///
    /// Default: 1000 ms
    pub request_timeout: Duration,

    /// Interval between heartbeat probes while the endpoint is
    /// unavailable.
    ///
    /// Default: 10 seconds
    pub keepalive_interval: Duration,

    /// Consecutive failures before the endpoint marks itself unavailable
    /// and starts probing.
    ///
    /// Default: 10
    pub error_count_threshold: u32,

    /// Interval between pool-rebuild attempts after a failed initialize.
    ///
    /// Default: 60 seconds
    pub reconnect_interval: Duration,

    /// Per-channel tuning.
    pub channel: ChannelConfig,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            pool_size: 3,
            connect_timeout: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(1000),
            keepalive_interval: Duration::from_secs(10),
            error_count_threshold: 10,
            reconnect_interval: Duration::from_secs(60),
            channel: ChannelConfig::default(),
        }
    }
}

impl EndpointConfig {
    /// Sets the pool size.
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the default per-call timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the heartbeat probe interval.
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sets the unavailability threshold.
    #[must_use]
    pub fn with_error_count_threshold(mut self, threshold: u32) -> Self {
        self.error_count_threshold = threshold;
        self
    }

    /// Sets the initialize-retry interval.
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 {
            return Err("pool_size must be positive".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be positive".to_string());
        }
        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be positive".to_string());
        }
        if self.error_count_threshold == 0 {
            return Err("error_count_threshold must be positive".to_string());
        }
        if self.keepalive_interval.is_zero() {
            return Err("keepalive_interval must be positive".to_string());
        }
        self.channel.validate().map_err(|e| e.to_string())
    }
}


// Made with Bob
