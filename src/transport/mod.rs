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

//! Connection establishment.
//!
//! The channel pool dials the remote instance through a [`ConnectionFactory`]
//! so that pool construction and repair share one seam. The only production
//! implementation is [`TcpConnectionFactory`], which dials `host:port` under
//! a connect timeout derived from the endpoint URL.

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;

/// Errors raised while establishing a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The dial failed at the socket layer.
    #[error("failed to connect to {address}: {source}")]
    ConnectFailed {
        /// The address that failed to connect.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The dial did not complete within the connect timeout.
    #[error("connect to {address} timed out after {timeout:?}")]
    ConnectTimeout {
        /// The address being dialed.
        address: String,
        /// The elapsed timeout.
        timeout: Duration,
    },
}

/// Dials connections to one remote service instance.
///
/// Factories are shared between eager pool construction and lazy member
/// repair, and must therefore be cheap to call repeatedly and safe to call
/// concurrently.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Opens one new connection.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the connection cannot be established
    /// in time.
    async fn connect(&self) -> Result<TcpStream, TransportError>;
}

/// Dials TCP to a fixed `host:port` with a connect timeout.
///
/// # Example
///
/// ```rust,no_run
/// use motan_endpoint::transport::{ConnectionFactory, TcpConnectionFactory};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = TcpConnectionFactory::new("127.0.0.1:8002", Duration::from_millis(1000));
/// let stream = factory.connect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TcpConnectionFactory {
    address: String,
    connect_timeout: Duration,
}

impl TcpConnectionFactory {
    /// Creates a factory dialing `address` with the given timeout.
    #[must_use]
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    /// The address this factory dials.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl ConnectionFactory for TcpConnectionFactory {
    async fn connect(&self) -> Result<TcpStream, TransportError> {
        let dial = TcpStream::connect(&self.address);
        match tokio::time::timeout(self.connect_timeout, dial).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TransportError::ConnectFailed {
                address: self.address.clone(),
                source,
            }),
            Err(_) => Err(TransportError::ConnectTimeout {
                address: self.address.clone(),
                timeout: self.connect_timeout,
            }),
        }
    }
}


// Made with Bob
