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

//! Error types for the channel layer.

use crate::protocol::ProtocolError;
use crate::transport::TransportError;
use std::io;
use thiserror::Error;

/// Errors that can occur in the channel layer.
///
/// Every variant is terminal for the operation that produced it; there is
/// no per-call retry at this layer. The endpoint converts these into
/// code-400 exception responses and counts them against its error
/// threshold (codec failures excepted, which become code-500 without
/// counting).
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel has been shut down.
    ///
    /// Raised by sends and receives racing the shutdown broadcast, and by
    /// stream creation on an already-closed channel.
    #[error("the channel has been shutdown")]
    Shutdown,

    /// The per-call deadline elapsed before the outbound buffer was
    /// accepted onto the writer queue.
    #[error("timeout err: send request timeout")]
    SendTimeout,

    /// The per-call deadline elapsed before the reply arrived.
    #[error("timeout err: receive request timeout")]
    RecvTimeout,

    /// The outbound message failed validation.
    #[error("invalid message: {reason}")]
    InvalidMessage {
        /// What was wrong with the message.
        reason: String,
    },

    /// The reply pulse fired but the reply slot was empty.
    ///
    /// Indicates a bug in reply dispatch rather than a remote failure.
    #[error("recv err: reply message is missing")]
    MissingReply,

    /// The channel or pool configuration was rejected.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error.
        reason: String,
    },

    /// A lease was attempted on a torn-down pool.
    #[error("the channel pool has been closed")]
    PoolClosed,

    /// The pool slot was empty and a replacement channel could not be
    /// built.
    #[error("no channel available from the pool")]
    ChannelAbsent,

    /// Eager pool construction failed; the partial pool was torn down.
    #[error("channel pool init failed")]
    PoolInit,

    /// Establishing a connection failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The wire codec rejected a message.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The underlying connection failed mid-stream.
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
}

impl ChannelError {
    /// Returns true if this error indicates the channel shut down under
    /// the caller.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown)
    }

    /// Returns true if this error is a send or receive deadline expiry.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::SendTimeout | Self::RecvTimeout)
    }
}
