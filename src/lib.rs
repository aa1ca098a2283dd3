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

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # Architecture
//!
//! The crate is organized into layers, leaves first:
//!
//! - **[`url`]**: the configuration carrier (host, port, group, parameters)
//! - **[`serialization`]**: pluggable named serializers keyed by wire byte
//! - **[`protocol`]**: the motan2-style framed wire codec
//! - **[`rpc`]**: request/response/exception data types and the RPC context
//! - **[`transport`]**: connection factories that dial the remote instance
//! - **[`channel`]**: multiplexed sessions, per-call streams, and the pool
//! - **[`endpoint`]**: the public facade upstream referers call into
//!
//! Data flow for a synchronous call:
//!
//! ```text
//! MotanEndpoint::call
//!   └─ ChannelPool::get            (round-robin, shared lease)
//!        └─ Channel::new_stream    (register by request id)
//!             ├─ Stream::send      (hand wire buffer to the writer task)
//!             └─ Stream::recv      (await the reader task's pulse)
//! ```
//!
//! Asynchronous calls skip `recv`: the reader task decodes the matching
//! reply and completes the caller's result sink directly.

pub mod channel;
pub mod endpoint;
pub mod protocol;
pub mod rpc;
pub mod serialization;
pub mod transport;
pub mod url;

pub use channel::{Channel, ChannelError, ChannelPool, Stream};
pub use endpoint::{EndpointConfig, MotanEndpoint};
pub use protocol::{Header, Message, ProtocolError};
pub use rpc::{Exception, Request, Response, RpcContext};
pub use serialization::{JsonSerialization, Serialization, SerializationRegistry};
pub use transport::{ConnectionFactory, TcpConnectionFactory, TransportError};
pub use url::Url;
