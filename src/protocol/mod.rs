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

//! The motan2-style wire codec.
//!
//! This layer frames [`Message`]s onto a byte stream and converts between
//! wire messages and the [`rpc`](crate::rpc) data types. The channel core
//! reads only four header fields (the heartbeat bit, the proxy bit, the
//! serialization byte, and the request id) and treats the rest of the
//! frame as opaque cargo.
//!
//! Reserved metadata keys mirror the protocol's attachment conventions:
//! [`GROUP_KEY`], [`PATH_KEY`], and [`METHOD_KEY`].

mod convert;
mod error;
pub(crate) mod message;

pub use convert::{message_from_request, response_from_message};
pub use error::ProtocolError;
pub use message::{
    build_heartbeat, Header, Message, FLAG_GZIP, FLAG_HEARTBEAT, FLAG_PROXY, FLAG_RESPONSE,
    HEADER_SIZE, MAGIC, MAX_SECTION_SIZE, STATUS_EXCEPTION, STATUS_OK, VERSION,
};

/// Metadata key naming the service group a request targets.
pub const GROUP_KEY: &str = "M_g";
/// Metadata key naming the service path (interface).
pub const PATH_KEY: &str = "M_p";
/// Metadata key naming the invoked method.
pub const METHOD_KEY: &str = "M_m";
