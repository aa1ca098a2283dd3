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

//! Multiplexed channels, per-call streams, and the connection pool.
//!
//! This layer turns N long-lived TCP connections into a transport for an
//! unbounded number of concurrent calls:
//!
//! - A [`Channel`] is one multiplexed session over one connection, with one
//!   reader task and one writer task. Inbound frames are routed to the
//!   [`Stream`] registered under their request id; regular calls and
//!   heartbeats live in separate registries because their id spaces can
//!   collide.
//! - A [`Stream`] is one in-flight call: it owns the deadline, the reply
//!   slot, and the notification pulse that connects the caller to the
//!   reader task.
//! - A [`ChannelPool`] rotates channels round-robin under shared (not
//!   exclusive) leases and lazily repairs members that died.
//!
//! Every blocking point (queueing a send, awaiting a reply, leasing from
//! the pool) is bounded by a deadline, the channel's shutdown broadcast,
//! or both.

#[allow(clippy::module_inception)]
mod channel;

mod error;
mod id;
mod pool;
mod stream;

pub use channel::{Channel, ChannelConfig};
pub use error::ChannelError;
pub use id::generate_request_id;
pub use pool::ChannelPool;
pub use stream::Stream;
