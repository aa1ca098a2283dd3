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

//! The public endpoint facade.
//!
//! A [`MotanEndpoint`] is the handle upstream referers hold for one remote
//! service instance. It owns the channel pool, performs calls, accounts for
//! consecutive failures, and probes an unhealthy remote with heartbeats
//! until it recovers.
//!
//! Lifecycle: [`MotanEndpoint::new`] → configure (`set_proxy`,
//! `set_serialization`) → [`initialize`](MotanEndpoint::initialize) → any
//! number of [`call`](MotanEndpoint::call)s →
//! [`destroy`](MotanEndpoint::destroy).

#[allow(clippy::module_inception)]
mod endpoint;

mod config;

pub use config::EndpointConfig;
pub use endpoint::MotanEndpoint;
