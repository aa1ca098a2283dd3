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

//! RPC data types: requests, responses, exceptions, and the call context.
//!
//! These are the types the endpoint core manipulates on behalf of its
//! callers. A [`Request`] names a service method and carries arguments and
//! string attachments; a [`Response`] carries either a decoded value or an
//! [`Exception`]; the [`RpcContext`] rides along with the request and holds
//! the per-call state the core reads and writes: the async-call flag, the
//! proxy and gzip hints, the caller's reply holder, and (for asynchronous
//! calls) the [`AsyncResult`] sink the reader task completes.
//!
//! `MotanEndpoint::call` never fails with an `Err`: every failure is
//! expressed as a `Response` whose `exception` field is populated.

mod context;
mod request;
mod response;

pub use context::{AsyncOutcome, AsyncResult, ReplySink, RpcContext};
pub use request::Request;
pub use response::{Exception, ExceptionKind, Response};
