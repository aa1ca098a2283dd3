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

//! Outbound RPC requests.

use super::{AsyncOutcome, RpcContext};
use crate::protocol::GROUP_KEY;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// One RPC invocation against a remote service.
///
/// A zero `request_id` asks the endpoint to assign one; a nonzero id is
/// preserved end to end, and the response always carries the caller's
/// original id either way.
///
/// # Example
///
/// ```rust
/// use motan_endpoint::rpc::Request;
///
/// let request = Request::new("com.example.HelloService", "hello")
///     .with_argument(serde_json::json!("world"))
///     .with_attachment("M_g", "test-group");
/// assert_eq!(request.group(), Some("test-group"));
/// ```
#[derive(Debug)]
pub struct Request {
    /// Caller-visible request id; zero means "assign one for me".
    pub request_id: u64,
    /// Fully-qualified service name.
    pub service: String,
    /// Method name on the service.
    pub method: String,
    /// Positional call arguments.
    pub arguments: Vec<Value>,
    /// String attachments carried in frame metadata.
    pub attachments: HashMap<String, String>,
    context: Arc<RpcContext>,
}

impl Request {
    /// Creates a synchronous request with no arguments.
    #[must_use]
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            request_id: 0,
            service: service.into(),
            method: method.into(),
            arguments: Vec::new(),
            attachments: HashMap::new(),
            context: Arc::new(RpcContext::new()),
        }
    }

    /// Sets an explicit request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: u64) -> Self {
        self.request_id = request_id;
        self
    }

    /// Appends a call argument.
    #[must_use]
    pub fn with_argument(mut self, argument: Value) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn with_attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attachments.insert(key.into(), value.into());
        self
    }

    /// Converts this request into an asynchronous one.
    ///
    /// The call will return the shared async placeholder immediately; the
    /// decoded reply arrives on the returned receiver, completed by the
    /// connection's reader task.
    #[must_use]
    pub fn into_async(mut self) -> (Self, oneshot::Receiver<AsyncOutcome>) {
        let (context, rx) = RpcContext::new_async();
        self.context = Arc::new(context);
        (self, rx)
    }

    /// Sets an attachment on an existing request.
    pub fn set_attachment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attachments.insert(key.into(), value.into());
    }

    /// Reads an attachment.
    #[must_use]
    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }

    /// The service group this request targets, read from the group
    /// attachment.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.attachment(GROUP_KEY)
    }

    /// The per-call context shared with the channel core.
    #[must_use]
    pub fn context(&self) -> Arc<RpcContext> {
        Arc::clone(&self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = Request::new("svc", "m")
            .with_request_id(99)
            .with_argument(serde_json::json!(1))
            .with_attachment("k", "v");
        assert_eq!(request.request_id, 99);
        assert_eq!(request.arguments.len(), 1);
        assert_eq!(request.attachment("k"), Some("v"));
        assert!(!request.context().async_call);
    }

    #[test]
    fn test_into_async_swaps_context() {
        let (request, _rx) = Request::new("svc", "m").into_async();
        assert!(request.context().async_call);
        assert!(request.context().result().is_some());
    }

    #[test]
    fn test_group_reads_attachment() {
        let request = Request::new("svc", "m");
        assert_eq!(request.group(), None);
        let request = request.with_attachment(GROUP_KEY, "g2");
        assert_eq!(request.group(), Some("g2"));
    }
}

// Made with Bob
