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

//! Responses and the exceptions they carry.

use super::ReplySink;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Classifies an [`Exception`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    /// A framework-level failure: transport, timeout, codec.
    Service,
    /// A failure raised by the remote business implementation.
    Biz,
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "ServiceException"),
            Self::Biz => write!(f, "BizException"),
        }
    }
}

/// An RPC failure attached to a [`Response`].
///
/// Transport and timeout failures carry code 400; codec failures carry
/// code 500. Both are [`ExceptionKind::Service`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
    /// Exception classification.
    pub kind: ExceptionKind,
}

impl Exception {
    /// Creates a framework-level exception.
    #[must_use]
    pub fn service(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind: ExceptionKind::Service,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {}): {}", self.kind, self.code, self.message)
    }
}

/// The result of one RPC call.
///
/// Exactly one of `value` and `exception` is populated for a completed
/// call; both are empty on the shared async placeholder returned to
/// asynchronous callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// The caller's request id this response answers.
    pub request_id: u64,
    /// The decoded reply value, if the call succeeded.
    pub value: Option<Value>,
    /// The failure, if the call did not succeed.
    pub exception: Option<Exception>,
    /// Wall-clock processing time in milliseconds, stamped by the caller
    /// side when the reply is delivered.
    pub process_time_ms: u64,
    /// String attachments carried back from the remote side.
    pub attachments: HashMap<String, String>,
}

impl Response {
    /// Creates an empty successful response for the given request id.
    #[must_use]
    pub fn new(request_id: u64) -> Self {
        Self {
            request_id,
            ..Self::default()
        }
    }

    /// Creates a response carrying an exception.
    #[must_use]
    pub fn from_exception(request_id: u64, exception: Exception) -> Self {
        Self {
            request_id,
            exception: Some(exception),
            ..Self::default()
        }
    }

    /// Copies the decoded reply value into the caller's reply holder.
    ///
    /// This is the deserialize-reply step: callers that handed a holder to
    /// the endpoint observe the value there, in addition to the response
    /// itself.
    pub fn process_deserializable(&self, sink: &ReplySink) {
        if let Some(value) = &self.value {
            sink.set(value.clone());
        }
    }

    /// Whether the response carries an exception.
    #[must_use]
    pub const fn is_exception(&self) -> bool {
        self.exception.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_response() {
        let response = Response::from_exception(7, Exception::service(400, "boom"));
        assert!(response.is_exception());
        assert_eq!(response.exception.as_ref().unwrap().code, 400);
        assert_eq!(response.request_id, 7);
        assert!(response.value.is_none());
    }

    #[test]
    fn test_process_deserializable_fills_sink() {
        let sink = ReplySink::default();
        let mut response = Response::new(1);
        response.value = Some(serde_json::json!({"ok": true}));
        response.process_deserializable(&sink);
        assert_eq!(sink.get(), Some(serde_json::json!({"ok": true})));
    }

    #[test]
    fn test_process_deserializable_without_value() {
        let sink = ReplySink::default();
        Response::new(1).process_deserializable(&sink);
        assert_eq!(sink.get(), None);
    }

    #[test]
    fn test_exception_serde_round_trip() {
        let exception = Exception::service(500, "convert failed");
        let bytes = serde_json::to_vec(&exception).unwrap();
        let back: Exception = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, exception);
    }
}

// Made with Bob
