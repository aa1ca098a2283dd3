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

//! Per-call context shared between the caller and the channel core.

use super::Response;
use crate::serialization::SerializationRegistry;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// What an asynchronous caller's done sink eventually receives.
///
/// A `Response` on success (possibly one carrying a remote exception), or an
/// [`Exception`](super::Exception) when the reply could not be decoded.
pub type AsyncOutcome = Result<Response, super::Exception>;

/// A shared slot the decoded reply value is copied into.
///
/// Callers that want the reply value without unpacking the [`Response`]
/// hand one of these to the request; the deserialize-reply step fills it.
#[derive(Debug, Clone, Default)]
pub struct ReplySink(Arc<Mutex<Option<Value>>>);

impl ReplySink {
    /// Stores a value, replacing any previous one.
    pub fn set(&self, value: Value) {
        *self.0.lock() = Some(value);
    }

    /// Returns a clone of the stored value, if any.
    #[must_use]
    pub fn get(&self) -> Option<Value> {
        self.0.lock().clone()
    }

    /// Removes and returns the stored value, if any.
    #[must_use]
    pub fn take(&self) -> Option<Value> {
        self.0.lock().take()
    }
}

/// The result sink for an asynchronous call.
///
/// The caller keeps the paired receiver; the channel's reader task completes
/// the sender exactly once when the matching reply arrives (or fails to
/// decode). Completion also stamps the processing time measured from
/// [`mark_started`](AsyncResult::mark_started).
#[derive(Debug)]
pub struct AsyncResult {
    started: Mutex<Option<Instant>>,
    reply: ReplySink,
    done: Mutex<Option<oneshot::Sender<AsyncOutcome>>>,
}

impl AsyncResult {
    fn new(done: oneshot::Sender<AsyncOutcome>) -> Self {
        Self {
            started: Mutex::new(None),
            reply: ReplySink::default(),
            done: Mutex::new(Some(done)),
        }
    }

    /// Records the call start instant the processing-time stamp is measured
    /// from.
    pub fn mark_started(&self) {
        *self.started.lock() = Some(Instant::now());
    }

    /// Milliseconds elapsed since [`mark_started`](AsyncResult::mark_started),
    /// or zero if it was never called.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.started
            .lock()
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// The reply holder the deserialize-reply step fills.
    #[must_use]
    pub fn reply(&self) -> &ReplySink {
        &self.reply
    }

    /// Completes the done sink.
    ///
    /// Returns `false` if the sink was already completed or the caller
    /// dropped the receiver.
    pub fn complete(&self, outcome: AsyncOutcome) -> bool {
        match self.done.lock().take() {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }
}

/// Per-call state riding along with a request.
///
/// The endpoint populates the proxy and gzip hints before dispatch; the
/// channel core reads the async-call flag to choose between synchronous
/// reply delivery and completing the [`AsyncResult`] from the reader task.
#[derive(Debug)]
pub struct RpcContext {
    /// Whether the caller asked for asynchronous completion.
    pub async_call: bool,
    proxy: AtomicBool,
    gzip_size: AtomicI64,
    result: Option<AsyncResult>,
    reply: ReplySink,
    extensions: Arc<SerializationRegistry>,
}

impl RpcContext {
    /// Creates a synchronous-call context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            async_call: false,
            proxy: AtomicBool::new(false),
            gzip_size: AtomicI64::new(0),
            result: None,
            reply: ReplySink::default(),
            extensions: Arc::new(SerializationRegistry::default()),
        }
    }

    /// Creates an asynchronous-call context and the receiver its done sink
    /// feeds.
    #[must_use]
    pub fn new_async() -> (Self, oneshot::Receiver<AsyncOutcome>) {
        let (tx, rx) = oneshot::channel();
        let context = Self {
            async_call: true,
            proxy: AtomicBool::new(false),
            gzip_size: AtomicI64::new(0),
            result: Some(AsyncResult::new(tx)),
            reply: ReplySink::default(),
            extensions: Arc::new(SerializationRegistry::default()),
        };
        (context, rx)
    }

    /// Whether the proxy flag is set.
    #[must_use]
    pub fn proxy(&self) -> bool {
        self.proxy.load(Ordering::Relaxed)
    }

    /// Sets the proxy flag.
    pub fn set_proxy(&self, proxy: bool) {
        self.proxy.store(proxy, Ordering::Relaxed);
    }

    /// The gzip size hint in bytes; zero disables compression.
    #[must_use]
    pub fn gzip_size(&self) -> i64 {
        self.gzip_size.load(Ordering::Relaxed)
    }

    /// Sets the gzip size hint.
    pub fn set_gzip_size(&self, size: i64) {
        self.gzip_size.store(size, Ordering::Relaxed);
    }

    /// The async result sink, present only on asynchronous-call contexts.
    #[must_use]
    pub fn result(&self) -> Option<&AsyncResult> {
        self.result.as_ref()
    }

    /// The synchronous reply holder.
    #[must_use]
    pub fn reply(&self) -> &ReplySink {
        &self.reply
    }

    /// The serializer registry consulted when decoding replies.
    #[must_use]
    pub fn extensions(&self) -> &Arc<SerializationRegistry> {
        &self.extensions
    }
}

impl Default for RpcContext {
    fn default() -> Self {
        Self::new()
    }
}


// Made with Bob
