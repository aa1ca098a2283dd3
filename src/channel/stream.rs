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

//! One in-flight call on a channel.

use super::channel::{Channel, SendReady};
use super::ChannelError;
use crate::protocol::{response_from_message, Message};
use crate::rpc::{Exception, RpcContext};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::error;

/// A pending call bound to one [`Channel`].
///
/// A stream is registered in exactly one of its channel's two registries,
/// regular or heartbeat, chosen by the outbound heartbeat bit, under its
/// *local* request id, the id written on the wire. The caller-visible
/// *origin* id is restored on every reply before it is handed back.
///
/// Streams are created by [`Channel::new_stream`] and live until
/// [`close`](Stream::close); closing deregisters regular streams, while
/// heartbeat streams stay registered until the channel itself is torn down.
pub struct Stream {
    channel: Arc<Channel>,
    send_msg: Message,
    recv_msg: Mutex<Option<Message>>,
    recv_notify: Notify,
    deadline: Mutex<Instant>,
    origin_request_id: u64,
    local_request_id: u64,
    ctx: Option<Arc<RpcContext>>,
    closed: AtomicBool,
}

impl Stream {
    pub(crate) fn new(
        channel: Arc<Channel>,
        send_msg: Message,
        origin_request_id: u64,
        local_request_id: u64,
        ctx: Option<Arc<RpcContext>>,
    ) -> Self {
        Self {
            channel,
            send_msg,
            recv_msg: Mutex::new(None),
            recv_notify: Notify::new(),
            deadline: Mutex::new(Instant::now() + Duration::from_secs(1)),
            origin_request_id,
            local_request_id,
            ctx,
            closed: AtomicBool::new(false),
        }
    }

    /// The id the caller supplied (or zero before assignment).
    #[must_use]
    pub fn origin_request_id(&self) -> u64 {
        self.origin_request_id
    }

    /// The id written on the wire, unique within this process.
    #[must_use]
    pub fn local_request_id(&self) -> u64 {
        self.local_request_id
    }

    /// Whether the outbound message is a heartbeat.
    #[must_use]
    pub(crate) fn is_heartbeat(&self) -> bool {
        self.send_msg.header.is_heartbeat()
    }

    /// Sets the absolute deadline `timeout` from now.
    pub fn set_deadline(&self, timeout: Duration) {
        *self.deadline.lock() = Instant::now() + timeout;
    }

    /// Hands the encoded outbound message to the channel's writer task.
    ///
    /// The wire buffer carries the local request id; the in-memory header
    /// keeps the origin id. Resolves as soon as the buffer is accepted onto
    /// the writer queue; it does not wait for bytes to reach the network.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::SendTimeout`] if the deadline elapses first
    /// and [`ChannelError::Shutdown`] if the channel shuts down first.
    pub async fn send(&self) -> Result<(), ChannelError> {
        let data = self.send_msg.encode_with_request_id(self.local_request_id);
        let deadline = *self.deadline.lock();
        let mut shutdown = self.channel.shutdown_signal();

        tokio::select! {
            result = self.channel.offer(SendReady { data }) => {
                result.map_err(|_| ChannelError::Shutdown)
            }
            _ = tokio::time::sleep_until(deadline) => Err(ChannelError::SendTimeout),
            _ = shutdown.wait_for(|stopped| *stopped) => Err(ChannelError::Shutdown),
        }
    }

    /// Awaits the reply for a synchronous call.
    ///
    /// The delivered message's header id is rewritten to the origin id.
    /// The stream is closed on every exit path, releasing its registry
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::RecvTimeout`] if the deadline elapses first,
    /// [`ChannelError::Shutdown`] if the channel shuts down first, and
    /// [`ChannelError::MissingReply`] if the pulse fired with an empty
    /// reply slot.
    pub async fn recv(&self) -> Result<Message, ChannelError> {
        let result = self.recv_inner().await;
        self.close();
        result
    }

    async fn recv_inner(&self) -> Result<Message, ChannelError> {
        let deadline = *self.deadline.lock();
        let mut shutdown = self.channel.shutdown_signal();

        tokio::select! {
            _ = self.recv_notify.notified() => {
                let mut message = self
                    .recv_msg
                    .lock()
                    .take()
                    .ok_or(ChannelError::MissingReply)?;
                message.header.request_id = self.origin_request_id;
                Ok(message)
            }
            _ = tokio::time::sleep_until(deadline) => Err(ChannelError::RecvTimeout),
            _ = shutdown.wait_for(|stopped| *stopped) => Err(ChannelError::Shutdown),
        }
    }

    /// Delivers an inbound reply to this stream's caller.
    ///
    /// Called by the channel's reader task. Synchronous callers get the
    /// message installed in the reply slot and a single stored pulse;
    /// asynchronous callers get their result sink completed right here,
    /// without ever entering [`recv`](Stream::recv).
    pub(crate) fn notify(&self, message: Message) {
        if let Some(ctx) = self.ctx.as_ref().filter(|c| c.async_call) {
            self.complete_async(ctx, message);
            self.close();
            return;
        }
        *self.recv_msg.lock() = Some(message);
        self.recv_notify.notify_one();
        self.close();
    }

    fn complete_async(&self, ctx: &Arc<RpcContext>, mut message: Message) {
        let Some(result) = ctx.result() else {
            error!(
                request_id = self.origin_request_id,
                "async context without result sink"
            );
            return;
        };

        message.header.set_proxy(ctx.proxy());
        message.header.request_id = self.origin_request_id;

        let number = message.header.serialization;
        let Some(serialization) = ctx.extensions().get(number) else {
            error!(serialization = number, "no serializer registered for reply");
            result.complete(Err(Exception::service(
                500,
                format!("unknown serialization: {number}"),
            )));
            return;
        };

        match response_from_message(message, serialization.as_ref()) {
            Ok(mut response) => {
                response.process_deserializable(result.reply());
                response.process_time_ms = result.elapsed_ms();
                result.complete(Ok(response));
            }
            Err(e) => {
                error!(
                    request_id = self.origin_request_id,
                    error = %e,
                    "convert reply to response failed"
                );
                result.complete(Err(Exception::service(
                    500,
                    format!("convert response failed: {e}"),
                )));
            }
        }
    }

    /// Closes the stream, deregistering it from the channel's regular
    /// registry. Idempotent. Heartbeat streams stay registered; the channel
    /// reclaims them when it is torn down.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) && !self.is_heartbeat() {
            self.channel.remove_stream(self.local_request_id);
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("origin_request_id", &self.origin_request_id)
            .field("local_request_id", &self.local_request_id)
            .field("heartbeat", &self.is_heartbeat())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

// Made with Bob
