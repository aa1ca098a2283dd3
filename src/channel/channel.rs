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

//! One multiplexed session over one TCP connection.

use super::stream::Stream;
use super::ChannelError;
use crate::protocol::{Message, VERSION};
use crate::rpc::RpcContext;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing::{error, warn};

/// Waits until `signal` carries `true`, without holding a borrowed
/// reference across an await point (the `watch::Ref` returned by
/// `wait_for` is not `Send`, which breaks tasks spawned onto
/// multi-threaded runtimes).
async fn wait_for_true(signal: &mut watch::Receiver<bool>) {
    loop {
        if *signal.borrow() {
            return;
        }
        if signal.changed().await.is_err() {
            return;
        }
    }
}

/// Tuning knobs for one channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Capacity of the bounded writer queue.
    ///
    /// Default: 256
    pub send_queue_size: usize,

    /// Initial capacity of the regular stream registry.
    ///
    /// Default: 64
    pub stream_registry_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            send_queue_size: 256,
            stream_registry_capacity: 64,
        }
    }
}

impl ChannelConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidConfiguration`] if the writer queue
    /// capacity is zero.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if self.send_queue_size == 0 {
            return Err(ChannelError::InvalidConfiguration {
                reason: "send queue capacity must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// An encoded frame queued for the writer task.
pub(crate) struct SendReady {
    pub(crate) data: Vec<u8>,
}

struct ShutdownState {
    shutdown: bool,
    cause: Option<String>,
}

/// One multiplexed, bidirectional framed session over a single TCP
/// connection.
///
/// A channel owns exactly two background tasks: a reader that decodes
/// frames and dispatches them to registered streams, and a writer that
/// drains the bounded outbound queue. Concurrent callers multiplex freely:
/// each call registers a [`Stream`] keyed by its wire request id, so the
/// channel never needs to be leased exclusively.
///
/// The first I/O error observed by either task tears the channel down;
/// the pool lazily replaces dead members on the next lease.
pub struct Channel {
    send_tx: mpsc::Sender<SendReady>,
    streams: Mutex<HashMap<u64, Arc<Stream>>>,
    heartbeats: Mutex<HashMap<u64, Arc<Stream>>>,
    state: Mutex<ShutdownState>,
    shutdown_tx: watch::Sender<bool>,
}

impl Channel {
    /// Wraps a connected TCP stream, spawning the reader and writer tasks.
    #[must_use]
    pub fn new(connection: TcpStream, config: ChannelConfig) -> Arc<Self> {
        let (read_half, write_half) = connection.into_split();
        let (send_tx, send_rx) = mpsc::channel(config.send_queue_size);
        let (shutdown_tx, _) = watch::channel(false);

        let channel = Arc::new(Self {
            send_tx,
            streams: Mutex::new(HashMap::with_capacity(config.stream_registry_capacity)),
            heartbeats: Mutex::new(HashMap::new()),
            state: Mutex::new(ShutdownState {
                shutdown: false,
                cause: None,
            }),
            shutdown_tx,
        });

        tokio::spawn(Self::read_loop(
            Arc::clone(&channel),
            BufReader::new(read_half),
        ));
        tokio::spawn(Self::write_loop(Arc::clone(&channel), write_half, send_rx));

        channel
    }

    /// Registers a new stream for an outbound message.
    ///
    /// A zero header id gets a freshly generated local id; a nonzero id is
    /// used as-is on the wire. The stream lands in the heartbeat registry
    /// iff the message's heartbeat bit is set, otherwise in the regular
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidMessage`] for an unsupported header
    /// version and [`ChannelError::Shutdown`] if the channel has shut down.
    pub fn new_stream(
        self: &Arc<Self>,
        message: Message,
        ctx: Option<Arc<RpcContext>>,
    ) -> Result<Arc<Stream>, ChannelError> {
        if message.header.version != VERSION {
            return Err(ChannelError::InvalidMessage {
                reason: format!("unsupported header version {}", message.header.version),
            });
        }
        if self.is_closed() {
            return Err(ChannelError::Shutdown);
        }

        let origin = message.header.request_id;
        let local = if origin == 0 {
            super::generate_request_id()
        } else {
            origin
        };
        let stream = Arc::new(Stream::new(
            Arc::clone(self),
            message,
            origin,
            local,
            ctx,
        ));

        if stream.is_heartbeat() {
            self.heartbeats.lock().insert(local, Arc::clone(&stream));
        } else {
            self.streams.lock().insert(local, Arc::clone(&stream));
        }
        Ok(stream)
    }

    /// Performs one call over this channel.
    ///
    /// Composes stream registration, deadline arming, send, and (for
    /// synchronous calls) receive. Asynchronous calls return `Ok(None)`
    /// immediately; the reader task completes the caller's result sink when
    /// the reply arrives.
    ///
    /// # Errors
    ///
    /// Propagates stream registration, send, and receive failures.
    pub async fn call(
        self: &Arc<Self>,
        message: Message,
        deadline: Duration,
        ctx: Option<Arc<RpcContext>>,
    ) -> Result<Option<Message>, ChannelError> {
        let stream = self.new_stream(message, ctx.clone())?;
        stream.set_deadline(deadline);
        stream.send().await?;
        if ctx.as_ref().is_some_and(|c| c.async_call) {
            return Ok(None);
        }
        stream.recv().await.map(Some)
    }

    /// Whether the shutdown broadcast has fired.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// The error that shut the channel down, if it died on one.
    #[must_use]
    pub fn shutdown_cause(&self) -> Option<String> {
        self.state.lock().cause.clone()
    }

    /// Number of registered regular streams.
    #[must_use]
    pub fn pending_streams(&self) -> usize {
        self.streams.lock().len()
    }

    /// Number of registered heartbeat streams.
    #[must_use]
    pub fn pending_heartbeats(&self) -> usize {
        self.heartbeats.lock().len()
    }

    /// Closes the channel: flips the shutdown flag, fires the broadcast
    /// under the same lock, and releases both stream registries. Idempotent.
    ///
    /// The reader and writer tasks observe the broadcast, exit, and drop
    /// their halves of the connection, which closes the socket.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            let _ = self.shutdown_tx.send(true);
        }
        self.streams.lock().clear();
        self.heartbeats.lock().clear();
    }

    /// Records the first failure cause and closes the channel. Idempotent.
    pub(crate) fn close_on_err(&self, err: &ChannelError) {
        let already_down = {
            let mut state = self.state.lock();
            if state.cause.is_none() {
                state.cause = Some(err.to_string());
            }
            state.shutdown
        };
        if !already_down {
            warn!(cause = %err, "channel closing on error");
            self.close();
        }
    }

    /// A fresh subscription to the shutdown broadcast.
    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Queues an encoded frame for the writer task.
    pub(crate) async fn offer(
        &self,
        ready: SendReady,
    ) -> Result<(), mpsc::error::SendError<SendReady>> {
        self.send_tx.send(ready).await
    }

    /// Deregisters a regular stream by its wire id.
    pub(crate) fn remove_stream(&self, local_request_id: u64) {
        self.streams.lock().remove(&local_request_id);
    }

    /// Reader task: decodes frames until the connection fails or the
    /// shutdown broadcast fires.
    async fn read_loop(self: Arc<Self>, mut reader: BufReader<OwnedReadHalf>) {
        let mut shutdown = self.shutdown_signal();
        loop {
            tokio::select! {
                result = Message::decode(&mut reader) => match result {
                    Ok(message) => self.dispatch(message),
                    Err(e) => {
                        self.close_on_err(&ChannelError::Protocol(e));
                        return;
                    }
                },
                _ = wait_for_true(&mut shutdown) => return,
            }
        }
    }

    /// Routes one inbound frame to its registered stream.
    fn dispatch(&self, message: Message) {
        let request_id = message.header.request_id;
        let stream = if message.header.is_heartbeat() {
            self.heartbeats.lock().get(&request_id).cloned()
        } else {
            self.streams.lock().get(&request_id).cloned()
        };
        match stream {
            Some(stream) => stream.notify(message),
            None => warn!(
                request_id,
                heartbeat = message.header.is_heartbeat(),
                "missing stream for inbound message"
            ),
        }
    }

    /// Writer task: the sole writer of the connection. Drains the outbound
    /// queue until a write fails or the shutdown broadcast fires.
    async fn write_loop(
        self: Arc<Self>,
        mut write_half: OwnedWriteHalf,
        mut send_rx: mpsc::Receiver<SendReady>,
    ) {
        let mut shutdown = self.shutdown_signal();
        loop {
            tokio::select! {
                ready = send_rx.recv() => match ready {
                    Some(ready) => {
                        if let Err(e) = write_half.write_all(&ready.data).await {
                            error!(error = %e, "failed to write frame");
                            self.close_on_err(&ChannelError::Io(e));
                            return;
                        }
                    }
                    None => return,
                },
                _ = wait_for_true(&mut shutdown) => return,
            }
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("closed", &self.is_closed())
            .field("pending_streams", &self.pending_streams())
            .field("pending_heartbeats", &self.pending_heartbeats())
            .finish()
    }
}


// Made with Bob