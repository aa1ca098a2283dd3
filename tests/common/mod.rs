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

//! A loopback motan server for integration tests.
//!
//! Echoes every decoded frame back with the response bit set, preserving
//! the request id, the heartbeat flag, the metadata, and the body. Can be
//! muted to simulate a hung remote and can kill individual connections to
//! simulate network failures.

#![allow(dead_code)]

use motan_endpoint::protocol::{Header, Message, FLAG_RESPONSE, STATUS_OK, VERSION};
use motan_endpoint::url::Url;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Installs a fmt subscriber once, honoring `RUST_LOG`.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub struct MockServer {
    addr: SocketAddr,
    responding: Arc<AtomicBool>,
    connections: Arc<Mutex<Vec<JoinHandle<()>>>>,
    accepted: Arc<AtomicUsize>,
}

impl MockServer {
    /// Binds an echo server on an ephemeral loopback port.
    pub async fn start() -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let responding = Arc::new(AtomicBool::new(true));
        let connections = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let responding_accept = Arc::clone(&responding);
        let connections_accept = Arc::clone(&connections);
        let accepted_accept = Arc::clone(&accepted);
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                accepted_accept.fetch_add(1, Ordering::SeqCst);
                let handle = tokio::spawn(handle_connection(
                    socket,
                    Arc::clone(&responding_accept),
                ));
                connections_accept.lock().unwrap().push(handle);
            }
        });

        Self {
            addr,
            responding,
            connections,
            accepted,
        }
    }

    /// The server's socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// A URL pointing at this server.
    pub fn url(&self) -> Url {
        Url::new("127.0.0.1", self.addr.port())
    }

    /// When false, frames are decoded and swallowed without a reply.
    pub fn set_responding(&self, responding: bool) {
        self.responding.store(responding, Ordering::SeqCst);
    }

    /// Number of connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Kills one live connection, simulating a network failure on it.
    /// Returns false if every accepted connection has already ended.
    pub fn kill_one_connection(&self) -> bool {
        let connections = self.connections.lock().unwrap();
        for handle in connections.iter() {
            if !handle.is_finished() {
                handle.abort();
                return true;
            }
        }
        false
    }
}

async fn handle_connection(socket: TcpStream, responding: Arc<AtomicBool>) {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    loop {
        let Ok(message) = Message::decode(&mut reader).await else {
            return;
        };
        if !responding.load(Ordering::SeqCst) {
            continue;
        }
        let mut reply = Message::new(Header {
            version: VERSION,
            flags: message.header.flags | FLAG_RESPONSE,
            status: STATUS_OK,
            serialization: message.header.serialization,
            request_id: message.header.request_id,
        });
        reply.metadata = message.metadata;
        reply.body = message.body;
        if write_half.write_all(&reply.encode()).await.is_err() {
            return;
        }
    }
}
