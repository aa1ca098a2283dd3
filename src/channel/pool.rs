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

//! A fixed-size rotating reservoir of shared channels.

use super::channel::{Channel, ChannelConfig};
use super::ChannelError;
use crate::transport::ConnectionFactory;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::error;

/// The rotating queue of channel slots.
///
/// Every queued entry is matched by one semaphore permit, so a lease blocks
/// exactly until a slot is available and `Semaphore::close` wakes blocked
/// leases when the pool is torn down.
struct PoolQueue {
    entries: Mutex<VecDeque<Option<Arc<Channel>>>>,
    available: Semaphore,
    closed: AtomicBool,
}

impl PoolQueue {
    fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
            closed: AtomicBool::new(false),
        }
    }
}

/// A fixed-capacity bag of [`Channel`]s cycled round-robin.
///
/// Leases are *shared*: [`get`](ChannelPool::get) returns the handle to the
/// queue before handing it to the caller, so multiple callers use one
/// channel concurrently. That is sound because channels multiplex by
/// request id, and it is what keeps N connections serving far more than N
/// concurrent calls. Deferring the re-enqueue until the caller finished
/// would silently serialize all traffic through the pool.
///
/// Dead or absent members are repaired lazily at lease time; a slot whose
/// repair fails stays empty and surfaces as [`ChannelError::ChannelAbsent`].
pub struct ChannelPool {
    queue: Mutex<Option<Arc<PoolQueue>>>,
    factory: Mutex<Option<Arc<dyn ConnectionFactory>>>,
    config: Mutex<Option<ChannelConfig>>,
}

impl ChannelPool {
    /// Builds a pool by eagerly opening `capacity` connections.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidConfiguration`] for a zero capacity
    /// or invalid channel config, and [`ChannelError::PoolInit`] if any of
    /// the eager dials fails; the partial pool is torn down first.
    pub async fn new(
        capacity: usize,
        factory: Arc<dyn ConnectionFactory>,
        config: ChannelConfig,
    ) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::InvalidConfiguration {
                reason: "pool capacity must be positive".to_string(),
            });
        }
        config.validate()?;

        let queue = Arc::new(PoolQueue::new());
        let pool = Self {
            queue: Mutex::new(Some(Arc::clone(&queue))),
            factory: Mutex::new(Some(factory)),
            config: Mutex::new(Some(config)),
        };

        for _ in 0..capacity {
            match pool.build_channel().await {
                Some(channel) => {
                    queue.entries.lock().push_back(Some(channel));
                    queue.available.add_permits(1);
                }
                None => {
                    pool.close();
                    return Err(ChannelError::PoolInit);
                }
            }
        }
        Ok(pool)
    }

    /// Leases one channel.
    ///
    /// Takes the next handle round-robin, repairs it if it is absent or
    /// shut down, and re-enqueues it *before* returning it. Blocks while
    /// all slots are checked out by other leases in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::PoolClosed`] if the pool is torn down and
    /// [`ChannelError::ChannelAbsent`] if the slot was empty and a
    /// replacement could not be built.
    pub async fn get(&self) -> Result<Arc<Channel>, ChannelError> {
        let queue = self.queue.lock().clone().ok_or(ChannelError::PoolClosed)?;

        let permit = queue
            .available
            .acquire()
            .await
            .map_err(|_| ChannelError::PoolClosed)?;
        permit.forget();
        let mut handle = queue.entries.lock().pop_front().unwrap_or(None);

        if handle.as_ref().is_none_or(|channel| channel.is_closed()) {
            handle = self.build_channel().await;
        }

        // Re-enqueue before the caller sees the handle: shared lease.
        let returned = {
            let mut entries = queue.entries.lock();
            if queue.closed.load(Ordering::SeqCst) {
                false
            } else {
                entries.push_back(handle.clone());
                true
            }
        };
        if returned {
            queue.available.add_permits(1);
        } else if let Some(channel) = &handle {
            channel.close_on_err(&ChannelError::PoolClosed);
        }

        handle.ok_or(ChannelError::ChannelAbsent)
    }

    /// Whether the pool has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.queue.lock().is_none()
    }

    /// Tears the pool down: detaches the queue, releases the factory and
    /// config, wakes blocked leases with [`ChannelError::PoolClosed`], and
    /// closes every member still inside. Idempotent.
    pub fn close(&self) {
        let queue = self.queue.lock().take();
        *self.factory.lock() = None;
        *self.config.lock() = None;

        if let Some(queue) = queue {
            queue.available.close();
            let drained: Vec<_> = {
                let mut entries = queue.entries.lock();
                queue.closed.store(true, Ordering::SeqCst);
                entries.drain(..).collect()
            };
            for channel in drained.into_iter().flatten() {
                channel.close();
            }
        }
    }

    /// Dials one connection and wraps it in a channel.
    ///
    /// Returns `None` if the pool released its factory or the dial failed;
    /// the caller treats the slot as absent.
    async fn build_channel(&self) -> Option<Arc<Channel>> {
        let factory = self.factory.lock().clone()?;
        let config = self.config.lock().clone()?;
        match factory.connect().await {
            Ok(connection) => Some(Channel::new(connection, config)),
            Err(e) => {
                error!(error = %e, "create channel failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for ChannelPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelPool")
            .field("closed", &self.is_closed())
            .finish()
    }
}


// Made with Bob
