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

//! The client-side endpoint facade.

use super::EndpointConfig;
use crate::channel::{ChannelError, ChannelPool};
use crate::protocol::{
    build_heartbeat, message_from_request, response_from_message, GROUP_KEY,
};
use crate::rpc::{Exception, Request, Response};
use crate::serialization::{JsonSerialization, Serialization};
use crate::transport::{ConnectionFactory, TcpConnectionFactory};
use crate::url::{Url, CONNECT_TIMEOUT_KEY, GZIP_SIZE_KEY, REQUEST_TIMEOUT_KEY};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use tokio::sync::watch;
use tokio::time::{interval, Instant};
use tracing::{error, info};

/// Shared template for the placeholder handed to asynchronous callers.
///
/// Callers receive a clone per call and must treat the placeholder as
/// carrying no result; the real response arrives through the done sink.
static DEFAULT_ASYNC_RESPONSE: LazyLock<Response> = LazyLock::new(Response::default);

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

struct Inner {
    url: RwLock<Url>,
    config: EndpointConfig,
    channels: Mutex<Option<Arc<ChannelPool>>>,
    available: RwLock<bool>,
    error_count: AtomicU32,
    keepalive_id: AtomicU64,
    proxy: AtomicBool,
    serialization: Mutex<Arc<dyn Serialization>>,
    destroy_tx: watch::Sender<bool>,
}

/// A client-side handle to one remote motan service instance.
///
/// The endpoint multiplexes calls over a pooled set of channels, converts
/// every failure into an exception-carrying [`Response`] (a call never
/// returns `Err`), and tracks its own availability: after
/// `error_count_threshold` consecutive failures it marks itself
/// unavailable and probes the remote with heartbeats until one succeeds.
/// Upstream load balancers consult [`is_available`](MotanEndpoint::is_available)
/// to route around an endpoint that is probing.
///
/// `MotanEndpoint` is a cheap clone over shared state; the clone handed to
/// background tasks observes the same pool, counters, and destroy signal.
#[derive(Clone)]
pub struct MotanEndpoint {
    inner: Arc<Inner>,
}

impl MotanEndpoint {
    /// Creates an endpoint for the given URL.
    ///
    /// The endpoint is unavailable until [`initialize`](MotanEndpoint::initialize)
    /// builds the channel pool.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails validation.
    #[must_use]
    pub fn new(url: Url, config: EndpointConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid endpoint configuration: {e}");
        }
        let (destroy_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                url: RwLock::new(url),
                config,
                channels: Mutex::new(None),
                available: RwLock::new(false),
                error_count: AtomicU32::new(0),
                keepalive_id: AtomicU64::new(0),
                proxy: AtomicBool::new(false),
                serialization: Mutex::new(Arc::new(JsonSerialization)),
                destroy_tx,
            }),
        }
    }

    /// The endpoint's registered name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        "motanEndpoint"
    }

    /// A snapshot of the endpoint's URL.
    #[must_use]
    pub fn url(&self) -> Url {
        self.inner.url.read().clone()
    }

    /// Replaces the endpoint's URL. Takes effect on subsequent calls; the
    /// existing pool keeps its original address until rebuilt.
    pub fn set_url(&self, url: Url) {
        *self.inner.url.write() = url;
    }

    /// Replaces the serializer used to encode requests and decode replies.
    ///
    /// Every call also registers it in the request context's extension
    /// registry, so the reader task resolves asynchronous replies to the
    /// same serializer by wire number. Configure before
    /// [`initialize`](MotanEndpoint::initialize).
    pub fn set_serialization(&self, serialization: Arc<dyn Serialization>) {
        *self.inner.serialization.lock() = serialization;
    }

    /// Sets the proxy flag copied into every call's context and reply
    /// header. Configure before [`initialize`](MotanEndpoint::initialize).
    pub fn set_proxy(&self, proxy: bool) {
        self.inner.proxy.store(proxy, Ordering::Relaxed);
    }

    /// Whether the endpoint currently considers itself callable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        *self.inner.available.read()
    }

    fn set_available(&self, available: bool) {
        *self.inner.available.write() = available;
    }

    /// Builds the channel pool.
    ///
    /// On success the endpoint becomes available. On failure a background
    /// task retries the build on the configured reconnect interval until it
    /// succeeds or the endpoint is destroyed.
    pub async fn initialize(&self) {
        let url = self.url();
        let connect_timeout =
            url.get_duration_ms(CONNECT_TIMEOUT_KEY, self.inner.config.connect_timeout);
        let factory: Arc<dyn ConnectionFactory> = Arc::new(TcpConnectionFactory::new(
            url.address(),
            connect_timeout,
        ));

        match self.build_pool(&factory).await {
            Ok(()) => {}
            Err(e) => {
                error!(url = %url.identity(), error = %e, "channel pool init failed");
                self.spawn_initialize_retry(factory);
            }
        }
    }

    async fn build_pool(&self, factory: &Arc<dyn ConnectionFactory>) -> Result<(), ChannelError> {
        let pool = ChannelPool::new(
            self.inner.config.pool_size,
            Arc::clone(factory),
            self.inner.config.channel.clone(),
        )
        .await?;
        *self.inner.channels.lock() = Some(Arc::new(pool));
        self.set_available(true);
        Ok(())
    }

    fn spawn_initialize_retry(&self, factory: Arc<dyn ConnectionFactory>) {
        let endpoint = self.clone();
        let mut destroy = self.inner.destroy_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = interval(endpoint.inner.config.reconnect_interval);
            // The first interval tick completes immediately; the retry
            // cadence starts one full interval out.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if endpoint.build_pool(&factory).await.is_ok() {
                            return;
                        }
                    }
                    _ = wait_for_true(&mut destroy) => return,
                }
            }
        });
    }

    /// Performs one call.
    ///
    /// Never fails with an `Err`: transport and timeout failures come back
    /// as code-400 exception responses and count toward the error
    /// threshold; codec failures come back as code-500 without counting.
    /// An asynchronous call returns the shared async placeholder
    /// immediately and the reply arrives through the request's done sink.
    pub async fn call(&self, mut request: Request) -> Response {
        let ctx = request.context();
        ctx.set_proxy(self.inner.proxy.load(Ordering::Relaxed));
        let url = self.url();
        ctx.set_gzip_size(url.get_int(GZIP_SIZE_KEY, 0));

        let Some(pool) = self.inner.channels.lock().clone() else {
            error!("endpoint error: channel pool is not initialized");
            self.record_err_and_keepalive();
            return self.default_err_response(&request, "endpoint error: channels is null");
        };

        let start = Instant::now();
        if let Some(result) = ctx.result() {
            result.mark_started();
        }

        let channel = match pool.get().await {
            Ok(channel) => channel,
            Err(e) => {
                error!(error = %e, "endpoint error: can not get a channel");
                self.record_err_and_keepalive();
                return self.default_err_response(&request, "can not get a channel");
            }
        };

        let deadline =
            url.get_duration_ms(REQUEST_TIMEOUT_KEY, self.inner.config.request_timeout);

        // The URL's group wins over a stale group attachment.
        if !url.group.is_empty() && request.group() != Some(url.group.as_str()) {
            request.set_attachment(GROUP_KEY, url.group.clone());
        }

        let serialization = self.inner.serialization.lock().clone();
        // The reply resolves its serializer by wire number; make sure the
        // configured one is reachable from the context's registry.
        ctx.extensions().register(Arc::clone(&serialization));
        let message = match message_from_request(&request, serialization.as_ref()) {
            Ok(message) => message,
            Err(e) => {
                error!(
                    service = %request.service,
                    method = %request.method,
                    error = %e,
                    "convert request to message failed"
                );
                return Response::from_exception(
                    request.request_id,
                    Exception::service(500, "convert motan request fail!"),
                );
            }
        };

        let reply = match channel.call(message, deadline, Some(Arc::clone(&ctx))).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "endpoint call error");
                self.record_err_and_keepalive();
                return self.default_err_response(&request, &format!("channel call error: {e}"));
            }
        };

        self.reset_err();

        if ctx.async_call {
            return DEFAULT_ASYNC_RESPONSE.clone();
        }

        let Some(mut reply) = reply else {
            // A synchronous channel call always yields a message; an empty
            // reply here is a dispatch bug, not a remote failure.
            error!("synchronous call returned no reply message");
            return self.default_err_response(&request, "missing reply message");
        };
        reply.header.set_proxy(self.inner.proxy.load(Ordering::Relaxed));
        match response_from_message(reply, serialization.as_ref()) {
            Ok(mut response) => {
                response.process_deserializable(ctx.reply());
                response.process_time_ms = start.elapsed().as_millis() as u64;
                response
            }
            Err(e) => {
                error!(
                    service = %request.service,
                    error = %e,
                    "convert to response failed"
                );
                Response::from_exception(
                    request.request_id,
                    Exception::service(500, format!("convert response fail! {e}")),
                )
            }
        }
    }

    /// Destroys the endpoint: marks it unavailable, signals the retry and
    /// keepalive tasks, and closes the pool. Safe to call repeatedly.
    pub fn destroy(&self) {
        self.set_available(false);
        let _ = self.inner.destroy_tx.send(true);
        if let Some(pool) = self.inner.channels.lock().clone() {
            info!(url = %self.url().identity(), "motan endpoint will be destroyed");
            pool.close();
        }
    }

    /// Counts one failure; on the exact threshold crossing, flips the
    /// endpoint unavailable and spawns the keepalive prober.
    fn record_err_and_keepalive(&self) {
        let count = self.inner.error_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count == self.inner.config.error_count_threshold {
            self.set_available(false);
            info!(url = %self.url().identity(), "endpoint disabled after consecutive failures");
            self.spawn_keepalive();
        }
    }

    fn reset_err(&self) {
        self.inner.error_count.store(0, Ordering::SeqCst);
    }

    /// Current consecutive-failure count.
    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.inner.error_count.load(Ordering::SeqCst)
    }

    fn spawn_keepalive(&self) {
        let endpoint = self.clone();
        let mut destroy = self.inner.destroy_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = interval(endpoint.inner.config.keepalive_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if endpoint.probe().await {
                            return;
                        }
                    }
                    _ = wait_for_true(&mut destroy) => return,
                }
            }
        });
    }

    /// Sends one heartbeat; returns true once the endpoint is available
    /// again.
    async fn probe(&self) -> bool {
        let keepalive_id = self.inner.keepalive_id.fetch_add(1, Ordering::SeqCst) + 1;
        info!(request_id = keepalive_id, "sending keepalive heartbeat");

        let Some(pool) = self.inner.channels.lock().clone() else {
            return false;
        };
        let channel = match pool.get().await {
            Ok(channel) => channel,
            Err(e) => {
                info!(error = %e, "keepalive lease failed");
                return false;
            }
        };
        match channel
            .call(
                build_heartbeat(keepalive_id),
                self.inner.config.request_timeout,
                None,
            )
            .await
        {
            Ok(_) => {
                self.set_available(true);
                info!("heartbeat success");
                true
            }
            Err(e) => {
                info!(error = %e, "heartbeat failed");
                false
            }
        }
    }

    fn default_err_response(&self, request: &Request, message: &str) -> Response {
        Response::from_exception(request.request_id, Exception::service(400, message))
    }
}

impl std::fmt::Debug for MotanEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotanEndpoint")
            .field("url", &self.inner.url.read().identity())
            .field("available", &self.is_available())
            .field("error_count", &self.error_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_literal() {
        let endpoint = MotanEndpoint::new(Url::new("127.0.0.1", 1), EndpointConfig::default());
        assert_eq!(endpoint.name(), "motanEndpoint");
    }

    #[test]
    fn test_starts_unavailable() {
        let endpoint = MotanEndpoint::new(Url::new("127.0.0.1", 1), EndpointConfig::default());
        assert!(!endpoint.is_available());
        assert_eq!(endpoint.error_count(), 0);
    }

    #[test]
    #[should_panic(expected = "invalid endpoint configuration")]
    fn test_invalid_config_panics() {
        let _ = MotanEndpoint::new(
            Url::new("127.0.0.1", 1),
            EndpointConfig::default().with_pool_size(0),
        );
    }

    #[tokio::test]
    async fn test_call_without_pool_is_code_400() {
        let endpoint = MotanEndpoint::new(Url::new("127.0.0.1", 1), EndpointConfig::default());
        let response = endpoint.call(Request::new("svc", "m")).await;
        let exception = response.exception.expect("expected exception response");
        assert_eq!(exception.code, 400);
        assert_eq!(endpoint.error_count(), 1);
    }

    #[test]
    fn test_set_url_replaces_snapshot() {
        let endpoint = MotanEndpoint::new(Url::new("127.0.0.1", 1), EndpointConfig::default());
        endpoint.set_url(Url::new("10.0.0.9", 8002).with_group("g2"));
        assert_eq!(endpoint.url().address(), "10.0.0.9:8002");
        assert_eq!(endpoint.url().group, "g2");
    }
}

// Made with Bob
