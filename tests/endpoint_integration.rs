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

//! End-to-end endpoint tests against a loopback motan server: concurrent
//! round trips, timeouts, availability accounting, pool repair, async
//! dispatch, and destroy semantics.

mod common;

use common::MockServer;
use motan_endpoint::endpoint::{EndpointConfig, MotanEndpoint};
use motan_endpoint::rpc::Request;
use motan_endpoint::serialization::{Serialization, SerializationError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// JSON with the byte order flipped, under its own wire number. Decoding
/// it with the plain JSON serializer fails, so a reply that round-trips
/// proves the configured serializer was resolved, not the default.
#[derive(Debug, Clone, Copy)]
struct ReversedJsonSerialization;

impl Serialization for ReversedJsonSerialization {
    fn number(&self) -> u8 {
        9
    }

    fn name(&self) -> &'static str {
        "reversed-json"
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = serde_json::to_vec(value).map_err(|e| SerializationError::Serialize {
            reason: e.to_string(),
        })?;
        bytes.reverse();
        Ok(bytes)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializationError> {
        let mut bytes = bytes.to_vec();
        bytes.reverse();
        serde_json::from_slice(&bytes).map_err(|e| SerializationError::Deserialize {
            reason: e.to_string(),
        })
    }
}

fn echo_request(id: u64, payload: &str) -> Request {
    Request::new("com.example.EchoService", "echo")
        .with_request_id(id)
        .with_argument(json!(payload))
}

async fn ready_endpoint(server: &MockServer, config: EndpointConfig) -> MotanEndpoint {
    let endpoint = MotanEndpoint::new(server.url().with_group("test-group"), config);
    endpoint.initialize().await;
    assert!(endpoint.is_available(), "endpoint failed to initialize");
    endpoint
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_return_matching_payloads() {
    let server = MockServer::start().await;
    let endpoint = MotanEndpoint::new(
        server
            .url()
            .with_group("test-group")
            .with_parameter("requestTimeout", "5000"),
        EndpointConfig::default(),
    );
    endpoint.initialize().await;
    assert!(endpoint.is_available());

    let mut handles = Vec::new();
    for i in 0..1000u64 {
        let endpoint = endpoint.clone();
        handles.push(tokio::spawn(async move {
            let response = endpoint.call(echo_request(10_000 + i, &format!("payload-{i}"))).await;
            (i, response)
        }));
    }

    for handle in handles {
        let (i, response) = handle.await.unwrap();
        assert!(
            response.exception.is_none(),
            "call {i} failed: {:?}",
            response.exception
        );
        assert_eq!(response.request_id, 10_000 + i);
        assert_eq!(response.value, Some(json!([format!("payload-{i}")])));
    }

    assert_eq!(endpoint.error_count(), 0);
    assert!(endpoint.is_available());
    // Pool of three connections served all thousand calls.
    assert_eq!(server.accepted(), 3);
    endpoint.destroy();
}

#[tokio::test]
async fn test_auto_assigned_id_round_trips_to_zero() {
    let server = MockServer::start().await;
    let endpoint = ready_endpoint(&server, EndpointConfig::default()).await;

    // The wire carries a generated id; the caller still sees its own.
    let response = endpoint
        .call(Request::new("svc", "echo").with_argument(json!("auto")))
        .await;
    assert!(response.exception.is_none());
    assert_eq!(response.request_id, 0);
    assert_eq!(response.value, Some(json!(["auto"])));
    endpoint.destroy();
}

#[tokio::test]
async fn test_group_attachment_follows_url() {
    let server = MockServer::start().await;
    let endpoint = ready_endpoint(&server, EndpointConfig::default()).await;

    let response = endpoint
        .call(echo_request(1, "x").with_attachment("M_g", "stale-group"))
        .await;
    assert!(response.exception.is_none());
    // The echo server reflects the metadata the endpoint actually sent.
    assert_eq!(
        response.attachments.get("M_g").map(String::as_str),
        Some("test-group")
    );
    endpoint.destroy();
}

#[tokio::test]
async fn test_timeout_is_code_400_and_counted() {
    let server = MockServer::start().await;
    server.set_responding(false);

    let endpoint = MotanEndpoint::new(
        server
            .url()
            .with_group("test-group")
            .with_parameter("requestTimeout", "50"),
        EndpointConfig::default(),
    );
    endpoint.initialize().await;
    assert!(endpoint.is_available());

    let start = Instant::now();
    let response = endpoint.call(echo_request(1, "x")).await;
    let elapsed = start.elapsed();

    let exception = response.exception.expect("expected exception response");
    assert_eq!(exception.code, 400);
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(1000));
    assert_eq!(endpoint.error_count(), 1);
    endpoint.destroy();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_availability_flips_and_heartbeat_recovers() {
    let server = MockServer::start().await;
    server.set_responding(false);

    let config = EndpointConfig::default()
        .with_request_timeout(Duration::from_millis(100))
        .with_keepalive_interval(Duration::from_millis(100));
    let endpoint = MotanEndpoint::new(
        server
            .url()
            .with_group("test-group")
            .with_parameter("requestTimeout", "50"),
        config,
    );
    endpoint.initialize().await;
    assert!(endpoint.is_available());

    // Ten consecutive failures cross the threshold exactly once.
    for i in 0..10u64 {
        let response = endpoint.call(echo_request(i + 1, "x")).await;
        assert!(response.exception.is_some());
    }
    assert!(!endpoint.is_available());
    assert_eq!(endpoint.error_count(), 10);

    // Further failures while disabled spawn no second prober and keep the
    // endpoint down.
    for i in 0..3u64 {
        let _ = endpoint.call(echo_request(100 + i, "x")).await;
    }
    assert!(!endpoint.is_available());

    // Once the remote answers heartbeats, one probe restores availability.
    server.set_responding(true);
    let deadline = Instant::now() + Duration::from_secs(3);
    while !endpoint.is_available() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(endpoint.is_available(), "heartbeat did not restore endpoint");

    // The next successful call resets the failure counter.
    let response = endpoint.call(echo_request(999, "back")).await;
    assert!(response.exception.is_none());
    assert_eq!(endpoint.error_count(), 0);
    endpoint.destroy();
}

#[tokio::test]
async fn test_killed_connection_is_replaced_on_lease() {
    let server = MockServer::start().await;
    let endpoint = ready_endpoint(&server, EndpointConfig::default()).await;
    assert_eq!(server.accepted(), 3);

    for i in 0..9u64 {
        let response = endpoint.call(echo_request(i + 1, "warm")).await;
        assert!(response.exception.is_none());
    }

    assert!(server.kill_one_connection());
    // Let the dead channel observe the failure and shut itself down.
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Every slot gets leased again; the dead one is rebuilt in place and
    // all calls succeed.
    for i in 0..9u64 {
        let response = endpoint.call(echo_request(100 + i, "after")).await;
        assert!(
            response.exception.is_none(),
            "call {i} after kill failed: {:?}",
            response.exception
        );
    }
    assert_eq!(endpoint.error_count(), 0);
    assert_eq!(server.accepted(), 4);
    endpoint.destroy();
}

#[tokio::test]
async fn test_async_call_completes_done_sink() {
    let server = MockServer::start().await;
    let endpoint = ready_endpoint(&server, EndpointConfig::default()).await;

    let (request, done) = Request::new("com.example.EchoService", "echo")
        .with_request_id(42)
        .with_argument(json!("async-req"))
        .into_async();

    let start = Instant::now();
    let placeholder = endpoint.call(request).await;
    // The placeholder comes back without waiting for the reply.
    assert!(start.elapsed() < Duration::from_millis(500));
    assert!(placeholder.exception.is_none());
    assert!(placeholder.value.is_none());

    let response = done
        .await
        .expect("done sink completed")
        .expect("async call succeeded");
    assert_eq!(response.request_id, 42);
    assert_eq!(response.value, Some(json!(["async-req"])));
    assert_eq!(endpoint.error_count(), 0);
    endpoint.destroy();
}

#[tokio::test]
async fn test_async_call_resolves_configured_serialization() {
    let server = MockServer::start().await;
    let endpoint = MotanEndpoint::new(
        server.url().with_group("test-group"),
        EndpointConfig::default(),
    );
    endpoint.set_serialization(Arc::new(ReversedJsonSerialization));
    endpoint.initialize().await;
    assert!(endpoint.is_available());

    // Synchronous calls already decode with the configured serializer.
    let response = endpoint.call(echo_request(7, "sync-wire")).await;
    assert!(response.exception.is_none());
    assert_eq!(response.value, Some(json!(["sync-wire"])));

    // The async reply carries wire number 9; the done sink must receive
    // the decoded value, not an unknown-serialization exception.
    let (request, done) = Request::new("com.example.EchoService", "echo")
        .with_request_id(43)
        .with_argument(json!("custom-wire"))
        .into_async();
    let placeholder = endpoint.call(request).await;
    assert!(placeholder.exception.is_none());

    let response = done
        .await
        .expect("done sink completed")
        .expect("async call decoded with configured serializer");
    assert_eq!(response.request_id, 43);
    assert_eq!(response.value, Some(json!(["custom-wire"])));
    assert_eq!(endpoint.error_count(), 0);
    endpoint.destroy();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_destroy_unblocks_in_flight_calls() {
    let server = MockServer::start().await;
    server.set_responding(false);

    let endpoint = MotanEndpoint::new(
        server
            .url()
            .with_group("test-group")
            .with_parameter("requestTimeout", "5000"),
        EndpointConfig::default(),
    );
    endpoint.initialize().await;
    assert!(endpoint.is_available());

    let mut handles = Vec::new();
    for i in 0..100u64 {
        let endpoint = endpoint.clone();
        handles.push(tokio::spawn(async move {
            endpoint.call(echo_request(i + 1, "blocked")).await
        }));
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    endpoint.destroy();

    let all_done = async {
        for handle in handles {
            let response = handle.await.unwrap();
            let exception = response.exception.expect("blocked call must error");
            assert_eq!(exception.code, 400);
        }
    };
    tokio::time::timeout(Duration::from_secs(2), all_done)
        .await
        .expect("blocked calls did not unblock after destroy");

    assert!(!endpoint.is_available());

    // Calls after destroy keep failing fast with error responses.
    let response = endpoint.call(echo_request(7777, "late")).await;
    assert_eq!(response.exception.unwrap().code, 400);
}

#[tokio::test]
async fn test_initialize_retry_recovers_when_server_appears() {
    // Reserve an address, then release it so the first initialize fails.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = EndpointConfig::default()
        .with_reconnect_interval(Duration::from_millis(200));
    let endpoint = MotanEndpoint::new(
        motan_endpoint::url::Url::new("127.0.0.1", addr.port()),
        config,
    );
    endpoint.initialize().await;
    assert!(!endpoint.is_available());

    // Bring a server up on the reserved port; the retry task installs the
    // pool on its next tick.
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let _socket = socket;
                std::future::pending::<()>().await;
            });
        }
    });

    let deadline = Instant::now() + Duration::from_secs(3);
    while !endpoint.is_available() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(endpoint.is_available(), "initialize retry did not recover");
    endpoint.destroy();
}
