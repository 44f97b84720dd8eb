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

//! End-to-end call and cast behaviour over the in-process broker.

mod common;

use busrpc::bus::SyncSubscription;
use busrpc::{
    BusTransport, DispatchMode, MemoryBroker, RawMethod, RawParams, RpcClient, RpcError,
    RpcServer, TypeDescriptor, TypeKind,
};
use common::{SERVER_SUBJECT, client, eventually, hello_server, options};
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_returns_sum() {
    let broker = MemoryBroker::new();
    let (server, _) = hello_server(&broker).await;
    let client = client(&broker).await;

    let sum: i32 = client
        .call(SERVER_SUBJECT, "Add", (5i32, Box::new(3i32)))
        .await
        .unwrap();
    assert_eq!(sum, 8);

    let greeting: String = client
        .call(SERVER_SUBJECT, "Hello", ("world",))
        .await
        .unwrap();
    assert_eq!(greeting, "hello world");

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_error_is_remote() {
    let broker = MemoryBroker::new();
    let (server, _) = hello_server(&broker).await;
    let client = client(&broker).await;

    let err = client
        .call::<String, _>(SERVER_SUBJECT, "HelloError", ("world",))
        .await
        .unwrap_err();
    assert!(err.is_remote());
    assert!(matches!(err, RpcError::Remote { message } if message == "hello error"));

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cast_runs_without_response() {
    let broker = MemoryBroker::new();
    let (server, counters) = hello_server(&broker).await;
    let client = client(&broker).await;

    // Sees everything published to the client's reply subject.
    let mut spy = broker.subscribe_sync(client.subject()).await.unwrap();

    client.cast(SERVER_SUBJECT, "Ping", ()).await.unwrap();
    client.cast(SERVER_SUBJECT, "Bye", ()).await.unwrap();
    // A cast to a method that returns a value is still not answered.
    client
        .cast(SERVER_SUBJECT, "Hello", ("cast",))
        .await
        .unwrap();

    assert!(
        eventually(Duration::from_secs(2), || {
            counters.ping() == 1 && counters.bye() == 1 && counters.hello() == 1
        })
        .await
    );

    let err = spy
        .next_message(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(err.is_wait_expired());
    assert_eq!(client.pending_calls(), 0);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unit_method_called_times_out() {
    let broker = MemoryBroker::new();
    let (server, counters) = hello_server(&broker).await;
    let client = RpcClient::new(
        options(&broker).with_call_timeout(Duration::from_millis(150)),
    )
    .await;

    let err = client
        .call::<(), _>(SERVER_SUBJECT, "Ping", ())
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(counters.ping(), 1);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_late_response_is_discarded() {
    let broker = MemoryBroker::new();
    let server = RpcServer::new(options(&broker).with_subject("sluggish"));
    server
        .register_async("Sleep", |millis: u64| async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok::<u64, String>(millis)
        })
        .unwrap();
    server.start().await.unwrap();
    let client = RpcClient::new(
        options(&broker).with_call_timeout(Duration::from_millis(100)),
    )
    .await;

    let err = client
        .call::<u64, _>("sluggish", "Sleep", (300u64,))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(client.pending_calls(), 0);

    // The answer arrives with nobody waiting for it.
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(client.pending_calls(), 0);
    assert!(client.is_valid());

    let quick: u64 = client.call("sluggish", "Sleep", (1u64,)).await.unwrap();
    assert_eq!(quick, 1);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_method_times_out() {
    let broker = MemoryBroker::new();
    let (server, _) = hello_server(&broker).await;
    let client = RpcClient::new(
        options(&broker).with_call_timeout(Duration::from_millis(200)),
    )
    .await;

    let started = Instant::now();
    let err = client
        .call::<i32, _>(SERVER_SUBJECT, "Missing", (1i32,))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(&err, RpcError::Timeout { method, timeout }
        if method == "Missing" && *timeout == Duration::from_millis(200)));
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(2));
    assert_eq!(client.pending_calls(), 0);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wrong_arity_times_out() {
    let broker = MemoryBroker::new();
    let (server, _) = hello_server(&broker).await;
    let client = RpcClient::new(
        options(&broker).with_call_timeout(Duration::from_millis(150)),
    )
    .await;

    let err = client
        .call::<i32, _>(SERVER_SUBJECT, "Add", (5i32,))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    // The server is still healthy afterwards.
    let sum: i32 = client
        .call(SERVER_SUBJECT, "Add", (1i32, Box::new(2i32)))
        .await
        .unwrap();
    assert_eq!(sum, 3);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_undecodable_params_time_out() {
    let broker = MemoryBroker::new();
    let (server, _) = hello_server(&broker).await;
    let client = RpcClient::new(
        options(&broker).with_call_timeout(Duration::from_millis(150)),
    )
    .await;

    // Length prefix promises more bytes than follow.
    let err = client
        .call::<String, _>(SERVER_SUBJECT, "Hello", RawParams(vec![vec![0x20, b'a']]))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_get_their_own_results() {
    let broker = MemoryBroker::new();
    let server = RpcServer::new(options(&broker).with_subject("echo"));
    server
        .register_async("Echo", |value: u32, delay_ms: u64| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<u32, String>(value)
        })
        .unwrap();
    server.start().await.unwrap();

    let client = RpcClient::new(options(&broker).with_call_timeout(Duration::from_secs(5))).await;

    let mut calls = Vec::new();
    for value in 0..50u32 {
        let client = client.clone();
        // Later calls finish first.
        let delay_ms = u64::from(50 - value);
        calls.push(tokio::spawn(async move {
            let echoed: u32 = client.call("echo", "Echo", (value, delay_ms)).await.unwrap();
            (value, echoed)
        }));
    }

    for call in calls {
        let (value, echoed) = call.await.unwrap();
        assert_eq!(value, echoed);
    }
    assert_eq!(client.pending_calls(), 0);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_raw_method_and_raw_params() {
    let broker = MemoryBroker::new();
    let server = RpcServer::new(options(&broker).with_subject("raw"));
    let reverse = RawMethod::new(
        vec![TypeDescriptor::named("bytes", TypeKind::Value)],
        vec![
            TypeDescriptor::named("bytes", TypeKind::Value),
            TypeDescriptor::named("error", TypeKind::Error),
        ],
        |params: Vec<Vec<u8>>| async move {
            let mut bytes = params.into_iter().next()?;
            bytes.reverse();
            Some(Ok(bytes))
        },
    );
    server
        .register_method("Reverse", reverse, DispatchMode::Worker)
        .unwrap();
    server.start().await.unwrap();

    let client = client(&broker).await;
    // The result payload goes through the client codec: a postcard u8 is
    // its own byte.
    let byte: u8 = client
        .call("raw", "Reverse", RawParams(vec![vec![7]]))
        .await
        .unwrap();
    assert_eq!(byte, 7);

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[cfg(feature = "json")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_json_codec_end_to_end() {
    use busrpc::JsonCodec;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    let broker = MemoryBroker::new();
    let server = RpcServer::new(
        options(&broker)
            .with_codec(JsonCodec::new())
            .with_subject("geometry"),
    );
    server
        .register("Translate", |point: Point, dx: i32, dy: i32| async move {
            Ok::<Point, String>(Point {
                x: point.x + dx,
                y: point.y + dy,
            })
        })
        .unwrap();
    server.start().await.unwrap();

    let client = RpcClient::new(options(&broker).with_codec(JsonCodec::new())).await;
    let moved: Point = client
        .call("geometry", "Translate", (Point { x: 1, y: 2 }, 10, 20))
        .await
        .unwrap();
    assert_eq!(moved, Point { x: 11, y: 22 });

    // A postcard client cannot talk to a JSON server; the request is
    // dropped and the call times out.
    let mismatched = RpcClient::new(
        options(&broker).with_call_timeout(Duration::from_millis(150)),
    )
    .await;
    let err = mismatched
        .call::<Point, _>("geometry", "Translate", (Point { x: 1, y: 2 }, 10, 20))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    mismatched.close().await.unwrap();
    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_subject_generated_when_unset() {
    let broker = MemoryBroker::new();
    let server: RpcServer = RpcServer::new(options(&broker));
    server.register("Ping", || async {}).unwrap();
    server.start().await.unwrap();
    assert_eq!(broker.subscriber_count(server.subject()), 1);

    server.stop().await.unwrap();
    assert_eq!(broker.subscriber_count(server.subject()), 0);
}
