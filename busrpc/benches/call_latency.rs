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

//! Call latency over the in-process broker.

use busrpc::{MemoryBroker, ResilientBus, RpcClient, RpcOptions, RpcServer};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn setup(rt: &Runtime) -> (RpcServer, RpcClient) {
    rt.block_on(async {
        let broker = MemoryBroker::new();
        let server = RpcServer::new(
            RpcOptions::new(Arc::new(ResilientBus::new(broker.clone()))).with_subject("bench"),
        );
        server
            .register("Echo", |data: Vec<u8>| async move { Ok::<Vec<u8>, String>(data) })
            .unwrap();
        server
            .register_async("EchoAsync", |data: Vec<u8>| async move {
                Ok::<Vec<u8>, String>(data)
            })
            .unwrap();
        server.register("Sink", |_data: Vec<u8>| async {}).unwrap();
        server.start().await.unwrap();

        let client = RpcClient::new(RpcOptions::new(Arc::new(ResilientBus::new(broker)))).await;
        (server, client)
    })
}

/// Round trip of a synchronous method.
fn bench_call(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (server, client) = setup(&rt);
    let mut group = c.benchmark_group("call");

    for size in [16usize, 1024, 16 * 1024] {
        let payload = vec![0xa5u8; size];
        group.bench_with_input(BenchmarkId::new("sync", size), &payload, |b, payload| {
            b.to_async(&rt).iter(|| async {
                let echoed: Vec<u8> = client.call("bench", "Echo", (payload,)).await.unwrap();
                echoed
            });
        });
        group.bench_with_input(BenchmarkId::new("worker", size), &payload, |b, payload| {
            b.to_async(&rt).iter(|| async {
                let echoed: Vec<u8> = client
                    .call("bench", "EchoAsync", (payload,))
                    .await
                    .unwrap();
                echoed
            });
        });
    }

    group.finish();
    rt.block_on(async {
        client.close().await.unwrap();
        server.stop().await.unwrap();
    });
}

/// Publish cost of a cast; no response is awaited.
fn bench_cast(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (server, client) = setup(&rt);
    let payload = vec![0u8; 1024];

    c.bench_function("cast_1024", |b| {
        b.to_async(&rt)
            .iter(|| async { client.cast("bench", "Sink", (&payload,)).await.unwrap() });
    });

    rt.block_on(async {
        client.close().await.unwrap();
        server.stop().await.unwrap();
    });
}

criterion_group!(benches, bench_call, bench_cast);
criterion_main!(benches);
