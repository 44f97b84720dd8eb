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

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use busrpc::{MemoryBroker, ResilientBus, RpcClient, RpcOptions, RpcServer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const SERVER_SUBJECT: &str = "hello_server";

/// Options over a fresh bus on `broker`. Each client and server gets its
/// own bus.
pub fn options(broker: &MemoryBroker) -> RpcOptions {
    RpcOptions::new(Arc::new(ResilientBus::new(broker.clone())))
        .with_call_timeout(Duration::from_millis(500))
}

/// Counts how often each hello method ran.
#[derive(Debug, Default)]
pub struct HelloCounters {
    pub hello: AtomicUsize,
    pub ping: AtomicUsize,
    pub bye: AtomicUsize,
}

impl HelloCounters {
    pub fn hello(&self) -> usize {
        self.hello.load(Ordering::SeqCst)
    }

    pub fn ping(&self) -> usize {
        self.ping.load(Ordering::SeqCst)
    }

    pub fn bye(&self) -> usize {
        self.bye.load(Ordering::SeqCst)
    }
}

/// Registers the hello service methods on `server`.
pub fn register_hello(server: &RpcServer, counters: &Arc<HelloCounters>) {
    let hits = Arc::clone(counters);
    server
        .register("Hello", move |name: String| {
            let hits = Arc::clone(&hits);
            async move {
                hits.hello.fetch_add(1, Ordering::SeqCst);
                Ok::<String, String>(format!("hello {name}"))
            }
        })
        .unwrap();

    server
        .register("HelloError", |_name: String| async {
            Err::<String, String>("hello error".to_string())
        })
        .unwrap();

    server
        .register("Add", |a: i32, b: Box<i32>| async move {
            Ok::<i32, String>(a + *b)
        })
        .unwrap();

    let hits = Arc::clone(counters);
    server
        .register("Ping", move || {
            let hits = Arc::clone(&hits);
            async move {
                hits.ping.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

    let hits = Arc::clone(counters);
    server
        .register_async("Bye", move || {
            let hits = Arc::clone(&hits);
            async move {
                hits.bye.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();
}

/// A started hello server on [`SERVER_SUBJECT`].
pub async fn hello_server(broker: &MemoryBroker) -> (RpcServer, Arc<HelloCounters>) {
    let server = RpcServer::new(options(broker).with_subject(SERVER_SUBJECT));
    let counters = Arc::new(HelloCounters::default());
    register_hello(&server, &counters);
    server.start().await.unwrap();
    (server, counters)
}

pub async fn client(broker: &MemoryBroker) -> RpcClient {
    RpcClient::new(options(broker)).await
}

/// Polls `condition` until it holds or `limit` passes.
pub async fn eventually(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
