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

//! # Hello Service
//!
//! A small service with a typed client wrapper, the shape a code generator
//! would produce for it:
//!
//! - `HelloService` is the server-side implementation.
//! - `register_hello_service` wires each method onto an [`RpcServer`].
//! - `HelloServiceClient` gives each method a typed call that takes the
//!   server subject first.
//!
//! Arguments travel as JSON so they are readable in `trace` logs.
//!
//! ## Running This Example
//!
//! ```bash
//! RUST_LOG=busrpc=debug cargo run --example hello_service
//! ```

use busrpc::{
    JsonCodec, MemoryBroker, ResilientBus, RpcClient, RpcError, RpcOptions, RpcServer,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SUBJECT: &str = "hello_server";

#[derive(Debug, Default)]
struct HelloService;

impl HelloService {
    async fn hello(&self, name: String) -> Result<String, String> {
        Ok(format!("hello {name}"))
    }

    async fn hello_error(&self, name: String) -> Result<String, String> {
        Err(format!("no greeting for {name}"))
    }

    async fn add(&self, a: i32, b: Box<i32>) -> Result<i32, String> {
        Ok(a + *b)
    }

    async fn ping(&self) {
        tracing::info!("ping");
    }

    async fn bye(&self) {
        tracing::info!("bye");
    }
}

fn register_hello_service(
    server: &RpcServer<JsonCodec>,
    service: Arc<HelloService>,
) -> Result<(), RpcError> {
    let svc = Arc::clone(&service);
    server.register("Hello", move |name: String| {
        let svc = Arc::clone(&svc);
        async move { svc.hello(name).await }
    })?;

    let svc = Arc::clone(&service);
    server.register("HelloError", move |name: String| {
        let svc = Arc::clone(&svc);
        async move { svc.hello_error(name).await }
    })?;

    let svc = Arc::clone(&service);
    server.register("Add", move |a: i32, b: Box<i32>| {
        let svc = Arc::clone(&svc);
        async move { svc.add(a, b).await }
    })?;

    let svc = Arc::clone(&service);
    server.register("Ping", move || {
        let svc = Arc::clone(&svc);
        async move { svc.ping().await }
    })?;

    let svc = service;
    server.register_async("Bye", move || {
        let svc = Arc::clone(&svc);
        async move { svc.bye().await }
    })?;
    Ok(())
}

#[derive(Clone, Debug)]
struct HelloServiceClient {
    client: RpcClient<JsonCodec>,
}

impl HelloServiceClient {
    fn new(client: RpcClient<JsonCodec>) -> Self {
        Self { client }
    }

    async fn hello(&self, subject: &str, name: &str) -> Result<String, RpcError> {
        self.client.call(subject, "Hello", (name,)).await
    }

    async fn hello_error(&self, subject: &str, name: &str) -> Result<String, RpcError> {
        self.client.call(subject, "HelloError", (name,)).await
    }

    async fn add(&self, subject: &str, a: i32, b: i32) -> Result<i32, RpcError> {
        self.client.call(subject, "Add", (a, Box::new(b))).await
    }

    async fn ping(&self, subject: &str) -> Result<(), RpcError> {
        self.client.cast(subject, "Ping", ()).await
    }

    async fn bye(&self, subject: &str) -> Result<(), RpcError> {
        self.client.cast(subject, "Bye", ()).await
    }

    async fn close(&self) -> Result<(), RpcError> {
        self.client.close().await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let broker = MemoryBroker::new();
    let options = |broker: &MemoryBroker| {
        RpcOptions::new(Arc::new(ResilientBus::new(broker.clone())))
            .with_codec(JsonCodec::new())
            .with_call_timeout(Duration::from_secs(1))
    };

    let server = RpcServer::new(options(&broker).with_subject(SUBJECT));
    register_hello_service(&server, Arc::new(HelloService))?;
    server.start().await?;
    println!("Server listening on {} ({:?})", server.subject(), server.method_names());

    let client = HelloServiceClient::new(RpcClient::new(options(&broker)).await);

    println!("Hello      -> {}", client.hello(SUBJECT, "world").await?);
    match client.hello_error(SUBJECT, "world").await {
        Ok(reply) => println!("HelloError -> unexpected {reply}"),
        Err(err) => println!("HelloError -> {err}"),
    }
    println!("Add(5, 3)  -> {}", client.add(SUBJECT, 5, 3).await?);

    client.ping(SUBJECT).await?;
    client.bye(SUBJECT).await?;

    match client.add("nobody_home", 1, 1).await {
        Ok(sum) => println!("Add on empty subject -> unexpected {sum}"),
        Err(err) => println!("Add on empty subject -> {err}"),
    }

    client.close().await?;
    server.stop().await?;
    Ok(())
}
