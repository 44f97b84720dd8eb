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

//! The RPC server.

use crate::bus::{BusCallback, BusError, MessageBus};
use crate::codec::{Codec, PostcardCodec};
use crate::config::RpcOptions;
use crate::error::RpcError;
use crate::protocol::{Request, Response};
use crate::server::handler::{Handler, HandlerOutput, RawMethod, Reply, TypedMethod};
use crate::server::inflight::InflightTracker;
use crate::server::registry::{DispatchMode, MethodRecord, MethodRegistry};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn};

/// Exposes registered methods on one bus subject.
///
/// Requests arriving on the subject are decoded, matched to a method by
/// name, checked for arity, and run. Methods registered with
/// [`register`](Self::register) are awaited by the delivery task, so
/// requests are served one at a time; methods registered with
/// [`register_async`](Self::register_async) run on their own task. A
/// panicking handler loses only its own request.
///
/// Requests that cannot be served (malformed envelope, unknown method,
/// wrong parameter count, undecodable parameter) are logged and dropped.
/// The caller sees a timeout.
///
/// Dropping the last clone of a started server unsubscribes it without
/// draining; [`stop`](Self::stop) drains.
///
/// # Examples
///
/// ```rust,no_run
/// use busrpc::{MemoryBroker, ResilientBus, RpcOptions, RpcServer};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), busrpc::RpcError> {
/// let bus = Arc::new(ResilientBus::new(MemoryBroker::new()));
/// let server = RpcServer::new(RpcOptions::new(bus).with_subject("hello"));
///
/// server.register("Add", |a: i32, b: i32| async move { Ok::<i32, String>(a + b) })?;
/// server.start().await?;
///
/// // ... serve ...
///
/// server.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct RpcServer<C: Codec = PostcardCodec> {
    inner: Arc<ServerInner<C>>,
    handle: Arc<LastHandle<C>>,
}

struct ServerInner<C: Codec> {
    codec: Arc<C>,
    bus: Arc<dyn MessageBus>,
    subject: String,
    registry: RwLock<MethodRegistry<C>>,
    inflight: Arc<InflightTracker>,
    running: AtomicBool,
}

/// Shared only by user-facing clones; the subscription holds `inner` alone.
struct LastHandle<C: Codec> {
    inner: Arc<ServerInner<C>>,
}

impl<C: Codec> Drop for LastHandle<C> {
    fn drop(&mut self) {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(subject = %self.inner.subject, "server dropped outside a runtime while subscribed");
            return;
        };
        let bus = Arc::clone(&self.inner.bus);
        let subject = self.inner.subject.clone();
        runtime.spawn(async move {
            if let Err(err) = bus.unsubscribe().await {
                debug!(subject = %subject, error = %err, "unsubscribe after last server handle dropped");
            }
        });
    }
}

impl<C: Codec> RpcServer<C> {
    /// Creates a server. Without an explicit subject, one is generated by
    /// the bus.
    pub fn new(options: RpcOptions<C>) -> Self {
        let subject = options.resolve_subject();
        let RpcOptions { codec, bus, .. } = options;
        let inner = Arc::new(ServerInner {
            codec: Arc::new(codec),
            bus,
            subject,
            registry: RwLock::new(MethodRegistry::new()),
            inflight: InflightTracker::new(),
            running: AtomicBool::new(false),
        });
        Self {
            handle: Arc::new(LastHandle {
                inner: Arc::clone(&inner),
            }),
            inner,
        }
    }

    /// The subject the server listens on.
    pub fn subject(&self) -> &str {
        &self.inner.subject
    }

    /// Registers a method the delivery task awaits before the next request.
    ///
    /// # Errors
    ///
    /// - [`RpcError::DuplicateMethod`] if `name` is taken.
    /// - [`RpcError::UnsuitableMethod`] if the signature is not servable.
    pub fn register<H, Args>(&self, name: impl Into<String>, handler: H) -> Result<(), RpcError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.register_typed(name.into(), handler, DispatchMode::Synchronous)
    }

    /// Registers a method that runs on its own task per request.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_async<H, Args>(
        &self,
        name: impl Into<String>,
        handler: H,
    ) -> Result<(), RpcError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.register_typed(name.into(), handler, DispatchMode::Worker)
    }

    /// Registers a [`RawMethod`] with the given dispatch mode.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register); the raw method's declared
    /// return types are checked.
    pub fn register_method(
        &self,
        name: impl Into<String>,
        method: RawMethod,
        mode: DispatchMode,
    ) -> Result<(), RpcError> {
        let parameter_types = method.parameter_types().to_vec();
        let return_types = method.return_types().to_vec();
        self.insert(MethodRecord::new(
            name.into(),
            Arc::new(method),
            parameter_types,
            return_types,
            mode,
        ))
    }

    fn register_typed<H, Args>(
        &self,
        name: String,
        handler: H,
        mode: DispatchMode,
    ) -> Result<(), RpcError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let parameter_types = H::parameter_types();
        let return_types = <H::Output as HandlerOutput>::return_types();
        self.insert(MethodRecord::new(
            name,
            Arc::new(TypedMethod::new(handler)),
            parameter_types,
            return_types,
            mode,
        ))
    }

    fn insert(&self, record: MethodRecord<C>) -> Result<(), RpcError> {
        let name = record.name().to_string();
        match self.inner.registry.write().insert(record) {
            Ok(()) => {
                debug!(subject = %self.inner.subject, method = %name, "registered method");
                Ok(())
            }
            Err(err) => {
                warn!(subject = %self.inner.subject, method = %name, error = %err, "registration rejected");
                Err(err)
            }
        }
    }

    /// Names of all registered methods, sorted.
    pub fn method_names(&self) -> Vec<String> {
        self.inner.registry.read().names()
    }

    /// Looks up a registered method.
    pub fn method(&self, name: &str) -> Option<Arc<MethodRecord<C>>> {
        self.inner.lookup(name)
    }

    /// Number of dispatches currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.inflight.count()
    }

    /// Subscribes to the server subject and begins dispatching.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] if the subscription fails, including
    /// when the bus already carries a subscription.
    pub async fn start(&self) -> Result<(), RpcError> {
        let callback: Arc<dyn BusCallback> = self.inner.clone();
        self.inner.bus.subscribe(&self.inner.subject, callback).await?;
        self.inner.running.store(true, Ordering::Release);
        info!(
            subject = %self.inner.subject,
            codec = self.inner.codec.name(),
            methods = self.inner.registry.read().len(),
            "server started"
        );
        Ok(())
    }

    /// Stops accepting requests and waits for running dispatches to finish.
    ///
    /// Must not be awaited from inside a handler: the drain would wait on
    /// the handler itself.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] if unsubscribing fails. Running
    /// dispatches are drained either way.
    pub async fn stop(&self) -> Result<(), RpcError> {
        self.inner.stop().await
    }
}

impl<C: Codec> Clone for RpcServer<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<C: Codec> std::fmt::Debug for RpcServer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServer")
            .field("subject", &self.inner.subject)
            .field("codec", &self.inner.codec.name())
            .field("methods", &self.method_names())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl<C: Codec> ServerInner<C> {
    fn lookup(&self, name: &str) -> Option<Arc<MethodRecord<C>>> {
        self.registry.read().get(name)
    }

    async fn stop(&self) -> Result<(), RpcError> {
        self.running.store(false, Ordering::Release);
        let unsubscribed = self.bus.unsubscribe().await;
        self.inflight.drained().await;
        match unsubscribed {
            Ok(()) => {
                info!(subject = %self.subject, "server stopped");
                Ok(())
            }
            Err(err) => {
                warn!(subject = %self.subject, error = %err, "server stopped with unsubscribe failure");
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl<C: Codec> BusCallback for ServerInner<C> {
    async fn on_delivery(&self, delivery: Result<Vec<u8>, BusError>) {
        let payload = match delivery {
            Ok(payload) => payload,
            Err(err) => {
                error!(subject = %self.subject, error = %err, "subscription lost, stopping server");
                if let Err(err) = self.stop().await {
                    debug!(subject = %self.subject, error = %err, "stop after subscription loss");
                }
                return;
            }
        };

        let request = match Request::decode(&payload) {
            Ok(request) => request,
            Err(err) => {
                debug!(subject = %self.subject, error = %err, "dropping malformed request");
                return;
            }
        };

        let Some(method) = self.lookup(&request.method) else {
            debug!(subject = %self.subject, method = %request.method, "dropping request for unknown method");
            return;
        };

        if request.params.len() != method.arity() {
            debug!(
                subject = %self.subject,
                method = %request.method,
                expected = method.arity(),
                received = request.params.len(),
                "dropping request with wrong parameter count"
            );
            return;
        }

        let guard = self.inflight.enter();
        match method.dispatch_mode() {
            DispatchMode::Synchronous => {
                let name = request.method.clone();
                let running = tokio::spawn(execute(
                    Arc::clone(&self.codec),
                    Arc::clone(&self.bus),
                    method,
                    request,
                ));
                // A panicking handler ends its own task, never the delivery loop.
                if let Err(err) = running.await {
                    error!(subject = %self.subject, method = %name, error = %err, "handler failed");
                }
                drop(guard);
            }
            DispatchMode::Worker => {
                let running = execute(Arc::clone(&self.codec), Arc::clone(&self.bus), method, request);
                tokio::spawn(async move {
                    running.await;
                    drop(guard);
                });
            }
        }
    }
}

/// Runs one dispatch: decode, invoke, and publish the response if the
/// method answers and the caller asked for one.
#[instrument(
    level = "debug",
    skip_all,
    fields(method = %request.method, correlation_id = %request.correlation_id)
)]
async fn execute<C: Codec>(
    codec: Arc<C>,
    bus: Arc<dyn MessageBus>,
    method: Arc<MethodRecord<C>>,
    request: Request,
) {
    let Request {
        correlation_id,
        reply_subject,
        params,
        ..
    } = request;

    let running = match method.handler.invoke(codec, params) {
        Ok(running) => running,
        Err(err) => {
            warn!(error = %err, "dropping request with undecodable parameters");
            return;
        }
    };

    let started = Instant::now();
    let reply = match running.await {
        Ok(reply) => reply,
        Err(err) => {
            error!(error = %err, "failed to encode result");
            return;
        }
    };
    trace!(elapsed = ?started.elapsed(), "handler returned");

    if !method.replies() || reply_subject.is_empty() {
        return;
    }
    let Some(reply) = reply else {
        return;
    };

    let response = match reply {
        Reply::Value(result) => Response::success(correlation_id, result),
        Reply::Error(message) => Response::failure(correlation_id, message),
    };
    let payload = match response.encode() {
        Ok(payload) => payload,
        Err(err) => {
            error!(error = %err, "failed to encode response");
            return;
        }
    };
    if let Err(err) = bus.publish(&reply_subject, payload).await {
        error!(reply_subject = %reply_subject, error = %err, "failed to publish response");
    }
}
