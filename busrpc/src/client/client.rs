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

//! The RPC client.

use crate::bus::{BusCallback, BusError, MessageBus};
use crate::client::correlation::next_correlation_id;
use crate::client::params::IntoParams;
use crate::client::pending::PendingCalls;
use crate::codec::{Codec, PostcardCodec};
use crate::config::RpcOptions;
use crate::error::RpcError;
use crate::protocol::{Request, Response};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const VALID: u8 = 0;
const INVALID: u8 = 1;
const CLOSED: u8 = 2;

/// Calls methods on remote servers.
///
/// The client listens on its own subject for responses and matches them to
/// callers by correlation id, so any number of calls may be outstanding at
/// once from clones of the same client.
///
/// If the response subscription is lost the client turns invalid; the next
/// call re-subscribes before sending. [`close`](Self::close) is final.
///
/// Dropping the last clone closes the client; [`close`](Self::close) does
/// the same and reports unsubscribe failures.
///
/// # Examples
///
/// ```rust,no_run
/// use busrpc::{MemoryBroker, ResilientBus, RpcClient, RpcOptions};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), busrpc::RpcError> {
/// let broker = MemoryBroker::new();
/// let client = RpcClient::new(RpcOptions::new(Arc::new(ResilientBus::new(broker)))).await;
///
/// let sum: i32 = client.call("hello", "Add", (5, 3)).await?;
/// client.cast("hello", "Ping", ()).await?;
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct RpcClient<C: Codec = PostcardCodec> {
    inner: Arc<ClientInner<C>>,
    handle: Arc<LastHandle<C>>,
}

/// Shared by user-facing clones only; the bus callback holds `inner`
/// directly, so this drops exactly when the last clone does.
struct LastHandle<C: Codec> {
    inner: Arc<ClientInner<C>>,
}

struct ClientInner<C: Codec> {
    codec: C,
    bus: Arc<dyn MessageBus>,
    subject: String,
    call_timeout: Duration,
    pending: PendingCalls,
    state: AtomicU8,
    retry_gate: tokio::sync::Mutex<()>,
}

impl<C: Codec> RpcClient<C> {
    /// Creates a client and subscribes to its response subject.
    ///
    /// A failed subscription does not fail construction: the client starts
    /// invalid and the first call retries.
    pub async fn new(options: RpcOptions<C>) -> Self {
        let subject = options.resolve_subject();
        let RpcOptions {
            codec,
            bus,
            call_timeout,
            ..
        } = options;
        let inner = Arc::new(ClientInner {
            codec,
            bus,
            subject,
            call_timeout,
            pending: PendingCalls::new(),
            state: AtomicU8::new(INVALID),
            retry_gate: tokio::sync::Mutex::new(()),
        });
        let client = Self {
            handle: Arc::new(LastHandle {
                inner: Arc::clone(&inner),
            }),
            inner,
        };

        match client.subscribe().await {
            Ok(()) => {
                client.inner.state.store(VALID, Ordering::SeqCst);
                info!(subject = %client.inner.subject, codec = client.inner.codec.name(), "client ready");
            }
            Err(err) => {
                warn!(subject = %client.inner.subject, error = %err, "client starting invalid");
            }
        }
        client
    }

    /// The subject responses arrive on.
    pub fn subject(&self) -> &str {
        &self.inner.subject
    }

    /// Returns `true` while the response subscription is live.
    pub fn is_valid(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) == VALID
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) == CLOSED
    }

    /// Calls waiting for their response.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    /// How long a call waits for its response.
    pub fn call_timeout(&self) -> Duration {
        self.inner.call_timeout
    }

    /// Calls `method` on the server at `subject` and waits for its result.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Encode`] if an argument cannot be encoded; nothing is
    ///   sent.
    /// - [`RpcError::Transport`] if the client cannot re-subscribe or the
    ///   request cannot be published.
    /// - [`RpcError::Timeout`] if no response arrives in time. This also
    ///   covers unknown methods and absent servers.
    /// - [`RpcError::Remote`] if the handler returned an error.
    /// - [`RpcError::Decode`] if the result does not decode as `R`.
    /// - [`RpcError::Closed`] after [`close`](Self::close).
    #[instrument(level = "debug", skip(self, params), fields(client = %self.inner.subject))]
    pub async fn call<R, P>(&self, subject: &str, method: &str, params: P) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
        P: IntoParams,
    {
        self.ensure_valid().await?;
        let inner = &self.inner;

        let params = params.into_params(&inner.codec)?;
        let correlation_id = next_correlation_id();
        let payload =
            Request::call(correlation_id.clone(), inner.subject.clone(), method, params).encode()?;

        let mut pending = inner.pending.register(correlation_id);
        inner.bus.publish(subject, payload).await?;

        let response = match tokio::time::timeout(inner.call_timeout, pending.wait()).await {
            Ok(Some(response)) => response,
            Ok(None) | Err(_) => {
                debug!(correlation_id = pending.correlation_id(), "call timed out");
                return Err(RpcError::Timeout {
                    method: method.to_string(),
                    timeout: inner.call_timeout,
                });
            }
        };

        if response.is_error() {
            return Err(RpcError::Remote {
                message: response.error,
            });
        }
        Ok(inner.codec.decode(&response.result)?)
    }

    /// Sends `method` to the server at `subject` without waiting.
    ///
    /// The request carries no reply subject, so the server never answers,
    /// even for methods that return a value.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call), minus the outcomes that need a
    /// response.
    #[instrument(level = "debug", skip(self, params), fields(client = %self.inner.subject))]
    pub async fn cast<P>(&self, subject: &str, method: &str, params: P) -> Result<(), RpcError>
    where
        P: IntoParams,
    {
        self.ensure_valid().await?;
        let params = params.into_params(&self.inner.codec)?;
        let payload = Request::cast(method, params).encode()?;
        self.inner.bus.publish(subject, payload).await?;
        Ok(())
    }

    /// Re-subscribes an invalid client.
    ///
    /// Concurrent callers serialize on a gate; only the first one that
    /// finds the client invalid subscribes, the others see it valid.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] if subscribing fails, or
    /// [`RpcError::Closed`] after [`close`](Self::close).
    pub async fn retry(&self) -> Result<(), RpcError> {
        match self.inner.state.load(Ordering::SeqCst) {
            VALID => return Ok(()),
            CLOSED => return Err(RpcError::Closed),
            _ => {}
        }

        let _gate = self.inner.retry_gate.lock().await;
        match self.inner.state.load(Ordering::SeqCst) {
            VALID => return Ok(()),
            CLOSED => return Err(RpcError::Closed),
            _ => {}
        }

        match self.subscribe().await {
            Ok(()) => {
                self.inner.state.store(VALID, Ordering::SeqCst);
                info!(subject = %self.inner.subject, "client re-subscribed");
                Ok(())
            }
            Err(err) => {
                warn!(subject = %self.inner.subject, error = %err, "client re-subscribe failed");
                Err(err.into())
            }
        }
    }

    /// Unsubscribes and marks the client closed. Later calls fail with
    /// [`RpcError::Closed`]; calls already waiting run into their timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] if unsubscribing fails. The client
    /// is closed regardless.
    pub async fn close(&self) -> Result<(), RpcError> {
        let previous = {
            let _gate = self.inner.retry_gate.lock().await;
            self.inner.state.swap(CLOSED, Ordering::SeqCst)
        };
        if previous != VALID {
            return Ok(());
        }
        // Outside the gate: joining the receive task must not wait on a
        // callback that is itself waiting for the gate.
        self.inner.bus.unsubscribe().await?;
        info!(subject = %self.inner.subject, "client closed");
        Ok(())
    }

    async fn ensure_valid(&self) -> Result<(), RpcError> {
        match self.inner.state.load(Ordering::SeqCst) {
            VALID => Ok(()),
            CLOSED => Err(RpcError::Closed),
            _ => self.retry().await,
        }
    }

    async fn subscribe(&self) -> Result<(), BusError> {
        let callback: Arc<dyn BusCallback> = self.inner.clone();
        self.inner.bus.subscribe(&self.inner.subject, callback).await
    }
}

impl<C: Codec> Clone for RpcClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<C: Codec> std::fmt::Debug for RpcClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("subject", &self.inner.subject)
            .field("codec", &self.inner.codec.name())
            .field("call_timeout", &self.inner.call_timeout)
            .field("valid", &self.is_valid())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}

impl<C: Codec> Drop for LastHandle<C> {
    fn drop(&mut self) {
        if self.inner.state.swap(CLOSED, Ordering::SeqCst) != VALID {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(subject = %self.inner.subject, "client dropped outside a runtime, subscription left open");
            return;
        };
        let bus = Arc::clone(&self.inner.bus);
        let subject = self.inner.subject.clone();
        runtime.spawn(async move {
            match bus.unsubscribe().await {
                Ok(()) => debug!(subject = %subject, "client dropped, subscription closed"),
                Err(err) => debug!(subject = %subject, error = %err, "unsubscribe on drop"),
            }
        });
    }
}

#[async_trait]
impl<C: Codec> BusCallback for ClientInner<C> {
    async fn on_delivery(&self, delivery: Result<Vec<u8>, BusError>) {
        let payload = match delivery {
            Ok(payload) => payload,
            Err(err) => {
                error!(subject = %self.subject, error = %err, "response subscription lost");
                // Invalid only once the old subscription is gone; retries
                // wait on the gate until then.
                let _gate = self.retry_gate.lock().await;
                if self.state.load(Ordering::SeqCst) != VALID {
                    return;
                }
                if let Err(err) = self.bus.unsubscribe().await {
                    debug!(subject = %self.subject, error = %err, "unsubscribe after subscription loss");
                }
                let _ = self.state.compare_exchange(
                    VALID,
                    INVALID,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                return;
            }
        };

        let response = match Response::decode(&payload) {
            Ok(response) => response,
            Err(err) => {
                warn!(subject = %self.subject, error = %err, "dropping malformed response");
                return;
            }
        };

        if let Err(response) = self.pending.complete(response) {
            warn!(
                subject = %self.subject,
                correlation_id = %response.correlation_id,
                "dropping response with unknown correlation id"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{MemoryBroker, ResilientBus};

    fn options(broker: &MemoryBroker) -> RpcOptions {
        RpcOptions::new(Arc::new(ResilientBus::new(broker.clone())))
            .with_call_timeout(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_new_is_valid() {
        let broker = MemoryBroker::new();
        let client = RpcClient::new(options(&broker).with_subject("client")).await;
        assert!(client.is_valid());
        assert_eq!(client.subject(), "client");
        assert_eq!(broker.subscriber_count("client"), 1);
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_new_on_unavailable_broker_starts_invalid() {
        let broker = MemoryBroker::new();
        broker.set_available(false);
        let client = RpcClient::new(options(&broker)).await;
        assert!(!client.is_valid());

        broker.set_available(true);
        client.retry().await.unwrap();
        assert!(client.is_valid());
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_call_without_server_times_out() {
        let broker = MemoryBroker::new();
        let client = RpcClient::new(options(&broker)).await;

        let err = client
            .call::<i32, _>("nobody", "Add", (1, 2))
            .await
            .unwrap_err();
        assert!(matches!(&err, RpcError::Timeout { method, .. } if method == "Add"));
        assert_eq!(client.pending_calls(), 0);
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_final() {
        let broker = MemoryBroker::new();
        let client = RpcClient::new(options(&broker)).await;
        client.close().await.unwrap();
        assert!(client.is_closed());

        assert!(matches!(
            client.cast("svc", "Ping", ()).await,
            Err(RpcError::Closed)
        ));
        assert!(matches!(client.retry().await, Err(RpcError::Closed)));
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_correlation_is_dropped() {
        let broker = MemoryBroker::new();
        let client = RpcClient::new(options(&broker).with_subject("c")).await;

        let stray = Response::success("not-ours", vec![]).encode().unwrap();
        client.inner.on_delivery(Ok(stray)).await;
        client.inner.on_delivery(Ok(vec![0xff, 0xff])).await;
        assert_eq!(client.pending_calls(), 0);
        assert!(client.is_valid());
        client.close().await.unwrap();
    }
}
