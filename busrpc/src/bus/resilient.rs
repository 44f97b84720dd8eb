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

//! Self-healing [`MessageBus`] adapter over a pull-style [`BusTransport`].
//!
//! The adapter runs one receive task per subscription. The task pulls the
//! next message with a bounded wait and pushes it to the callback:
//!
//! ```text
//!            ┌──────────── WaitExpired ────────────┐
//!            ▼                                     │
//!   next_message(wait) ── Ok(payload) ──▶ callback ┤
//!            │                                     │
//!            ├── invalidated ──▶ re-subscribe once ┤ (success)
//!            │                        │
//!            │                        └─ failure ──▶ callback(Err), exit
//!            └── Closed ──▶ exit
//! ```
//!
//! A shutdown signal from [`MessageBus::unsubscribe`] ends the loop after the
//! callback currently running returns.

use crate::bus::{BusCallback, BusError, BusTransport, MessageBus, SyncSubscription};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default bound on a single wait for the next message.
pub const DEFAULT_RECEIVE_WAIT: Duration = Duration::from_secs(60);

struct ActiveSubscription {
    subject: String,
    generation: u64,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct Shared<T> {
    transport: T,
    receive_wait: Duration,
    state: Mutex<Option<ActiveSubscription>>,
    generation: AtomicU64,
}

impl<T> Shared<T> {
    /// Clears the active subscription if it still belongs to `generation`.
    async fn release(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.as_ref().is_some_and(|s| s.generation == generation) {
            *state = None;
        }
    }
}

/// [`MessageBus`] adapter that re-subscribes once when the broker
/// invalidates its subscription.
///
/// Each adapter holds at most one subscription. Client and server each need
/// their own adapter; adapters share the transport.
///
/// # Examples
///
/// ```rust
/// use busrpc::bus::{MemoryBroker, ResilientBus};
/// use std::time::Duration;
///
/// let broker = MemoryBroker::new();
/// let bus = ResilientBus::new(broker.clone()).with_receive_wait(Duration::from_secs(5));
/// assert!(!bus.is_subscribed_now());
/// ```
pub struct ResilientBus<T: BusTransport> {
    shared: Arc<Shared<T>>,
}

impl<T: BusTransport> ResilientBus<T> {
    /// Creates an unsubscribed adapter over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                receive_wait: DEFAULT_RECEIVE_WAIT,
                state: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Sets the bound on a single wait for the next message.
    ///
    /// Only takes effect before the first subscription.
    pub fn with_receive_wait(mut self, wait: Duration) -> Self {
        match Arc::get_mut(&mut self.shared) {
            Some(shared) => shared.receive_wait = wait,
            None => warn!("receive wait ignored, adapter is already shared"),
        }
        self
    }

    /// Returns the transport this adapter is bound to.
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Returns the configured receive wait.
    pub fn receive_wait(&self) -> Duration {
        self.shared.receive_wait
    }

    /// Returns the subscribed subject, if any.
    pub async fn subject(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .await
            .as_ref()
            .map(|s| s.subject.clone())
    }

    /// Non-blocking check for an active subscription. Returns `false` while
    /// a subscribe or unsubscribe is in progress.
    pub fn is_subscribed_now(&self) -> bool {
        self.shared
            .state
            .try_lock()
            .map(|state| state.is_some())
            .unwrap_or(false)
    }
}

impl<T: BusTransport> Drop for ResilientBus<T> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.try_lock() {
            if let Some(active) = state.take() {
                let _ = active.shutdown.send(());
            }
        }
    }
}

impl<T: BusTransport> std::fmt::Debug for ResilientBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientBus")
            .field("receive_wait", &self.shared.receive_wait)
            .finish()
    }
}

#[async_trait]
impl<T: BusTransport> MessageBus for ResilientBus<T> {
    fn generate_subject(&self) -> String {
        self.shared.transport.new_inbox()
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.shared.transport.publish(subject, payload).await
    }

    async fn subscribe(
        &self,
        subject: &str,
        callback: Arc<dyn BusCallback>,
    ) -> Result<(), BusError> {
        let mut state = self.shared.state.lock().await;
        if let Some(active) = state.as_ref() {
            return Err(BusError::AlreadySubscribed {
                subject: active.subject.clone(),
            });
        }

        let subscription = self.shared.transport.subscribe_sync(subject).await?;
        let generation = self.shared.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(receive_loop(
            Arc::clone(&self.shared),
            subject.to_string(),
            subscription,
            callback,
            shutdown_rx,
            generation,
        ));

        info!(subject, generation, "subscribed");
        *state = Some(ActiveSubscription {
            subject: subject.to_string(),
            generation,
            shutdown,
            task,
        });
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<(), BusError> {
        let active = self
            .shared
            .state
            .lock()
            .await
            .take()
            .ok_or(BusError::NotSubscribed)?;

        let _ = active.shutdown.send(());

        // Called from a callback running on the receive task itself: joining
        // would wait on ourselves. The loop exits once that callback returns.
        if tokio::task::try_id() == Some(active.task.id()) {
            debug!(subject = %active.subject, "unsubscribe requested from receive task");
            return Ok(());
        }

        if let Err(e) = active.task.await {
            error!(subject = %active.subject, error = %e, "receive task failed");
        }
        info!(subject = %active.subject, "unsubscribed");
        Ok(())
    }
}

async fn receive_loop<T: BusTransport>(
    shared: Arc<Shared<T>>,
    subject: String,
    mut subscription: Box<dyn SyncSubscription>,
    callback: Arc<dyn BusCallback>,
    mut shutdown: oneshot::Receiver<()>,
    generation: u64,
) {
    let wait = shared.receive_wait;
    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            next = subscription.next_message(wait) => next,
        };

        match next {
            Ok(payload) => callback.on_delivery(Ok(payload)).await,
            Err(BusError::WaitExpired { .. }) => continue,
            Err(BusError::Closed) => {
                error!(%subject, "transport closed, receive loop exiting");
                shared.release(generation).await;
                return;
            }
            Err(e) if !subscription.is_valid() || matches!(e, BusError::SubscriptionInvalidated { .. }) => {
                warn!(%subject, error = %e, "subscription invalidated, re-subscribing");
                match shared.transport.subscribe_sync(&subject).await {
                    Ok(renewed) => {
                        info!(%subject, "re-subscribed");
                        subscription = renewed;
                    }
                    Err(resubscribe_error) => {
                        error!(%subject, error = %resubscribe_error, "re-subscribe failed");
                        shared.release(generation).await;
                        callback.on_delivery(Err(resubscribe_error)).await;
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(%subject, error = %e, "transient receive error");
            }
        }
    }

    if let Err(e) = subscription.unsubscribe().await {
        debug!(%subject, error = %e, "releasing subscription failed");
    }
}
