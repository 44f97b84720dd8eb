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

//! In-process broker.
//!
//! [`MemoryBroker`] is a [`BusTransport`] that routes payloads between
//! subscriptions inside one process over unbounded Tokio channels. It backs
//! the test suite, benchmarks, and demos, and exposes fault injection hooks
//! for exercising the resilience paths:
//!
//! - [`MemoryBroker::invalidate`] drops every subscription on a subject, the
//!   way a broker drops subscribers after a reconnect.
//! - [`MemoryBroker::set_available`] makes the broker refuse publishes and
//!   new subscriptions.

use crate::bus::{BusError, BusTransport, SyncSubscription};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

struct Route {
    id: u64,
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

struct BrokerInner {
    routes: Mutex<HashMap<String, Vec<Route>>>,
    available: AtomicBool,
    next_route_id: AtomicU64,
    subscribe_calls: AtomicU64,
}

impl BrokerInner {
    fn remove_route(&self, subject: &str, id: u64) {
        let mut routes = self.routes.lock();
        if let Some(list) = routes.get_mut(subject) {
            list.retain(|route| route.id != id);
            if list.is_empty() {
                routes.remove(subject);
            }
        }
    }
}

/// Process-local publish/subscribe broker.
///
/// Cloning a `MemoryBroker` yields another handle to the same broker, the
/// same way clones of a client connection share one socket.
///
/// # Examples
///
/// ```rust
/// use busrpc::bus::{BusTransport, MemoryBroker};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broker = MemoryBroker::new();
/// let mut subscription = broker.subscribe_sync("greetings").await?;
///
/// broker.publish("greetings", b"hi".to_vec()).await?;
/// let payload = subscription.next_message(Duration::from_secs(1)).await?;
/// assert_eq!(payload, b"hi");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

impl MemoryBroker {
    /// Creates an empty, available broker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                routes: Mutex::new(HashMap::new()),
                available: AtomicBool::new(true),
                next_route_id: AtomicU64::new(1),
                subscribe_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Drops every subscription on `subject`.
    ///
    /// Affected subscriptions drain what was already queued and then report
    /// [`BusError::SubscriptionInvalidated`]. Returns how many were dropped.
    pub fn invalidate(&self, subject: &str) -> usize {
        let dropped = self.inner.routes.lock().remove(subject);
        let count = dropped.map_or(0, |routes| routes.len());
        tracing::debug!(subject, count, "invalidated memory subscriptions");
        count
    }

    /// Toggles broker availability. While unavailable, publishes and new
    /// subscriptions fail with [`BusError::Unavailable`]; existing
    /// subscriptions are untouched.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Returns whether the broker currently accepts operations.
    pub fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions on `subject`.
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.inner
            .routes
            .lock()
            .get(subject)
            .map_or(0, |routes| routes.len())
    }

    /// Total number of `subscribe_sync` calls, successful or not.
    pub fn subscribe_count(&self) -> u64 {
        self.inner.subscribe_calls.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), BusError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(BusError::Unavailable {
                reason: "memory broker is offline".to_string(),
            })
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("subjects", &self.inner.routes.lock().len())
            .field("available", &self.is_available())
            .finish()
    }
}

#[async_trait]
impl BusTransport for MemoryBroker {
    fn new_inbox(&self) -> String {
        format!("_INBOX.{}", Uuid::new_v4().simple())
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.ensure_available()?;

        let mut routes = self.inner.routes.lock();
        if let Some(list) = routes.get_mut(subject) {
            list.retain(|route| route.tx.send(payload.clone()).is_ok());
            if list.is_empty() {
                routes.remove(subject);
            }
        }
        Ok(())
    }

    async fn subscribe_sync(&self, subject: &str) -> Result<Box<dyn SyncSubscription>, BusError> {
        self.inner.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_route_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .routes
            .lock()
            .entry(subject.to_string())
            .or_default()
            .push(Route { id, tx });

        Ok(Box::new(MemorySubscription {
            subject: subject.to_string(),
            id,
            rx,
            valid: true,
            broker: Arc::downgrade(&self.inner),
        }))
    }
}

/// Pull-style subscription on a [`MemoryBroker`].
///
/// Dropping the subscription removes it from the broker.
pub struct MemorySubscription {
    subject: String,
    id: u64,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    valid: bool,
    broker: Weak<BrokerInner>,
}

impl MemorySubscription {
    fn detach(&mut self) {
        if let Some(broker) = self.broker.upgrade() {
            broker.remove_route(&self.subject, self.id);
        }
    }
}

#[async_trait]
impl SyncSubscription for MemorySubscription {
    async fn next_message(&mut self, wait: Duration) -> Result<Vec<u8>, BusError> {
        if !self.valid {
            return Err(BusError::SubscriptionInvalidated {
                subject: self.subject.clone(),
            });
        }

        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(payload)) => Ok(payload),
            Ok(None) => {
                self.valid = false;
                Err(BusError::SubscriptionInvalidated {
                    subject: self.subject.clone(),
                })
            }
            Err(_) => Err(BusError::WaitExpired { wait }),
        }
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    async fn unsubscribe(&mut self) -> Result<(), BusError> {
        self.valid = false;
        self.rx.close();
        self.detach();
        Ok(())
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn test_publish_fans_out() {
        let broker = MemoryBroker::new();
        let mut first = broker.subscribe_sync("fanout").await.unwrap();
        let mut second = broker.subscribe_sync("fanout").await.unwrap();
        assert_eq!(broker.subscriber_count("fanout"), 2);

        broker.publish("fanout", b"x".to_vec()).await.unwrap();
        assert_eq!(first.next_message(WAIT).await.unwrap(), b"x");
        assert_eq!(second.next_message(WAIT).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let broker = MemoryBroker::new();
        broker.publish("nobody", b"lost".to_vec()).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_expired() {
        let broker = MemoryBroker::new();
        let mut sub = broker.subscribe_sync("quiet").await.unwrap();
        let err = sub.next_message(Duration::from_millis(20)).await.unwrap_err();
        assert!(err.is_wait_expired());
        assert!(sub.is_valid());
    }

    #[tokio::test]
    async fn test_invalidate_drains_then_reports() {
        let broker = MemoryBroker::new();
        let mut sub = broker.subscribe_sync("flaky").await.unwrap();
        broker.publish("flaky", b"queued".to_vec()).await.unwrap();

        assert_eq!(broker.invalidate("flaky"), 1);
        assert_eq!(sub.next_message(WAIT).await.unwrap(), b"queued");

        let err = sub.next_message(WAIT).await.unwrap_err();
        assert!(matches!(err, BusError::SubscriptionInvalidated { .. }));
        assert!(!sub.is_valid());
    }

    #[tokio::test]
    async fn test_unavailable_broker() {
        let broker = MemoryBroker::new();
        broker.set_available(false);

        assert!(matches!(
            broker.publish("s", vec![]).await,
            Err(BusError::Unavailable { .. })
        ));
        assert!(broker.subscribe_sync("s").await.is_err());
        assert_eq!(broker.subscribe_count(), 1);

        broker.set_available(true);
        assert!(broker.subscribe_sync("s").await.is_ok());
    }

    #[tokio::test]
    async fn test_unsubscribe_and_drop_detach() {
        let broker = MemoryBroker::new();
        let mut sub = broker.subscribe_sync("gone").await.unwrap();
        sub.unsubscribe().await.unwrap();
        assert_eq!(broker.subscriber_count("gone"), 0);

        let sub = broker.subscribe_sync("gone").await.unwrap();
        assert_eq!(broker.subscriber_count("gone"), 1);
        drop(sub);
        assert_eq!(broker.subscriber_count("gone"), 0);
    }

    #[test]
    fn test_inboxes_are_unique() {
        let broker = MemoryBroker::new();
        let a = broker.new_inbox();
        let b = broker.new_inbox();
        assert!(a.starts_with("_INBOX."));
        assert_ne!(a, b);
    }
}
