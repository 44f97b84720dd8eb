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

//! Message bus contracts.
//!
//! Two layers of abstraction live here:
//!
//! - [`MessageBus`] is what the RPC client and server depend on: one
//!   subscription per instance, pushed deliveries through a [`BusCallback`].
//! - [`BusTransport`] and [`SyncSubscription`] are what a broker binding
//!   implements: pull-style subscriptions with a bounded wait. The
//!   [`ResilientBus`](crate::bus::ResilientBus) adapter turns the latter into
//!   the former.

use crate::bus::BusError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Receiver of deliveries from a [`MessageBus`] subscription.
///
/// Each delivered payload invokes [`on_delivery`](Self::on_delivery) exactly
/// once, on the bus's own receive task. An `Err` delivery means the
/// subscription is gone for good and the receiver should stop relying on it.
#[async_trait]
pub trait BusCallback: Send + Sync + 'static {
    /// Handles one inbound payload or a fatal subscription error.
    async fn on_delivery(&self, delivery: Result<Vec<u8>, BusError>);
}

/// A uniquely addressable publish/subscribe primitive.
///
/// # Examples
///
/// ```rust
/// use busrpc::bus::{BusCallback, BusError, MemoryBroker, MessageBus, ResilientBus};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct Printer;
///
/// #[async_trait]
/// impl BusCallback for Printer {
///     async fn on_delivery(&self, delivery: Result<Vec<u8>, BusError>) {
///         println!("{:?}", delivery);
///     }
/// }
///
/// # async fn example() -> Result<(), BusError> {
/// let broker = MemoryBroker::new();
/// let bus = ResilientBus::new(broker.clone());
///
/// let subject = bus.generate_subject();
/// bus.subscribe(&subject, Arc::new(Printer)).await?;
/// bus.publish(&subject, b"hello".to_vec()).await?;
/// bus.unsubscribe().await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Produces a globally unique, previously unused subject.
    fn generate_subject(&self) -> String;

    /// Sends a payload to a subject. Delivery follows the broker's
    /// semantics; no acknowledgment is awaited.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Starts delivering messages published to `subject` to `callback`.
    ///
    /// # Errors
    ///
    /// [`BusError::AlreadySubscribed`] if this instance already has an
    /// active subscription, or whatever the broker reports.
    async fn subscribe(&self, subject: &str, callback: Arc<dyn BusCallback>)
    -> Result<(), BusError>;

    /// Stops delivery and waits until in-flight callback invocations finish.
    ///
    /// # Errors
    ///
    /// [`BusError::NotSubscribed`] if there is no active subscription.
    async fn unsubscribe(&self) -> Result<(), BusError>;
}

/// A pull-style subscription handed out by a [`BusTransport`].
#[async_trait]
pub trait SyncSubscription: Send {
    /// Waits up to `wait` for the next payload.
    ///
    /// # Errors
    ///
    /// - [`BusError::WaitExpired`] if nothing arrived in time.
    /// - [`BusError::SubscriptionInvalidated`] if the broker dropped the
    ///   subscription.
    async fn next_message(&mut self, wait: Duration) -> Result<Vec<u8>, BusError>;

    /// Returns `false` once the broker has dropped this subscription.
    fn is_valid(&self) -> bool;

    /// Releases the subscription at the broker.
    async fn unsubscribe(&mut self) -> Result<(), BusError>;
}

/// Binding to a concrete publish/subscribe broker connection.
///
/// Implementations share the connection; establishing and closing it is the
/// owner's responsibility.
#[async_trait]
pub trait BusTransport: Send + Sync + 'static {
    /// Produces a unique inbox subject.
    fn new_inbox(&self) -> String;

    /// Publishes a payload to a subject.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Opens a pull-style subscription on a subject.
    async fn subscribe_sync(&self, subject: &str) -> Result<Box<dyn SyncSubscription>, BusError>;
}
