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

//! Message bus error types.
//!
//! [`BusError`] covers every failure of the publish/subscribe layer, both the
//! contract-level conditions raised by an adapter (already subscribed, not
//! subscribed) and the conditions a transport binding reports while pulling
//! messages (wait expired, subscription invalidated).

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`MessageBus`](crate::bus::MessageBus) or a
/// [`BusTransport`](crate::bus::BusTransport).
///
/// # Examples
///
/// ```rust
/// use busrpc::bus::BusError;
///
/// let error = BusError::SubscriptionInvalidated {
///     subject: "hello_server".to_string(),
/// };
/// assert!(error.is_recoverable());
/// assert!(!BusError::Closed.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The adapter already has an active subscription.
    #[error("already subscribed to {subject}")]
    AlreadySubscribed {
        /// Subject of the active subscription.
        subject: String,
    },

    /// `unsubscribe` was called without an active subscription.
    #[error("not subscribed")]
    NotSubscribed,

    /// No message arrived within the bounded wait. Not a failure; receive
    /// loops simply wait again.
    #[error("no message within {wait:?}")]
    WaitExpired {
        /// The wait that elapsed.
        wait: Duration,
    },

    /// The broker dropped the subscription; it must be re-established.
    #[error("subscription to {subject} was invalidated")]
    SubscriptionInvalidated {
        /// Subject of the dropped subscription.
        subject: String,
    },

    /// The broker cannot be reached right now.
    #[error("message bus unavailable: {reason}")]
    Unavailable {
        /// Why the broker is unavailable.
        reason: String,
    },

    /// A publish was rejected.
    #[error("failed to publish to {subject}: {reason}")]
    PublishFailed {
        /// Destination subject.
        subject: String,
        /// Transport-specific description.
        reason: String,
    },

    /// A subscribe was rejected.
    #[error("failed to subscribe to {subject}: {reason}")]
    SubscribeFailed {
        /// Requested subject.
        subject: String,
        /// Transport-specific description.
        reason: String,
    },

    /// The underlying connection was closed by its owner.
    #[error("message bus connection is closed")]
    Closed,
}

impl BusError {
    /// Returns `true` if retrying the operation later may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BusError::WaitExpired { .. }
            | BusError::SubscriptionInvalidated { .. }
            | BusError::Unavailable { .. }
            | BusError::PublishFailed { .. }
            | BusError::SubscribeFailed { .. } => true,

            BusError::AlreadySubscribed { .. } | BusError::NotSubscribed | BusError::Closed => {
                false
            }
        }
    }

    /// Returns `true` for the benign "nothing arrived yet" condition.
    pub fn is_wait_expired(&self) -> bool {
        matches!(self, BusError::WaitExpired { .. })
    }
}
