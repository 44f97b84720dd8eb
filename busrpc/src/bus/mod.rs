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

//! Message bus abstraction.
//!
//! The RPC layer only needs four operations from a bus: generate a unique
//! subject, publish bytes to a subject, subscribe one callback, and
//! unsubscribe. [`MessageBus`] captures that contract.
//!
//! Broker bindings implement the lower-level [`BusTransport`] instead, and
//! [`ResilientBus`] adapts them: it owns the receive loop, treats an expired
//! wait as normal, and re-subscribes once when the broker invalidates the
//! subscription. [`MemoryBroker`] is an in-process binding.
//!
//! ```text
//! RpcClient / RpcServer
//!         │  MessageBus
//!         ▼
//!   ResilientBus<T> ── receive task ──▶ BusCallback
//!         │  BusTransport
//!         ▼
//!   MemoryBroker (or any broker binding)
//! ```

mod error;
mod memory;
mod resilient;
mod traits;

pub use self::error::BusError;
pub use self::memory::{MemoryBroker, MemorySubscription};
pub use self::resilient::{DEFAULT_RECEIVE_WAIT, ResilientBus};
pub use self::traits::{BusCallback, BusTransport, MessageBus, SyncSubscription};
