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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! - **[`codec`]**: how call arguments and results become bytes
//! - **[`protocol`]**: the request and response envelopes
//! - **[`bus`]**: the pub/sub contract, the resilient adapter, and the
//!   in-process broker
//! - **[`server`]**: method registration and request dispatch
//! - **[`client`]**: calls, casts, correlation, timeouts, and recovery
//!
//! Configuration shared by both sides lives in [`RpcOptions`]; every
//! fallible operation returns [`RpcError`].
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]. Dropped requests and responses are
//! logged at `debug`/`warn`; subscription loss at `error`. Install any
//! subscriber to see them.

pub mod bus;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use bus::{BusCallback, BusError, BusTransport, MemoryBroker, MessageBus, ResilientBus};
pub use client::{IntoParams, RawParams, RpcClient};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use codec::{Codec, DecodeError, EncodeError, PostcardCodec};
pub use config::{DEFAULT_CALL_TIMEOUT, RpcOptions};
pub use error::{Result, RpcError};
pub use protocol::{Request, Response};
pub use server::{
    DispatchMode, Handler, HandlerOutput, MethodRecord, RawMethod, RawReply, RpcServer,
    TypeDescriptor, TypeKind,
};
