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

//! Server side: method registration and request dispatch.
//!
//! An [`RpcServer`] owns a [`MessageBus`](crate::bus::MessageBus)
//! subscription on its subject. Each inbound request goes through:
//!
//! 1. envelope decode,
//! 2. method lookup by name,
//! 3. parameter count check against the registered arity,
//! 4. parameter decode with the server's codec,
//! 5. invocation, awaited by the delivery task or detached per [`DispatchMode`],
//! 6. response publish to the request's reply subject, when the method
//!    answers and the request carries one.
//!
//! A failure at any step drops the request with a log line.

mod handler;
mod inflight;
mod registry;
#[allow(clippy::module_inception)]
mod server;

pub use handler::{BoxFuture, Handler, HandlerOutput, MethodHandler, RawMethod, RawReply, Reply};
pub use registry::{DispatchMode, MethodRecord, TypeDescriptor, TypeKind};
pub use server::RpcServer;
