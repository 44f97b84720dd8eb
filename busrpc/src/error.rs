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

//! Top-level error type.
//!
//! [`RpcError`] is what the client and server APIs return. It composes the
//! lower layers:
//!
//! 1. **Codec**: [`EncodeError`] / [`DecodeError`], always local.
//! 2. **Protocol**: [`EnvelopeError`], framing of requests and responses.
//! 3. **Transport**: [`BusError`], publish and subscribe failures.
//! 4. **Call outcome**: [`RpcError::Timeout`] and [`RpcError::Remote`].
//! 5. **Registration**: [`RpcError::DuplicateMethod`] and
//!    [`RpcError::UnsuitableMethod`].
//!
//! Unknown methods and unmatched correlation ids are never returned: the
//! server drops such requests and the caller observes a timeout.

use crate::bus::BusError;
use crate::codec::{DecodeError, EncodeError};
use crate::protocol::EnvelopeError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`RpcClient`](crate::RpcClient) and
/// [`RpcServer`](crate::RpcServer).
///
/// # Examples
///
/// ```rust
/// use busrpc::RpcError;
/// use std::time::Duration;
///
/// fn describe(error: &RpcError) -> &'static str {
///     if error.is_timeout() {
///         "no answer"
///     } else if error.is_remote() {
///         "handler failed"
///     } else {
///         "local failure"
///     }
/// }
///
/// let error = RpcError::Timeout {
///     method: "Add".to_string(),
///     timeout: Duration::from_secs(3),
/// };
/// assert_eq!(describe(&error), "no answer");
/// ```
#[derive(Debug, Error)]
pub enum RpcError {
    /// An argument or return value could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A payload could not be decoded into the requested shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A request or response envelope could not be framed.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// No response arrived within the call timeout.
    ///
    /// Also the outcome when the target subject has no server or the server
    /// dropped the request.
    #[error("call to {method} timed out after {timeout:?}")]
    Timeout {
        /// Method that was called.
        method: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The handler returned an error.
    #[error("remote error: {message}")]
    Remote {
        /// The handler's error message.
        message: String,
    },

    /// A method with this name is already registered.
    #[error("method {name} already registered")]
    DuplicateMethod {
        /// The conflicting name.
        name: String,
    },

    /// The handler signature cannot be dispatched.
    #[error("method {name} not suitable: {reason}")]
    UnsuitableMethod {
        /// The rejected name.
        name: String,
        /// Why the signature was rejected.
        reason: String,
    },

    /// The message bus failed.
    #[error("transport error: {0}")]
    Transport(#[from] BusError),

    /// The client was closed.
    #[error("client is closed")]
    Closed,
}

impl RpcError {
    /// Returns `true` for [`RpcError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` for [`RpcError::Remote`].
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` for [`RpcError::Transport`].
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if repeating the same call may succeed.
    ///
    /// Timeouts and recoverable transport errors qualify. Remote errors,
    /// codec errors, and registration errors do not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_recoverable(),
            Self::Encode(_)
            | Self::Decode(_)
            | Self::Envelope(_)
            | Self::Remote { .. }
            | Self::DuplicateMethod { .. }
            | Self::UnsuitableMethod { .. }
            | Self::Closed => false,
        }
    }
}

/// Convenience alias for results in this crate.
pub type Result<T, E = RpcError> = std::result::Result<T, E>;
