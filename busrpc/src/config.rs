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

//! Client and server configuration.

use crate::bus::MessageBus;
use crate::codec::{Codec, PostcardCodec};
use std::sync::Arc;
use std::time::Duration;

/// Default time a call waits for its response.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration shared by [`RpcClient`](crate::RpcClient) and
/// [`RpcServer`](crate::RpcServer).
///
/// The options are consumed when the client or server is built and cannot
/// change afterwards.
///
/// # Examples
///
/// ```rust
/// use busrpc::bus::{MemoryBroker, ResilientBus};
/// use busrpc::RpcOptions;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let broker = MemoryBroker::new();
/// let options = RpcOptions::new(Arc::new(ResilientBus::new(broker)))
///     .with_subject("hello_server")
///     .with_call_timeout(Duration::from_secs(1));
///
/// assert_eq!(options.subject(), Some("hello_server"));
/// assert_eq!(options.call_timeout(), Duration::from_secs(1));
/// ```
#[derive(Clone)]
pub struct RpcOptions<C: Codec = PostcardCodec> {
    pub(crate) codec: C,
    pub(crate) bus: Arc<dyn MessageBus>,
    pub(crate) subject: Option<String>,
    pub(crate) call_timeout: Duration,
}

impl RpcOptions<PostcardCodec> {
    /// Creates options with the default codec and timeout.
    ///
    /// The bus is required. When no subject is set, one is generated from
    /// the bus.
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self {
            codec: PostcardCodec::default(),
            bus,
            subject: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl<C: Codec> RpcOptions<C> {
    /// Replaces the argument codec.
    pub fn with_codec<C2: Codec>(self, codec: C2) -> RpcOptions<C2> {
        RpcOptions {
            codec,
            bus: self.bus,
            subject: self.subject,
            call_timeout: self.call_timeout,
        }
    }

    /// Sets the subject this client or server listens on.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets how long a call waits for its response.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Returns the configured codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Returns the configured subject, if one was set explicitly.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the call timeout.
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Returns the explicit subject, or a fresh one from the bus.
    pub(crate) fn resolve_subject(&self) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| self.bus.generate_subject())
    }
}

impl<C: Codec> std::fmt::Debug for RpcOptions<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcOptions")
            .field("codec", &self.codec.name())
            .field("subject", &self.subject)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{MemoryBroker, ResilientBus};

    fn bus() -> Arc<dyn MessageBus> {
        Arc::new(ResilientBus::new(MemoryBroker::new()))
    }

    #[test]
    fn test_defaults() {
        let options = RpcOptions::new(bus());
        assert_eq!(options.call_timeout(), DEFAULT_CALL_TIMEOUT);
        assert_eq!(options.codec().name(), "postcard");
        assert!(options.subject().is_none());
    }

    #[test]
    fn test_generated_subject() {
        let options = RpcOptions::new(bus());
        let first = options.resolve_subject();
        let second = options.resolve_subject();
        assert!(first.starts_with("_INBOX."));
        assert_ne!(first, second);

        let options = options.with_subject("fixed");
        assert_eq!(options.resolve_subject(), "fixed");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_with_codec_keeps_settings() {
        let options = RpcOptions::new(bus())
            .with_subject("svc")
            .with_call_timeout(Duration::from_millis(10))
            .with_codec(crate::codec::JsonCodec::new());

        assert_eq!(options.codec().name(), "json");
        assert_eq!(options.subject(), Some("svc"));
        assert_eq!(options.call_timeout(), Duration::from_millis(10));
    }
}
