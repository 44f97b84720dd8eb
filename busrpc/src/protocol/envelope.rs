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

//! Request and response envelopes.
//!
//! Envelopes are always framed with postcard, independent of the argument
//! codec, so a server can route a request before it knows how to decode the
//! parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to frame or unframe an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The envelope could not be serialized.
    #[error("failed to encode {kind} envelope: {source}")]
    Encode {
        /// Which envelope was being encoded.
        kind: &'static str,
        /// The underlying postcard error.
        #[source]
        source: postcard::Error,
    },

    /// The bytes are not a valid envelope.
    #[error("failed to decode {kind} envelope: {source}")]
    Decode {
        /// Which envelope was being decoded.
        kind: &'static str,
        /// The underlying postcard error.
        #[source]
        source: postcard::Error,
    },
}

/// A method invocation published to a server subject.
///
/// `correlation_id` and `reply_subject` are both empty for a cast, and both
/// set for a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Token matching the eventual response to the waiting caller.
    pub correlation_id: String,
    /// Subject the response must be published to.
    pub reply_subject: String,
    /// Registered method name.
    pub method: String,
    /// One codec payload per declared parameter, in order.
    pub params: Vec<Vec<u8>>,
}

impl Request {
    /// Builds a request that expects a response on `reply_subject`.
    pub fn call(
        correlation_id: impl Into<String>,
        reply_subject: impl Into<String>,
        method: impl Into<String>,
        params: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            reply_subject: reply_subject.into(),
            method: method.into(),
            params,
        }
    }

    /// Builds a fire-and-forget request.
    pub fn cast(method: impl Into<String>, params: Vec<Vec<u8>>) -> Self {
        Self {
            correlation_id: String::new(),
            reply_subject: String::new(),
            method: method.into(),
            params,
        }
    }

    /// Returns `true` if the sender is waiting for a response.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        !self.reply_subject.is_empty()
    }

    /// Frames the request for the bus.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        postcard::to_allocvec(self).map_err(|source| EnvelopeError::Encode {
            kind: "request",
            source,
        })
    }

    /// Unframes a request received from the bus.
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        postcard::from_bytes(bytes).map_err(|source| EnvelopeError::Decode {
            kind: "request",
            source,
        })
    }
}

/// The outcome of a call, published to the caller's reply subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Copied from the request.
    pub correlation_id: String,
    /// Codec payload of the return value; empty when `error` is set.
    pub result: Vec<u8>,
    /// Handler error message; empty means success.
    pub error: String,
}

impl Response {
    /// A successful response carrying an encoded return value.
    pub fn success(correlation_id: impl Into<String>, result: Vec<u8>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            result,
            error: String::new(),
        }
    }

    /// A failed response carrying the handler's error message.
    pub fn failure(correlation_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            result: Vec::new(),
            error: error.into(),
        }
    }

    /// Returns `true` if the handler reported an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Frames the response for the bus.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        postcard::to_allocvec(self).map_err(|source| EnvelopeError::Encode {
            kind: "response",
            source,
        })
    }

    /// Unframes a response received from the bus.
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        postcard::from_bytes(bytes).map_err(|source| EnvelopeError::Decode {
            kind: "response",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_call_roundtrip() {
        let request = Request::call("abc", "_INBOX.1", "Add", vec![vec![10], vec![6]]);
        assert!(request.expects_reply());

        let bytes = request.encode().unwrap();
        assert_eq!(Request::decode(&bytes).unwrap(), request);
    }

    #[test]
    fn test_request_cast_has_no_reply() {
        let request = Request::cast("Ping", vec![]);
        assert!(!request.expects_reply());
        assert!(request.correlation_id.is_empty());

        let decoded = Request::decode(&request.encode().unwrap()).unwrap();
        assert!(decoded.params.is_empty());
    }

    #[test]
    fn test_response_variants() {
        let ok = Response::success("c1", vec![1, 2, 3]);
        assert!(!ok.is_error());
        assert_eq!(Response::decode(&ok.encode().unwrap()).unwrap(), ok);

        let failed = Response::failure("c2", "hello error");
        assert!(failed.is_error());
        assert!(failed.result.is_empty());
        assert_eq!(Response::decode(&failed.encode().unwrap()).unwrap(), failed);
    }

    #[test]
    fn test_decode_garbage() {
        let err = Request::decode(&[0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(err.to_string().contains("request envelope"));

        let err = Response::decode(&[]).unwrap_err();
        assert!(matches!(err, EnvelopeError::Decode { kind: "response", .. }));
    }
}
