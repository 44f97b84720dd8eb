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

//! Codec error types.
//!
//! [`EncodeError`] and [`DecodeError`] describe failures to turn a call
//! argument or return value into an opaque payload and back. They never cross
//! the wire as structured values; a server only ever reports them as text.

use thiserror::Error;

/// Underlying format error, kept opaque so codecs stay swappable.
pub type FormatError = Box<dyn std::error::Error + Send + Sync>;

/// A value could not be turned into a payload.
///
/// # Examples
///
/// ```rust
/// use busrpc::codec::EncodeError;
///
/// let error = EncodeError::format("json", std::io::Error::other("key must be a string"));
/// assert_eq!(error.codec(), "json");
/// assert!(error.to_string().contains("key must be a string"));
/// ```
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The codec's format cannot represent the value.
    #[error("{codec} cannot encode value: {source}")]
    Format {
        /// Name of the codec that failed.
        codec: &'static str,
        /// Format-specific cause.
        #[source]
        source: FormatError,
    },
}

impl EncodeError {
    /// Wraps a format error raised by `codec`.
    pub fn format(codec: &'static str, source: impl Into<FormatError>) -> Self {
        EncodeError::Format {
            codec,
            source: source.into(),
        }
    }

    /// Name of the codec that failed.
    pub fn codec(&self) -> &'static str {
        match self {
            EncodeError::Format { codec, .. } => codec,
        }
    }
}

/// A payload could not be turned back into a value.
///
/// Typical causes are corrupted payloads, a payload produced by a different
/// codec, or a declared shape that does not match what the sender encoded.
///
/// # Examples
///
/// ```rust
/// use busrpc::codec::{Codec, DecodeError, PostcardCodec};
///
/// let codec = PostcardCodec::default();
/// let result: Result<String, _> = codec.decode(&[0xFF, 0xFF, 0xFF]);
/// assert!(matches!(result, Err(DecodeError::Malformed { codec: "postcard", .. })));
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid for the codec or the requested shape.
    #[error("{codec} payload does not decode: {source}")]
    Malformed {
        /// Name of the codec that failed.
        codec: &'static str,
        /// Format-specific cause.
        #[source]
        source: FormatError,
    },

    /// The payload is larger than the codec accepts.
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Payload size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// A request carried a different number of parameters than the method
    /// declares.
    #[error("expected {expected} parameters, received {received}")]
    ParameterCount {
        /// Declared arity.
        expected: usize,
        /// Parameters present in the request.
        received: usize,
    },
}

impl DecodeError {
    /// Wraps a format error raised by `codec`.
    pub fn malformed(codec: &'static str, source: impl Into<FormatError>) -> Self {
        DecodeError::Malformed {
            codec,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_encode_error_keeps_cause() {
        let error = EncodeError::format("postcard", std::io::Error::other("too deep"));
        assert_eq!(error.codec(), "postcard");
        assert_eq!(error.to_string(), "postcard cannot encode value: too deep");
        assert_eq!(error.source().unwrap().to_string(), "too deep");
    }

    #[test]
    fn test_malformed_keeps_cause() {
        let error = DecodeError::malformed("json", std::io::Error::other("eof"));
        assert!(error.to_string().starts_with("json payload"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_limits_have_no_cause() {
        let error = DecodeError::TooLarge { size: 10, limit: 4 };
        assert_eq!(error.to_string(), "payload of 10 bytes exceeds the 4 byte limit");
        assert!(error.source().is_none());

        let error = DecodeError::ParameterCount {
            expected: 2,
            received: 1,
        };
        assert_eq!(error.to_string(), "expected 2 parameters, received 1");
    }
}
