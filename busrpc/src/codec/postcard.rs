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

//! Postcard codec, the default.
//!
//! Postcard is a compact, non-self-describing binary format. Both ends must
//! agree on the exact Rust shape of every argument.

use crate::codec::{Codec, DecodeError, EncodeError};

/// Compact binary codec backed by postcard.
///
/// # Examples
///
/// ```rust
/// use busrpc::codec::{Codec, PostcardCodec};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = PostcardCodec::default();
/// let bytes = codec.encode(&(5i32, "five".to_string()))?;
/// let decoded: (i32, String) = codec.decode(&bytes)?;
/// assert_eq!(decoded, (5, "five".to_string()));
/// # Ok(())
/// # }
/// ```
///
/// With a decode size limit:
///
/// ```rust
/// use busrpc::codec::PostcardCodec;
///
/// let codec = PostcardCodec::new().with_max_size(64 * 1024);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PostcardCodec {
    max_size: Option<usize>,
}

impl PostcardCodec {
    /// Creates a postcard codec without a size limit.
    pub fn new() -> Self {
        Self { max_size: None }
    }

    /// Rejects payloads larger than `max_size` bytes on decode.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Removes any size limit.
    pub fn with_no_limit(mut self) -> Self {
        self.max_size = None;
        self
    }
}

impl Codec for PostcardCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, EncodeError>
    where
        T: serde::Serialize + ?Sized,
    {
        postcard::to_allocvec(value)
            .map_err(|e| EncodeError::format(self.name(), e))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DecodeError>
    where
        T: serde::de::DeserializeOwned,
    {
        if let Some(max_size) = self.max_size {
            if bytes.len() > max_size {
                return Err(DecodeError::TooLarge {
                    size: bytes.len(),
                    limit: max_size,
                });
            }
        }

        postcard::from_bytes(bytes)
            .map_err(|e| DecodeError::malformed(self.name(), e))
    }

    fn name(&self) -> &'static str {
        "postcard"
    }
}
