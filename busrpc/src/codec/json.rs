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

//! JSON codec.

use crate::codec::{Codec, DecodeError, EncodeError};

/// Human readable codec backed by `serde_json`.
///
/// Larger and slower than [`PostcardCodec`](crate::codec::PostcardCodec),
/// but self-describing, which makes payloads easy to inspect on the bus and
/// tolerant of added optional fields.
///
/// # Examples
///
/// ```rust
/// use busrpc::codec::{Codec, JsonCodec};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = JsonCodec::new();
/// let bytes = codec.encode(&vec![1, 2, 3])?;
/// assert_eq!(bytes, b"[1,2,3]");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Creates a codec producing compact JSON.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Produces indented JSON.
    pub fn with_pretty_print(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Produces compact JSON. This is the default.
    pub fn with_compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl Codec for JsonCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, EncodeError>
    where
        T: serde::Serialize + ?Sized,
    {
        if self.pretty {
            serde_json::to_vec_pretty(value).map_err(|e| EncodeError::format(self.name(), e))
        } else {
            serde_json::to_vec(value).map_err(|e| EncodeError::format(self.name(), e))
        }
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DecodeError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(bytes).map_err(|e| DecodeError::malformed(self.name(), e))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
