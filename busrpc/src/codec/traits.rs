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

//! The pluggable codec contract.

use crate::codec::{DecodeError, EncodeError};

/// Strategy for marshaling call arguments and return values.
///
/// A codec only governs the opaque `params` and `result` payloads nested in
/// the request and response envelopes; envelope framing is fixed and does
/// not depend on it. Client and server must agree on the codec.
///
/// For every value type `T` a codec supports,
/// `decode::<T>(&encode(&v)?)? == v`.
///
/// # Thread Safety
///
/// Codecs hold configuration only and are shared across every concurrent
/// call and dispatch, so they must be `Send + Sync + 'static`.
///
/// # Examples
///
/// ```rust
/// use busrpc::codec::{Codec, DecodeError, EncodeError};
///
/// struct JsonLines;
///
/// impl Codec for JsonLines {
///     fn encode<T>(&self, value: &T) -> Result<Vec<u8>, EncodeError>
///     where
///         T: serde::Serialize + ?Sized,
///     {
///         let mut bytes = serde_json::to_vec(value)
///             .map_err(|e| EncodeError::format("json-lines", e))?;
///         bytes.push(b'\n');
///         Ok(bytes)
///     }
///
///     fn decode<T>(&self, bytes: &[u8]) -> Result<T, DecodeError>
///     where
///         T: serde::de::DeserializeOwned,
///     {
///         serde_json::from_slice(bytes).map_err(|e| DecodeError::malformed("json-lines", e))
///     }
///
///     fn name(&self) -> &'static str {
///         "json-lines"
///     }
/// }
/// ```
pub trait Codec: Send + Sync + 'static {
    /// Encodes a value into a payload.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the value cannot be represented by this
    /// codec.
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, EncodeError>
    where
        T: serde::Serialize + ?Sized;

    /// Decodes a payload into a value of the requested shape.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is corrupted or was produced
    /// for a different shape.
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DecodeError>
    where
        T: serde::de::DeserializeOwned;

    /// Returns a stable name for this codec, used in logs.
    fn name(&self) -> &'static str;
}
