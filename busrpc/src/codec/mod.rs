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

//! Pluggable argument codecs.
//!
//! Every call argument and return value travels as an opaque payload inside
//! the request and response envelopes. The [`Codec`] trait decides how a
//! typed value becomes that payload. Client and server are generic over the
//! codec and must be configured with the same one.
//!
//! # Codecs
//!
//! - [`PostcardCodec`] (default): compact binary, not self-describing.
//! - [`JsonCodec`] (feature `json`): human readable, larger.
//!
//! # Examples
//!
//! ```rust
//! use busrpc::codec::{Codec, PostcardCodec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = PostcardCodec::default();
//! let bytes = codec.encode(&Point { x: 1, y: 2 })?;
//! let point: Point = codec.decode(&bytes)?;
//! assert_eq!(point, Point { x: 1, y: 2 });
//! # Ok(())
//! # }
//! ```

mod error;
mod postcard;
mod traits;

#[cfg(feature = "json")]
mod json;

pub use self::error::{DecodeError, EncodeError, FormatError};
pub use self::postcard::PostcardCodec;
pub use self::traits::Codec;

#[cfg(feature = "json")]
pub use self::json::JsonCodec;
