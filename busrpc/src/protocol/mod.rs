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

//! Wire protocol.
//!
//! A call is one [`Request`] published to the server's subject and, when the
//! caller asked for one, one [`Response`] published to the caller's reply
//! subject:
//!
//! ```text
//! client ── Request{correlation_id, reply_subject, method, params} ──▶ server subject
//! client ◀── Response{correlation_id, result | error} ── reply subject
//! ```
//!
//! Casts leave `correlation_id` and `reply_subject` empty and never receive
//! a response.

mod envelope;

pub use self::envelope::{EnvelopeError, Request, Response};
