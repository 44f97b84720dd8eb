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

//! Correlation id generation.

use uuid::Uuid;

/// Returns a fresh correlation id: 32 lowercase hex characters.
///
/// Ids are random rather than sequential so that clients sharing a reply
/// subject cannot collide.
pub(crate) fn next_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}
