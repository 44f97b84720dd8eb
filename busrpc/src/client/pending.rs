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

//! Tracking of calls awaiting their response.

use crate::protocol::Response;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Correlation id to waiting caller.
///
/// The lock is never held across an await; completion happens from the
/// delivery task while callers wait on their own oneshot receiver.
#[derive(Debug, Default)]
pub(crate) struct PendingCalls {
    calls: Mutex<HashMap<String, oneshot::Sender<Response>>>,
}

/// A registered call. Dropping it removes the entry, so a call that timed
/// out or was abandoned leaves nothing behind.
#[derive(Debug)]
pub(crate) struct PendingCall<'a> {
    table: &'a PendingCalls,
    correlation_id: String,
    rx: oneshot::Receiver<Response>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a call under `correlation_id`.
    pub(crate) fn register(&self, correlation_id: String) -> PendingCall<'_> {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().insert(correlation_id.clone(), tx);
        PendingCall {
            table: self,
            correlation_id,
            rx,
        }
    }

    /// Hands `response` to the call waiting on its correlation id.
    ///
    /// Gives the response back if no live call is waiting for it.
    pub(crate) fn complete(&self, response: Response) -> Result<(), Response> {
        let sender = self.calls.lock().remove(&response.correlation_id);
        match sender {
            Some(tx) => tx.send(response),
            None => Err(response),
        }
    }

    /// Removes a call without completing it.
    pub(crate) fn cancel(&self, correlation_id: &str) -> bool {
        self.calls.lock().remove(correlation_id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.lock().len()
    }
}

impl PendingCall<'_> {
    pub(crate) fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Waits for the response. `None` if the entry was cancelled.
    pub(crate) async fn wait(&mut self) -> Option<Response> {
        (&mut self.rx).await.ok()
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.table.cancel(&self.correlation_id);
    }
}
