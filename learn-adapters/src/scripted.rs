//! Deterministic completion client that replays queued responses.
//!
//! Used by tests and offline demos in place of a live provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, CompletionClient, JsonCompletionRequest,
};

/// Completion client that answers from a fixed script, in order.
///
/// Once the script is exhausted every call fails with a transport error, so a
/// caller that invokes the client more often than expected fails loudly.
#[derive(Debug)]
pub struct ScriptedClient {
    metadata: AdapterMetadata,
    script: Mutex<VecDeque<AdapterResult<String>>>,
    requests: Mutex<Vec<JsonCompletionRequest>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: AdapterMetadata::new("scripted", "replay"),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a client that returns the supplied raw completions in order.
    #[must_use]
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for response in responses {
            client.push_response(response);
        }
        client
    }

    /// Queues a raw completion.
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_script().push_back(Ok(response.into()));
    }

    /// Queues a failure of the completion capability itself.
    pub fn push_error(&self, error: AdapterError) {
        self.lock_script().push_back(Err(error));
    }

    /// Returns how many times [`CompletionClient::complete_json`] was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<JsonCompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<AdapterResult<String>>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn complete_json(&self, request: JsonCompletionRequest) -> AdapterResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.lock_script()
            .pop_front()
            .unwrap_or_else(|| Err(AdapterError::transport("scripted client has no more responses")))
    }
}
