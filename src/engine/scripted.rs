/*!
 * Scripted Engine
 * In-process engine replaying queued responses
 *
 * Never suspends anything. Each call pops the next queued response (OK when
 * the queue is empty) and records the request, which makes it usable both as
 * a demo backend and as a test double.
 */

use super::types::{EngineRequest, EngineResponse, EngineStatus};
use super::CheckpointEngine;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct ScriptedEngine {
    supported: AtomicBool,
    responses: Mutex<VecDeque<EngineResponse>>,
    requests: Mutex<Vec<EngineRequest>>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            supported: AtomicBool::new(true),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Engine answering every call with the given responses in turn
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = EngineResponse>,
    {
        let engine = Self::new();
        engine.responses.lock().extend(responses);
        engine
    }

    #[must_use]
    pub fn with_supported(self, supported: bool) -> Self {
        self.supported.store(supported, Ordering::Relaxed);
        self
    }

    /// Queue a response for a later call
    pub fn push_response(&self, response: EngineResponse) {
        self.responses.lock().push_back(response);
    }

    /// Number of times the engine was invoked
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.requests.lock().last().cloned()
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointEngine for ScriptedEngine {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::Relaxed)
    }

    fn checkpoint_restore(&self, request: EngineRequest) -> EngineResponse {
        let call = self.calls.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(
            "Scripted engine call {} (dry_run={}, {} claimed handle(s))",
            call,
            request.dry_run,
            request.claimed_handles.len()
        );
        self.requests.lock().push(request);

        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(EngineResponse::ok);
        if response.status() == EngineStatus::Ok {
            info!("Scripted engine simulated a successful restore");
        }
        response
    }
}
