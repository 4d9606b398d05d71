// In-memory `DeviceApi` whose responses are queued per endpoint.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use ymir_api::{DeviceApi, HttpOutcome, TransportFailure, TransportKind};

/// Queued outcomes for one endpoint plus a record of when it was called.
#[derive(Default)]
pub(crate) struct Script {
    queued: Mutex<VecDeque<HttpOutcome>>,
    fallback: Mutex<Option<HttpOutcome>>,
    calls: Mutex<Vec<Instant>>,
}

impl Script {
    /// Answer the next call with `outcome`.
    pub(crate) fn push(&self, outcome: HttpOutcome) {
        self.queued.lock().expect("lock").push_back(outcome);
    }

    /// Answer every call once the queue is empty with `outcome`.
    pub(crate) fn always(&self, outcome: HttpOutcome) {
        *self.fallback.lock().expect("lock") = Some(outcome);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }

    pub(crate) fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().expect("lock").clone()
    }

    fn next(&self) -> HttpOutcome {
        self.calls.lock().expect("lock").push(Instant::now());
        if let Some(outcome) = self.queued.lock().expect("lock").pop_front() {
            return outcome;
        }
        self.fallback.lock().expect("lock").clone().unwrap_or_else(|| {
            HttpOutcome::TransportError(TransportFailure::new(
                TransportKind::Connect,
                "unscripted call",
            ))
        })
    }
}

#[derive(Default)]
pub(crate) struct ScriptedDevice {
    pub(crate) status: Script,
    pub(crate) job: Script,
    pub(crate) files: Script,
    pub(crate) connect: Script,
}

impl ScriptedDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl DeviceApi for ScriptedDevice {
    async fn fetch_status(&self, _timeout: Duration) -> HttpOutcome {
        self.status.next()
    }

    async fn fetch_job(&self, _timeout: Duration) -> HttpOutcome {
        self.job.next()
    }

    async fn fetch_files(&self, _timeout: Duration) -> HttpOutcome {
        self.files.next()
    }

    async fn send_connect_command(&self, _timeout: Duration) -> HttpOutcome {
        self.connect.next()
    }
}

// ── Outcome builders ─────────────────────────────────────────────────

pub(crate) fn status(code: u16) -> HttpOutcome {
    HttpOutcome::HttpError { status: code }
}

pub(crate) fn no_content() -> HttpOutcome {
    HttpOutcome::Ok {
        status: 204,
        body: String::new(),
    }
}

pub(crate) fn unreachable() -> HttpOutcome {
    HttpOutcome::TransportError(TransportFailure::new(
        TransportKind::Connect,
        "connection refused",
    ))
}

pub(crate) fn ok_json(value: &serde_json::Value) -> HttpOutcome {
    HttpOutcome::Ok {
        status: 200,
        body: value.to_string(),
    }
}

pub(crate) fn printing_status() -> HttpOutcome {
    ok_json(&json!({
        "sd": { "ready": true },
        "state": {
            "text": "Printing",
            "flags": { "operational": true, "printing": true, "ready": false, "sdReady": true }
        },
        "temperature": {
            "tool0": { "actual": 214.8, "target": 215.0, "offset": 0 },
            "bed": { "actual": 60.1, "target": 60.0, "offset": 0 }
        }
    }))
}

pub(crate) fn job_at(completion: f64) -> HttpOutcome {
    ok_json(&json!({
        "job": {
            "file": { "name": "benchy.gcode", "display": "Benchy.gcode", "origin": "local" },
            "estimatedPrintTime": 5400.0
        },
        "progress": {
            "completion": completion,
            "printTime": 3661,
            "printTimeLeft": 1739,
            "printTimeLeftOrigin": "estimate"
        },
        "state": "Printing"
    }))
}
