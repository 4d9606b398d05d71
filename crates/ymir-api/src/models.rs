// Canonical wire schema for the printer host's REST API.
//
// Each endpoint has exactly one accepted shape. Fields the host may omit
// or send as `null` are `Option`/defaulted here, so callers never branch
// on shape; anything outside this schema is a decode error.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

const BODY_PREVIEW_CHARS: usize = 200;

// ── GET /api/printer ─────────────────────────────────────────────────

/// Body of `GET /api/printer`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawPrinterStatus {
    #[serde(default)]
    pub sd: Option<RawSdState>,
    pub state: RawPrinterState,
    /// Keyed by sensor name: `tool0`, `bed`, `chamber`, ...
    #[serde(default)]
    pub temperature: BTreeMap<String, RawTemperature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RawSdState {
    #[serde(default)]
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawPrinterState {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub error: String,
    pub flags: RawStateFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct RawStateFlags {
    #[serde(default)]
    pub cancelling: bool,
    #[serde(default)]
    pub closed_or_error: bool,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub finishing: bool,
    #[serde(default)]
    pub operational: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub pausing: bool,
    #[serde(default)]
    pub printing: bool,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub resuming: bool,
    #[serde(default)]
    pub sd_ready: bool,
}

/// One sensor reading. Hosts send `null` for sensors that are not heating.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct RawTemperature {
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
}

// ── GET /api/job ─────────────────────────────────────────────────────

/// Body of `GET /api/job`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawJobInformation {
    #[serde(default)]
    pub job: RawJob,
    #[serde(default)]
    pub progress: RawProgress,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJob {
    #[serde(default)]
    pub file: RawJobFile,
    #[serde(default)]
    pub estimated_print_time: Option<f64>,
    #[serde(default)]
    pub average_print_time: Option<f64>,
    #[serde(default)]
    pub last_print_time: Option<f64>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RawJobFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub date: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProgress {
    /// Percentage, nominally 0..=100.
    #[serde(default)]
    pub completion: Option<f64>,
    #[serde(default)]
    pub filepos: Option<u64>,
    /// Elapsed seconds.
    #[serde(default)]
    pub print_time: Option<f64>,
    /// Estimated remaining seconds.
    #[serde(default)]
    pub print_time_left: Option<f64>,
    /// Which estimator produced `print_time_left` (`"estimate"`, `"analysis"`, ...).
    #[serde(default)]
    pub print_time_left_origin: Option<String>,
}

// ── GET /api/files/local ─────────────────────────────────────────────

/// Body of `GET /api/files/local`. A folder listing names its entries
/// `children` instead of `files`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RawFileListing {
    #[serde(default, alias = "children")]
    pub files: Vec<RawFileEntry>,
    #[serde(default)]
    pub free: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawFileEntry {
    pub name: String,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub date: Option<i64>,
    /// `"machinecode"`, `"model"` or `"folder"`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// ── POST /api/printer ────────────────────────────────────────────────

/// Command payload asking the host to (re)open its serial connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectCommand {
    command: &'static str,
}

impl ConnectCommand {
    pub fn connect() -> Self {
        Self { command: "connect" }
    }
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Decode a response body into one of the wire types above.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_printer_status_with_null_temperatures() {
        let body = json!({
            "sd": { "ready": true },
            "state": {
                "text": "Operational",
                "flags": { "operational": true, "ready": true, "sdReady": true, "closedOrError": false }
            },
            "temperature": {
                "tool0": { "actual": 214.8, "target": 215.0, "offset": 0 },
                "bed": { "actual": 60.1, "target": null, "offset": 0 }
            }
        })
        .to_string();

        let status: RawPrinterStatus = decode(&body).expect("decodes");
        assert!(status.state.flags.operational);
        assert!(status.state.flags.sd_ready);
        assert_eq!(status.sd, Some(RawSdState { ready: true }));
        assert_eq!(status.temperature["bed"].target, None);
        assert_eq!(status.temperature["tool0"].actual, Some(214.8));
    }

    #[test]
    fn decode_idle_job_information() {
        let body = json!({
            "job": {
                "file": { "name": null, "origin": null, "size": null, "date": null },
                "estimatedPrintTime": null,
                "filament": null
            },
            "progress": { "completion": null, "filepos": null, "printTime": null, "printTimeLeft": null },
            "state": "Operational"
        })
        .to_string();

        let info: RawJobInformation = decode(&body).expect("decodes");
        assert_eq!(info.job.file.name, None);
        assert_eq!(info.progress.completion, None);
        assert_eq!(info.state, "Operational");
    }

    #[test]
    fn decode_failure_keeps_body_and_preview() {
        let err = decode::<RawPrinterStatus>("<html>502 Bad Gateway</html>")
            .expect_err("html is not a status body");
        match err {
            Error::Deserialization { message, body } => {
                assert!(message.contains("body preview"));
                assert_eq!(body, "<html>502 Bad Gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn connect_command_serializes_as_octoprint_payload() {
        let payload = serde_json::to_value(ConnectCommand::connect()).expect("serializes");
        assert_eq!(payload, json!({ "command": "connect" }));
    }
}
