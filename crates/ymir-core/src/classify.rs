// ── Connectivity classification ──
//
// Pure mapping from one `GET /api/printer` outcome to a connectivity
// state. The decoded status body rides along so the orchestrator never
// parses the same response twice.

use ymir_api::{HttpOutcome, RawPrinterStatus, models};

use crate::error::CoreError;
use crate::model::{ConnectivityState, PrinterStatusSnapshot};

/// Result of classifying one status poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub state: ConnectivityState,
    /// Decoded status body. `Some` only when `state` is `Online`.
    pub status: Option<PrinterStatusSnapshot>,
    /// Why the poll did not come back online. `None` when `Online`.
    pub error: Option<CoreError>,
}

impl Classification {
    fn failed(state: ConnectivityState, error: CoreError) -> Self {
        Self {
            state,
            status: None,
            error: Some(error),
        }
    }

    /// Whether the reconnect supervisor should run for this poll.
    pub fn needs_reconnect(&self) -> bool {
        self.state == ConnectivityState::Reconnecting
    }
}

/// Classify a status outcome.
///
/// | outcome                  | state                                      |
/// |--------------------------|--------------------------------------------|
/// | 2xx, body decodes        | `Online`                                   |
/// | 2xx, body malformed      | `Unknown`                                  |
/// | 403                      | `Forbidden`                                |
/// | 409                      | `Reconnecting` if `auto_connect`, else `Offline` |
/// | any other status         | `Offline`                                  |
/// | transport failure        | `Offline`                                  |
pub fn classify(outcome: &HttpOutcome, auto_connect: bool) -> Classification {
    match outcome {
        HttpOutcome::Ok { body, .. } => match models::decode::<RawPrinterStatus>(body) {
            Ok(raw) => Classification {
                state: ConnectivityState::Online,
                status: Some(raw.into()),
                error: None,
            },
            Err(e) => Classification::failed(ConnectivityState::Unknown, e.into()),
        },
        HttpOutcome::HttpError { status: 403 } => {
            Classification::failed(ConnectivityState::Forbidden, CoreError::Forbidden)
        }
        HttpOutcome::HttpError { status: 409 } => {
            let state = if auto_connect {
                ConnectivityState::Reconnecting
            } else {
                ConnectivityState::Offline
            };
            Classification::failed(state, CoreError::Conflict)
        }
        HttpOutcome::HttpError { status } => Classification::failed(
            ConnectivityState::Offline,
            CoreError::HttpStatus { status: *status },
        ),
        HttpOutcome::TransportError(failure) => {
            Classification::failed(ConnectivityState::Offline, failure.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ymir_api::{TransportFailure, TransportKind};

    use super::*;

    const STATUS_BODY: &str = r#"{
        "sd": {"ready": false},
        "state": {
            "text": "Printing",
            "flags": {"operational": true, "printing": true, "paused": false, "error": false, "sdReady": false}
        },
        "temperature": {
            "tool0": {"actual": 214.8, "target": 215.0, "offset": 0},
            "bed": {"actual": 59.9, "target": 60.0, "offset": 0}
        }
    }"#;

    fn ok(body: &str) -> HttpOutcome {
        HttpOutcome::Ok {
            status: 200,
            body: body.to_owned(),
        }
    }

    #[test]
    fn ok_with_valid_body_is_online() {
        let c = classify(&ok(STATUS_BODY), false);
        assert_eq!(c.state, ConnectivityState::Online);
        assert_eq!(c.error, None);

        let status = c.status.expect("status decoded");
        assert_eq!(status.state_text, "Printing");
        assert!(status.flags.printing);
        assert_eq!(status.temperatures["tool0"].target, Some(215.0));
    }

    #[test]
    fn malformed_body_is_unknown_with_decode_error() {
        let c = classify(&ok("{\"state\": 42}"), true);
        assert_eq!(c.state, ConnectivityState::Unknown);
        assert_eq!(c.status, None);
        assert!(matches!(c.error, Some(CoreError::Decode { .. })));
    }

    #[test]
    fn forbidden_never_reconnects() {
        for auto_connect in [false, true] {
            let c = classify(&HttpOutcome::HttpError { status: 403 }, auto_connect);
            assert_eq!(c.state, ConnectivityState::Forbidden);
            assert!(!c.needs_reconnect());
            assert_eq!(c.error, Some(CoreError::Forbidden));
        }
    }

    #[test]
    fn conflict_depends_on_auto_connect() {
        let conflict = HttpOutcome::HttpError { status: 409 };
        assert_eq!(classify(&conflict, false).state, ConnectivityState::Offline);

        let c = classify(&conflict, true);
        assert_eq!(c.state, ConnectivityState::Reconnecting);
        assert!(c.needs_reconnect());
        assert_eq!(c.error, Some(CoreError::Conflict));
    }

    #[test]
    fn other_statuses_are_offline() {
        for status in [400, 401, 404, 500, 502, 503] {
            let c = classify(&HttpOutcome::HttpError { status }, true);
            assert_eq!(c.state, ConnectivityState::Offline, "status {status}");
            assert_eq!(c.error, Some(CoreError::HttpStatus { status }));
        }
    }

    #[test]
    fn transport_failure_is_offline() {
        let outcome = HttpOutcome::TransportError(TransportFailure::new(
            TransportKind::Timeout,
            "operation timed out",
        ));
        let c = classify(&outcome, true);
        assert_eq!(c.state, ConnectivityState::Offline);
        assert!(matches!(
            c.error,
            Some(CoreError::Transport {
                timed_out: true,
                ..
            })
        ));
    }
}
