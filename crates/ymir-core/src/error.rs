// ── Core error types ──
//
// Domain errors from ymir-core. Consumers never see raw HTTP outcomes or
// JSON parse failures directly: the classifier and the `From` impl below
// translate them into these variants. `CoreError` is `Clone` because the
// last cycle error travels inside every published snapshot.

use thiserror::Error;
use ymir_api::{HttpOutcome, TransportFailure};

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Printer unreachable: {reason}")]
    Transport { reason: String, timed_out: bool },

    #[error("Access forbidden (HTTP 403) -- check the printer's API key")]
    Forbidden,

    #[error("Printer reported a conflict (HTTP 409)")]
    Conflict,

    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed response body: {message}")]
    Decode { message: String },

    #[error("Data integrity error: {field} = {value} is out of range")]
    DataIntegrity { field: &'static str, value: String },

    // ── Reconnect ────────────────────────────────────────────────────
    #[error("Reconnect gave up after {attempts} attempt(s)")]
    ReconnectExhausted { attempts: u32 },

    #[error("Connect command rejected (HTTP {status})")]
    CommandRejected { status: u16 },

    // ── Sessions ─────────────────────────────────────────────────────
    #[error("A monitoring session for printer '{id}' is already active")]
    SessionAlreadyActive { id: String },

    #[error("No monitoring session for printer '{id}'")]
    SessionNotFound { id: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for errors caused by the printer rejecting our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Forbidden)
    }

    /// Returns `true` for errors that the normal poll cadence may clear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::Conflict
        )
    }

    /// The error a non-2xx or failed outcome represents on a read endpoint.
    ///
    /// Returns `None` for successful outcomes.
    pub fn from_outcome(outcome: &HttpOutcome) -> Option<Self> {
        match outcome {
            HttpOutcome::Ok { .. } => None,
            HttpOutcome::HttpError { status: 403 } => Some(Self::Forbidden),
            HttpOutcome::HttpError { status: 409 } => Some(Self::Conflict),
            HttpOutcome::HttpError { status } => Some(Self::HttpStatus { status: *status }),
            HttpOutcome::TransportError(failure) => Some(Self::from(failure)),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<&TransportFailure> for CoreError {
    fn from(failure: &TransportFailure) -> Self {
        CoreError::Transport {
            reason: failure.to_string(),
            timed_out: failure.is_timeout(),
        }
    }
}

impl From<ymir_api::Error> for CoreError {
    fn from(err: ymir_api::Error) -> Self {
        match err {
            ymir_api::Error::InvalidApiKey { reason } => CoreError::Config {
                message: format!("Invalid API key: {reason}"),
            },
            ymir_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ymir_api::Error::UnsupportedScheme { scheme } => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}'"),
            },
            ymir_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            ymir_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ymir_api::TransportKind;

    use super::*;

    #[test]
    fn outcome_mapping() {
        assert_eq!(
            CoreError::from_outcome(&HttpOutcome::HttpError { status: 403 }),
            Some(CoreError::Forbidden)
        );
        assert_eq!(
            CoreError::from_outcome(&HttpOutcome::HttpError { status: 502 }),
            Some(CoreError::HttpStatus { status: 502 })
        );
        assert_eq!(
            CoreError::from_outcome(&HttpOutcome::Ok {
                status: 200,
                body: String::new()
            }),
            None
        );
    }

    #[test]
    fn timeout_is_flagged() {
        let failure = TransportFailure::new(TransportKind::Timeout, "deadline elapsed");
        let err = CoreError::from(&failure);
        assert!(matches!(err, CoreError::Transport { timed_out: true, .. }));
        assert!(err.is_transient());
        assert!(!err.is_auth());
    }

    #[test]
    fn auth_and_data_errors_are_not_transient() {
        assert!(CoreError::Forbidden.is_auth());
        assert!(!CoreError::Forbidden.is_transient());
        assert!(CoreError::Conflict.is_transient());
        let decode = CoreError::Decode {
            message: "expected value".into(),
        };
        assert!(!decode.is_transient());
        assert!(!CoreError::CommandRejected { status: 400 }.is_auth());
    }

    #[test]
    fn deserialization_becomes_decode() {
        let err = CoreError::from(ymir_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        });
        assert_eq!(
            err,
            CoreError::Decode {
                message: "expected value".into()
            }
        );
    }
}
