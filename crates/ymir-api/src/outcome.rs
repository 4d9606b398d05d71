// Raw result of one HTTP round-trip to a printer host.
//
// The client never turns an HTTP status into an error: the core's
// classifier decides what a 403 or a 409 means. Transport failures are
// captured as plain data so outcomes stay `Clone` and comparable.

use std::fmt;

/// Coarse category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The per-call timeout elapsed before the response completed.
    Timeout,
    /// DNS failure, connection refused, TLS handshake failure.
    Connect,
    /// Anything else (body read failure, protocol error).
    Other,
}

/// A request that never produced an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Categorize a `reqwest` error.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else {
            TransportKind::Other
        };
        Self::new(kind, err.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportKind::Timeout
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            TransportKind::Timeout => "timed out",
            TransportKind::Connect => "connection failed",
            TransportKind::Other => "transport error",
        };
        write!(f, "{label}: {}", self.message)
    }
}

/// Outcome of a single request against a printer host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
    /// 2xx response. `body` is empty for `204 No Content`.
    Ok { status: u16, body: String },
    /// Non-2xx response. The body is not retained.
    HttpError { status: u16 },
    /// No HTTP status was received.
    TransportError(TransportFailure),
}

impl HttpOutcome {
    /// The HTTP status code, if the printer answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Ok { status, .. } | Self::HttpError { status } => Some(*status),
            Self::TransportError(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The response body of a successful call.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Ok { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl fmt::Display for HttpOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { status, .. } => write!(f, "HTTP {status}"),
            Self::HttpError { status } => write!(f, "HTTP {status}"),
            Self::TransportError(failure) => write!(f, "{failure}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_absent_for_transport_errors() {
        let outcome =
            HttpOutcome::TransportError(TransportFailure::new(TransportKind::Connect, "refused"));
        assert_eq!(outcome.status(), None);
        assert!(!outcome.is_success());
        assert_eq!(outcome.to_string(), "connection failed: refused");
    }

    #[test]
    fn body_only_for_success() {
        let ok = HttpOutcome::Ok {
            status: 200,
            body: "{}".into(),
        };
        let err = HttpOutcome::HttpError { status: 409 };
        assert_eq!(ok.body(), Some("{}"));
        assert_eq!(err.body(), None);
        assert_eq!(err.status(), Some(409));
    }
}
