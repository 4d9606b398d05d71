use thiserror::Error;

/// Top-level error type for the `ymir-api` crate.
///
/// Only construction and decoding can fail here. Network failures are not
/// errors at this layer: they are reported as
/// [`HttpOutcome::TransportError`](crate::HttpOutcome::TransportError) so
/// the caller can classify them.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key contains bytes that cannot be sent in an HTTP header.
    #[error("Invalid API key: {reason}")]
    InvalidApiKey { reason: String },

    // ── Transport setup ─────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Printer URL uses a scheme other than http/https.
    #[error("Unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
