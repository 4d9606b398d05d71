//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use ymir_config::ConfigError;
use ymir_core::{ConnectivityState, CoreError, MonitorSnapshot};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Printer '{printer}' is offline: {reason}")]
    #[diagnostic(
        code(ymir::offline),
        help(
            "Check that the printer host is powered on and reachable.\n\
             Try: ymir -v status {printer}"
        )
    )]
    Offline { printer: String, reason: String },

    #[error("Printer '{printer}' did not answer in time: {reason}")]
    #[diagnostic(
        code(ymir::timeout),
        help("Increase request_timeout_secs in [defaults] or check the host's load.")
    )]
    Timeout { printer: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Printer '{printer}' rejected the API key")]
    #[diagnostic(
        code(ymir::forbidden),
        help(
            "Verify the key under Settings > API on the printer host.\n\
             The key is read from api_key_env, the system keyring, or api_key, in that order."
        )
    )]
    Forbidden { printer: String },

    #[error("No API key configured for printer '{printer}'")]
    #[diagnostic(
        code(ymir::no_credentials),
        help(
            "Set api_key or api_key_env under [printers.{printer}],\n\
             or store the key in the system keyring as ymir / {printer}/api-key."
        )
    )]
    NoCredentials { printer: String },

    // ── Printer state ────────────────────────────────────────────────

    #[error("Printer '{printer}' answered with an unexpected response: {message}")]
    #[diagnostic(code(ymir::printer))]
    Printer { printer: String, message: String },

    #[error("A monitoring session for '{printer}' is already running")]
    #[diagnostic(code(ymir::session_conflict))]
    SessionConflict { printer: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Printer '{printer}' not found in configuration")]
    #[diagnostic(
        code(ymir::printer_not_found),
        help(
            "Configured printers: {available}\n\
             Run: ymir printers"
        )
    )]
    PrinterNotFound { printer: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(ymir::no_config),
        help("Expected at: {path}")
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ymir::validation))]
    Validation { field: String, reason: String },

    #[error("Could not read configuration: {message}")]
    #[diagnostic(code(ymir::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(ymir::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(ymir::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(ymir::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Offline { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Forbidden { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PrinterNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate a core error raised while talking to `printer`.
    pub fn from_core(err: CoreError, printer: &str) -> Self {
        let printer = printer.to_owned();
        match err {
            CoreError::Transport {
                reason,
                timed_out: true,
            } => Self::Timeout { printer, reason },
            CoreError::Transport { reason, .. } => Self::Offline { printer, reason },
            CoreError::ReconnectExhausted { .. } | CoreError::Conflict => Self::Offline {
                printer,
                reason: err.to_string(),
            },
            CoreError::Forbidden => Self::Forbidden { printer },
            CoreError::SessionAlreadyActive { id } => Self::SessionConflict { printer: id },
            CoreError::Config { message } => Self::Validation {
                field: "defaults".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
            other => Self::Printer {
                printer,
                message: other.to_string(),
            },
        }
    }

    /// The error a one-shot command should fail with for `snapshot`, if any.
    ///
    /// Only `ONLINE` is success. A snapshot left in `RECONNECTING` after an
    /// accepted connect command counts as offline: the next poll has not
    /// confirmed the printer yet.
    pub fn from_snapshot(snapshot: &MonitorSnapshot) -> Option<Self> {
        let printer = snapshot.printer_id.as_str();
        match (snapshot.state, snapshot.last_error.clone()) {
            (ConnectivityState::Online, _) => None,
            (ConnectivityState::Forbidden, _) => Some(Self::Forbidden {
                printer: printer.to_owned(),
            }),
            (_, Some(err)) => Some(Self::from_core(err, printer)),
            (state, None) => Some(Self::Offline {
                printer: printer.to_owned(),
                reason: format!("printer is {state}"),
            }),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { printer } => Self::NoCredentials { printer },
            ConfigError::UnknownPrinter { printer } => Self::PrinterNotFound {
                printer,
                available: "(none)".into(),
            },
            ConfigError::NotFound { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
