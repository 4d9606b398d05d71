// ── Runtime monitoring configuration ──
//
// These types describe *what* to monitor and *how often*. They carry
// credential data and timing, but never touch disk. The CLI builds a
// `PrinterEndpoint` + `MonitorConfig` and hands them to a session.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use url::Url;

use ymir_api::transport::{TlsMode, TransportConfig};
use ymir_api::DeviceClient;

use crate::error::CoreError;
use crate::reconnect::ReconnectPolicy;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed printer hosts).
    DangerAcceptInvalid,
}

/// Make / model / firmware of the physical printer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrinterType {
    pub make: Option<String>,
    pub model: Option<String>,
    pub version: Option<String>,
}

/// Descriptive information about a printer. Never affects monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrinterMetadata {
    pub display_name: Option<String>,
    pub location: Option<String>,
    /// Host software flavour, e.g. `octoprint`.
    pub api_type: Option<String>,
    pub printer_type: PrinterType,
    pub tags: Vec<String>,
}

/// A configured printer: address, credential and reconnect preference.
///
/// Immutable for the lifetime of a monitoring session. To change any
/// field, restart the session with a new endpoint.
#[derive(Debug, Clone)]
pub struct PrinterEndpoint {
    pub id: String,
    pub base_url: Url,
    pub api_key: SecretString,
    /// Send a connect command when the host reports HTTP 409.
    pub auto_connect: bool,
    /// Folder under local storage to list. `None` lists everything.
    pub files_folder: Option<String>,
    pub tls: TlsVerification,
    pub metadata: PrinterMetadata,
}

impl PrinterEndpoint {
    pub fn new(id: impl Into<String>, base_url: Url, api_key: SecretString) -> Self {
        Self {
            id: id.into(),
            base_url,
            api_key,
            auto_connect: false,
            files_folder: None,
            tls: TlsVerification::default(),
            metadata: PrinterMetadata::default(),
        }
    }

    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    pub fn with_files_folder(mut self, folder: Option<String>) -> Self {
        self.files_folder = folder;
        self
    }

    /// Human-facing name, falling back to the endpoint id.
    pub fn display_name(&self) -> &str {
        self.metadata.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Build the HTTP client for this endpoint.
    pub fn device_client(&self) -> Result<DeviceClient, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&self.tls),
            ..TransportConfig::default()
        };
        let client = DeviceClient::from_api_key(&self.base_url, &self.api_key, &transport)?;
        match self.files_folder.as_deref() {
            Some(folder) => Ok(client.with_files_folder(folder)?),
            None => Ok(client),
        }
    }
}

/// Timing for one monitoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Delay between the end of one poll cycle and the start of the next.
    pub poll_interval: Duration,
    /// Per-request timeout. Must be shorter than `poll_interval`.
    pub request_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(3),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.request_timeout.is_zero() {
            return Err(CoreError::Config {
                message: "request timeout must be greater than zero".into(),
            });
        }
        if self.request_timeout >= self.poll_interval {
            return Err(CoreError::Config {
                message: format!(
                    "request timeout ({:?}) must be shorter than the poll interval ({:?})",
                    self.request_timeout, self.poll_interval
                ),
            });
        }
        self.reconnect.validate()
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
