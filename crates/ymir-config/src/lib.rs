//! Shared configuration for the ymir CLI.
//!
//! TOML printer profiles, credential resolution (env + keyring +
//! plaintext), and translation to `ymir_core::PrinterEndpoint` and
//! `ymir_core::MonitorConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ymir_core::{
    MonitorConfig, PrinterEndpoint, PrinterMetadata, PrinterType, ReconnectPolicy,
    TlsVerification,
};

const KEYRING_SERVICE: &str = "ymir";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for printer '{printer}'")]
    NoCredentials { printer: String },

    #[error("printer '{printer}' is not configured")]
    UnknownPrinter { printer: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Configured printers, keyed by id.
    #[serde(default)]
    pub printers: BTreeMap<String, PrinterProfile>,
}

impl Config {
    pub fn printer(&self, id: &str) -> Result<&PrinterProfile, ConfigError> {
        self.printers
            .get(id)
            .ok_or_else(|| ConfigError::UnknownPrinter { printer: id.into() })
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Accept self-signed certificates on every printer.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub reconnect: ReconnectDefaults,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            insecure: false,
            reconnect: ReconnectDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconnectDefaults {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectDefaults {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    3
}
fn default_max_attempts() -> u32 {
    5
}
fn default_base_delay() -> u64 {
    1_000
}
fn default_max_delay() -> u64 {
    30_000
}

/// A configured printer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrinterProfile {
    /// Display name.
    pub name: Option<String>,

    /// Printer host base URL (e.g., "http://octopi.local").
    pub url: String,

    /// API key (plaintext — prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Send a connect command when the host reports a conflict.
    #[serde(default)]
    pub auto_connect: bool,

    /// List only this folder of the host's local storage (e.g. "ymir").
    pub files_folder: Option<String>,

    /// Host software flavour, e.g. "octoprint".
    pub api_type: Option<String>,

    pub location: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub version: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "ymir", "ymir").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ymir");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from the platform config path + environment.
///
/// A missing file is not an error; defaults and env still apply.
pub fn load_config() -> Result<Config, ConfigError> {
    extract(&config_path())
}

/// Load config from an explicit file + environment. The file must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    extract(path)
}

fn extract(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("YMIR_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a printer's API key: env var, then keyring, then plaintext.
pub fn resolve_api_key(
    profile: &PrinterProfile,
    printer_id: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(val) = profile
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{printer_id}/api-key")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        printer: printer_id.into(),
    })
}

// ── Translation to core types ───────────────────────────────────────

/// Build a `PrinterEndpoint` from a profile.
pub fn profile_to_endpoint(
    profile: &PrinterProfile,
    printer_id: &str,
    defaults: &Defaults,
) -> Result<PrinterEndpoint, ConfigError> {
    let base_url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: format!("printers.{printer_id}.url"),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let api_key = resolve_api_key(profile, printer_id)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut endpoint = PrinterEndpoint::new(printer_id, base_url, api_key)
        .with_auto_connect(profile.auto_connect)
        .with_files_folder(profile.files_folder.clone());
    endpoint.tls = tls;
    endpoint.metadata = PrinterMetadata {
        display_name: profile.name.clone(),
        location: profile.location.clone(),
        api_type: profile.api_type.clone(),
        printer_type: PrinterType {
            make: profile.make.clone(),
            model: profile.model.clone(),
            version: profile.version.clone(),
        },
        tags: profile.tags.clone(),
    };
    Ok(endpoint)
}

/// Build a validated `MonitorConfig` from the global defaults.
pub fn defaults_to_monitor_config(defaults: &Defaults) -> Result<MonitorConfig, ConfigError> {
    let config = MonitorConfig {
        poll_interval: Duration::from_secs(defaults.poll_interval_secs),
        request_timeout: Duration::from_secs(defaults.request_timeout_secs),
        reconnect: ReconnectPolicy {
            max_attempts: defaults.reconnect.max_attempts,
            base_delay: Duration::from_millis(defaults.reconnect.base_delay_ms),
            max_delay: Duration::from_millis(defaults.reconnect.max_delay_ms),
        },
    };
    config
        .validate()
        .map_err(|e| ConfigError::Validation {
            field: "defaults".into(),
            reason: e.to_string(),
        })?;
    Ok(config)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    const SAMPLE: &str = r#"
[defaults]
poll_interval_secs = 10
request_timeout_secs = 4

[defaults.reconnect]
max_attempts = 3

[printers.prusa]
name = "Prusa Mk3S+"
url = "http://octopi.local"
api_key = "plaintext-key"
auto_connect = true
api_type = "octoprint"
location = "Garage"
make = "Prusa"
model = "Mk3S+"
tags = ["pla", "petg"]

[printers.ender]
url = "https://ender.lan:8443"
insecure = true
"#;

    #[test]
    fn loads_printers_and_defaults() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).expect("config loads");

        assert_eq!(config.defaults.poll_interval_secs, 10);
        assert_eq!(config.defaults.reconnect.max_attempts, 3);
        assert_eq!(config.defaults.reconnect.base_delay_ms, 1_000);
        assert_eq!(
            config.printers.keys().collect::<Vec<_>>(),
            vec!["ender", "prusa"]
        );

        let prusa = config.printer("prusa").expect("prusa configured");
        assert!(prusa.auto_connect);
        assert_eq!(prusa.tags, vec!["pla".to_string(), "petg".to_string()]);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config_from(Path::new("/definitely/not/here/ymir.toml"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn unknown_printer_is_reported() {
        let config = Config::default();
        assert!(matches!(
            config.printer("nope"),
            Err(ConfigError::UnknownPrinter { .. })
        ));
    }

    #[test]
    fn profile_becomes_endpoint_with_metadata() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).expect("config loads");
        let profile = config.printer("prusa").expect("prusa configured");

        let endpoint =
            profile_to_endpoint(profile, "prusa", &config.defaults).expect("endpoint builds");

        assert_eq!(endpoint.id, "prusa");
        assert!(endpoint.auto_connect);
        assert_eq!(endpoint.display_name(), "Prusa Mk3S+");
        assert_eq!(endpoint.metadata.location.as_deref(), Some("Garage"));
        assert_eq!(endpoint.metadata.printer_type.make.as_deref(), Some("Prusa"));
        assert_eq!(endpoint.tls, TlsVerification::SystemDefaults);
        assert_eq!(endpoint.api_key.expose_secret(), "plaintext-key");
    }

    #[test]
    fn files_folder_reaches_the_endpoint() {
        let profile = PrinterProfile {
            url: "http://octopi.local".into(),
            api_key: Some("k".into()),
            files_folder: Some("ymir".into()),
            ..PrinterProfile::default()
        };
        let endpoint =
            profile_to_endpoint(&profile, "mk3", &Defaults::default()).expect("endpoint");
        assert_eq!(endpoint.files_folder.as_deref(), Some("ymir"));
        assert!(endpoint.device_client().is_ok());
    }

    #[test]
    fn insecure_profile_accepts_invalid_certs() {
        let profile = PrinterProfile {
            url: "https://ender.lan".into(),
            api_key: Some("k".into()),
            insecure: Some(true),
            ..PrinterProfile::default()
        };
        let endpoint =
            profile_to_endpoint(&profile, "ender", &Defaults::default()).expect("endpoint");
        assert_eq!(endpoint.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let profile = PrinterProfile {
            url: "not a url".into(),
            api_key: Some("k".into()),
            ..PrinterProfile::default()
        };
        let err = profile_to_endpoint(&profile, "bad", &Defaults::default())
            .expect_err("invalid URL");
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn env_var_key_takes_precedence_over_plaintext() {
        // Cargo sets CARGO_MANIFEST_DIR for test processes.
        let profile = PrinterProfile {
            url: "http://octopi.local".into(),
            api_key: Some("plaintext".into()),
            api_key_env: Some("CARGO_MANIFEST_DIR".into()),
            ..PrinterProfile::default()
        };
        let key = resolve_api_key(&profile, "ymir-test-env-precedence").expect("key resolves");
        assert_eq!(key.expose_secret(), env!("CARGO_MANIFEST_DIR"));
    }

    #[test]
    fn unset_env_var_falls_back_to_plaintext() {
        let profile = PrinterProfile {
            url: "http://octopi.local".into(),
            api_key: Some("plaintext".into()),
            api_key_env: Some("YMIR_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..PrinterProfile::default()
        };
        let key = resolve_api_key(&profile, "ymir-test-fallback").expect("key resolves");
        assert_eq!(key.expose_secret(), "plaintext");
    }

    #[test]
    fn no_key_anywhere_is_reported() {
        let profile = PrinterProfile {
            url: "http://octopi.local".into(),
            ..PrinterProfile::default()
        };
        let err = resolve_api_key(&profile, "ymir-test-no-key").expect_err("no key");
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn defaults_translate_to_monitor_config() {
        let config = defaults_to_monitor_config(&Defaults::default()).expect("valid defaults");
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn timeout_not_shorter_than_interval_is_rejected() {
        let defaults = Defaults {
            poll_interval_secs: 3,
            request_timeout_secs: 3,
            ..Defaults::default()
        };
        assert!(matches!(
            defaults_to_monitor_config(&defaults),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn config_renders_back_to_toml() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).expect("config loads");
        let rendered = config.to_toml().expect("serializes");
        assert!(rendered.contains("[printers.prusa]"));
        assert!(rendered.contains("poll_interval_secs = 10"));
    }
}
