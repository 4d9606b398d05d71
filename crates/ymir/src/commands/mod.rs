//! Command handlers and the plumbing they share.

pub mod files;
pub mod job;
pub mod printers;
pub mod status;
pub mod watch;

use std::sync::Arc;

use ymir_config::{Config, PrinterProfile};
use ymir_core::{ConnectivityState, DeviceClient, MonitorSnapshot, PrinterEndpoint, PrinterMonitor};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Printers => printers::handle(global),
        Command::Status(args) => status::handle(args, global).await,
        Command::Job(args) => job::handle(args, global).await,
        Command::Files(args) => files::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        Command::Completions(_) => Err(CliError::Internal(
            "completions are handled before dispatch".into(),
        )),
    }
}

// ── Shared helpers ───────────────────────────────────────────────────

/// Load the configuration from `--config` or the default location.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match global.config.as_deref() {
        Some(path) => ymir_config::load_config_from(path)?,
        None => ymir_config::load_config()?,
    };
    Ok(config)
}

/// Look up a printer profile, listing the configured ids on failure.
pub fn find_profile<'a>(config: &'a Config, id: &str) -> Result<&'a PrinterProfile, CliError> {
    config.printers.get(id).ok_or_else(|| {
        let available = if config.printers.is_empty() {
            "(none)".to_owned()
        } else {
            config.printers.keys().cloned().collect::<Vec<_>>().join(", ")
        };
        CliError::PrinterNotFound {
            printer: id.to_owned(),
            available,
        }
    })
}

/// Resolve a printer's endpoint and build its HTTP client.
pub fn connect(
    config: &Config,
    id: &str,
) -> Result<(PrinterEndpoint, Arc<DeviceClient>), CliError> {
    let profile = find_profile(config, id)?;
    let endpoint = ymir_config::profile_to_endpoint(profile, id, &config.defaults)?;
    let client = endpoint
        .device_client()
        .map_err(|e| CliError::from_core(e, id))?;
    Ok((endpoint, Arc::new(client)))
}

/// Build a standalone monitor for one-shot commands.
pub fn build_monitor(config: &Config, id: &str) -> Result<PrinterMonitor<DeviceClient>, CliError> {
    let (endpoint, client) = connect(config, id)?;
    let monitor_config = ymir_config::defaults_to_monitor_config(&config.defaults)?;
    Ok(PrinterMonitor::new(endpoint, monitor_config, client))
}

/// Run one poll cycle, plus a confirming one if the cycle ended with an
/// accepted reconnect.
pub async fn poll_settled(monitor: &mut PrinterMonitor<DeviceClient>) -> Arc<MonitorSnapshot> {
    let snapshot = monitor.poll_once().await;
    if snapshot.state == ConnectivityState::Reconnecting && snapshot.last_error.is_none() {
        tracing::debug!(printer = %snapshot.printer_id, "connect accepted, polling again");
        return monitor.poll_once().await;
    }
    snapshot
}
