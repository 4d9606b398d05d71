//! `ymir watch [printer...]`: run a monitor per printer and print every
//! published snapshot until Ctrl-C.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{info, warn};

use ymir_core::{ConnectivityState, MonitorRegistry, MonitorSnapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Snapshots buffered between the monitors and stdout. Forwarders wait
/// when it is full.
const EVENT_BUFFER: usize = 64;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let mut ids: Vec<String> = if args.printers.is_empty() {
        config.printers.keys().cloned().collect()
    } else {
        args.printers.clone()
    };
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Err(CliError::Validation {
            field: "printers".into(),
            reason: "no printers configured; add a [printers.<id>] table".into(),
        });
    }

    let monitor_config = ymir_config::defaults_to_monitor_config(&config.defaults)?;
    let registry = MonitorRegistry::new();
    let (tx, mut rx) = event_channel();

    for id in &ids {
        let (endpoint, client) = super::connect(&config, id)?;
        registry
            .start(endpoint, monitor_config.clone(), client)
            .map_err(|e| CliError::from_core(e, id))?;

        let Some(mut subscription) = registry.subscribe(id) else {
            continue;
        };
        let tx = tx.clone();
        tokio::spawn(async move {
            // The first cycle may already have published.
            let first = Arc::clone(subscription.current());
            if first.cycle > 0 && tx.send(first).await.is_err() {
                return;
            }
            while let Some(snapshot) = subscription.changed().await {
                if tx.send(snapshot).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);
    info!(printers = ids.len(), "watching");

    let color = output::should_color(global.color);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut printed: u64 = 0;

    loop {
        let next = tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!(error = %e, "could not listen for Ctrl-C");
                }
                info!("interrupted");
                None
            }
            snapshot = rx.recv() => snapshot,
        };
        let Some(snapshot) = next else { break };

        let line = render_event(&snapshot, global.output, color)?;
        output::print_output(&line, global.quiet)?;
        printed += 1;
        if args.count.is_some_and(|limit| printed >= limit) {
            break;
        }
    }

    registry.stop_all().await;
    Ok(())
}

fn event_channel() -> (
    mpsc::Sender<Arc<MonitorSnapshot>>,
    mpsc::Receiver<Arc<MonitorSnapshot>>,
) {
    mpsc::channel(EVENT_BUFFER)
}

/// One published snapshot as text.
///
/// JSON formats emit one object per line. YAML emits one document per
/// snapshot. Table and plain emit a single status line.
fn render_event(
    snapshot: &MonitorSnapshot,
    format: OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(snapshot)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(snapshot)?),
        OutputFormat::Table | OutputFormat::Plain => {
            let time = snapshot.updated_at.with_timezone(&Local).format("%H:%M:%S");
            format!(
                "{time}  {:<12} {:<12} {}",
                snapshot.printer_id,
                output::state_label(snapshot.state, color),
                summary(snapshot)
            )
        }
    })
}

fn summary(snapshot: &MonitorSnapshot) -> String {
    match snapshot.view() {
        (ConnectivityState::Online, _, Some(job)) => format!(
            "{:.1}%  elapsed {}  left {}",
            job.completion_pct, job.elapsed_pretty, job.remaining_pretty
        ),
        (ConnectivityState::Online, Some(status), None) => status.state_text.clone(),
        (ConnectivityState::Reconnecting, _, _) => snapshot.reconnect.as_ref().map_or_else(
            || "connect accepted".into(),
            |r| format!("attempt {}/{}", r.attempts_made, r.max_attempts),
        ),
        _ => snapshot
            .last_error
            .as_ref()
            .map_or_else(String::new, ToString::to_string),
    }
}
