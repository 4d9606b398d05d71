//! `ymir status <printer>`: one poll cycle, then connectivity, flags and
//! temperatures.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ymir_core::{ConnectivityState, PrinterFlags, PrinterStatusSnapshot, TemperatureReading};

use crate::cli::{GlobalOpts, PrinterArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    printer: &'a str,
    name: &'a str,
    state: ConnectivityState,
    status: Option<&'a PrinterStatusSnapshot>,
    updated_at: DateTime<Utc>,
}

pub async fn handle(args: PrinterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let mut monitor = super::build_monitor(&config, &args.printer)?;
    let snapshot = super::poll_settled(&mut monitor).await;
    if let Some(err) = CliError::from_snapshot(&snapshot) {
        return Err(err);
    }

    let (state, status, _) = snapshot.view();
    let report = StatusReport {
        printer: &snapshot.printer_id,
        name: monitor.endpoint().display_name(),
        state,
        status,
        updated_at: snapshot.updated_at,
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| detail(r, color),
        |r| r.state.to_string(),
    )?;
    output::print_output(&out, global.quiet)
}

fn detail(report: &StatusReport<'_>, color: bool) -> String {
    let mut pairs: Vec<(&str, String)> = vec![
        ("Printer", format!("{} ({})", report.name, report.printer)),
        ("Connectivity", output::state_label(report.state, color)),
    ];
    if let Some(status) = report.status {
        pairs.push(("State", status.state_text.clone()));
        if let Some(ref error) = status.error_text {
            pairs.push(("Error", error.clone()));
        }
        pairs.push(("Flags", active_flags(&status.flags)));
        pairs.push((
            "SD card",
            if status.sd_card_ready { "ready" } else { "not ready" }.into(),
        ));
        for (sensor, reading) in &status.temperatures {
            pairs.push((sensor.as_str(), temperature(reading)));
        }
    }
    output::detail_lines(&pairs)
}

fn active_flags(flags: &PrinterFlags) -> String {
    let named = [
        ("operational", flags.operational),
        ("printing", flags.printing),
        ("paused", flags.paused),
        ("pausing", flags.pausing),
        ("resuming", flags.resuming),
        ("cancelling", flags.cancelling),
        ("finishing", flags.finishing),
        ("ready", flags.ready),
        ("sd-ready", flags.sd_ready),
        ("error", flags.error),
        ("closed-or-error", flags.closed_or_error),
    ];
    let set: Vec<&str> = named
        .iter()
        .filter(|(_, on)| *on)
        .map(|(name, _)| *name)
        .collect();
    if set.is_empty() {
        "-".into()
    } else {
        set.join(", ")
    }
}

fn temperature(reading: &TemperatureReading) -> String {
    let fmt = |v: Option<f64>| output::or_dash(v.map(|t| format!("{t:.1}")));
    format!("{} / {} °C", fmt(reading.actual), fmt(reading.target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_flags_lists_only_set_flags() {
        let flags = PrinterFlags {
            operational: true,
            printing: true,
            ..PrinterFlags::default()
        };
        assert_eq!(active_flags(&flags), "operational, printing");
        assert_eq!(active_flags(&PrinterFlags::default()), "-");
    }

    #[test]
    fn temperature_shows_dash_for_missing_values() {
        let reading = TemperatureReading {
            actual: Some(214.84),
            target: None,
            offset: None,
        };
        assert_eq!(temperature(&reading), "214.8 / - °C");
    }
}
