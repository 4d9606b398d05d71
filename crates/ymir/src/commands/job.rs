//! `ymir job <printer>`: one poll cycle, then the active job.

use serde::Serialize;

use ymir_core::{ConnectivityState, JobSnapshot};

use crate::cli::{GlobalOpts, PrinterArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct JobReport<'a> {
    printer: &'a str,
    state: ConnectivityState,
    job: Option<&'a JobSnapshot>,
}

pub async fn handle(args: PrinterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let mut monitor = super::build_monitor(&config, &args.printer)?;
    let snapshot = super::poll_settled(&mut monitor).await;
    if let Some(err) = CliError::from_snapshot(&snapshot) {
        return Err(err);
    }

    let (state, _, job) = snapshot.view();
    let report = JobReport {
        printer: &snapshot.printer_id,
        state,
        job,
    };

    let out = output::render_single(global.output, &report, detail, |r| {
        r.job
            .map_or_else(|| "idle".into(), |j| format!("{:.1}", j.completion_pct))
    })?;
    output::print_output(&out, global.quiet)
}

fn detail(report: &JobReport<'_>) -> String {
    let Some(job) = report.job else {
        return format!("{}: no active job", report.printer);
    };
    let estimated = job
        .estimated_print_time
        .map(ymir_core::seconds_pretty);
    output::detail_lines(&[
        ("File", output::or_dash(job.file_name.as_deref())),
        ("State", job.job_state.clone()),
        ("Progress", format!("{:.1}%", job.completion_pct)),
        ("Elapsed", job.elapsed_pretty.clone()),
        (
            "Remaining",
            format!("{} ({})", job.remaining_pretty, job.remaining_origin),
        ),
        ("Estimated", output::or_dash(estimated)),
    ])
}
