// ── Job snapshot construction ──
//
// Turns raw `/api/job` telemetry into a `JobSnapshot`. Values outside
// their domain are reported as `DataIntegrity` errors, never clamped.

use ymir_api::RawJobInformation;

use crate::error::CoreError;
use crate::model::JobSnapshot;

const SECS_PER_HOUR: f64 = 3600.0;
const SECS_PER_MINUTE: f64 = 60.0;

/// Builds [`JobSnapshot`]s from raw job telemetry.
pub struct JobSnapshotBuilder;

impl JobSnapshotBuilder {
    /// Build a snapshot, or `Ok(None)` when the host reports no active job.
    ///
    /// A job is active while the host reports a completion value; idle
    /// hosts send `"completion": null`.
    pub fn build(raw: &RawJobInformation) -> Result<Option<JobSnapshot>, CoreError> {
        let Some(completion) = raw.progress.completion else {
            return Ok(None);
        };
        if !completion.is_finite() || !(0.0..=100.0).contains(&completion) {
            return Err(CoreError::DataIntegrity {
                field: "completion",
                value: completion.to_string(),
            });
        }

        let elapsed = checked_seconds("printTime", raw.progress.print_time)?;
        let remaining = checked_seconds("printTimeLeft", raw.progress.print_time_left)?;

        let file = &raw.job.file;
        let file_name = file.display.clone().or_else(|| file.name.clone());

        Ok(Some(JobSnapshot {
            completion_pct: completion,
            elapsed_seconds: elapsed,
            remaining_seconds: remaining,
            remaining_origin: raw
                .progress
                .print_time_left_origin
                .clone()
                .unwrap_or_default(),
            elapsed_pretty: seconds_pretty(elapsed),
            remaining_pretty: seconds_pretty(remaining),
            file_name,
            job_state: raw.state.clone(),
            estimated_print_time: raw.job.estimated_print_time,
        }))
    }
}

/// Missing values count as zero; negative or non-finite values are errors.
fn checked_seconds(field: &'static str, value: Option<f64>) -> Result<f64, CoreError> {
    let secs = value.unwrap_or(0.0);
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs)
    } else {
        Err(CoreError::DataIntegrity {
            field,
            value: secs.to_string(),
        })
    }
}

/// Format a non-negative duration as `"<H>H <M>M <S>S"`.
///
/// Hours and minutes are floored; the seconds component is rounded, and a
/// rounded `60` carries into the minutes.
#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn seconds_pretty(total: f64) -> String {
    let total = total.max(0.0);
    let mut hours = (total / SECS_PER_HOUR).floor() as u64;
    let remainder = total % SECS_PER_HOUR;
    let mut minutes = (remainder / SECS_PER_MINUTE).floor() as u64;
    let mut seconds = (remainder % SECS_PER_MINUTE).round() as u64;

    if seconds == 60 {
        seconds = 0;
        minutes += 1;
    }
    if minutes == 60 {
        minutes = 0;
        hours += 1;
    }
    format!("{hours}H {minutes}M {seconds}S")
}
