use serde::Serialize;

/// Normalized, display-ready view of an in-progress print.
///
/// Built by [`JobSnapshotBuilder`](crate::JobSnapshotBuilder); every value
/// has already been range-checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    /// Percentage in `0.0..=100.0`.
    pub completion_pct: f64,
    pub elapsed_seconds: f64,
    pub remaining_seconds: f64,
    /// Which estimator produced `remaining_seconds`.
    pub remaining_origin: String,
    /// `"<H>H <M>M <S>S"`
    pub elapsed_pretty: String,
    /// `"<H>H <M>M <S>S"`
    pub remaining_pretty: String,
    pub file_name: Option<String>,
    /// Host job state text, e.g. `"Printing"`.
    pub job_state: String,
    pub estimated_print_time: Option<f64>,
}
