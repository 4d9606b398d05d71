// ── Domain model ──
//
// Canonical, immutable types handed to readers. Wire types from
// `ymir-api` are converted here and never leak past the core.

pub mod connectivity;
pub mod file;
pub mod job;
pub mod status;

pub use connectivity::ConnectivityState;
pub use file::PrinterFile;
pub use job::JobSnapshot;
pub use status::{PrinterFlags, PrinterStatusSnapshot, TemperatureReading};
