// ymir-core: Connectivity classification, reconnect supervision and job
// monitoring between ymir-api and consumers (CLI).

pub mod classify;
pub mod config;
pub mod error;
pub mod job_snapshot;
pub mod model;
pub mod monitor;
pub mod reconnect;
pub mod registry;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{Classification, classify};
pub use config::{MonitorConfig, PrinterEndpoint, PrinterMetadata, PrinterType, TlsVerification};
pub use error::CoreError;
pub use job_snapshot::{JobSnapshotBuilder, seconds_pretty};
pub use monitor::{MonitorHandle, MonitorSnapshot, MonitorSubscription, PrinterMonitor};
pub use reconnect::{
    ReconnectAttemptState, ReconnectOutcome, ReconnectPolicy, ReconnectSupervisor, SupervisorPhase,
};
pub use registry::MonitorRegistry;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ConnectivityState, JobSnapshot, PrinterFile, PrinterFlags, PrinterStatusSnapshot,
    TemperatureReading,
};

// Consumers build clients through `PrinterEndpoint::device_client`.
pub use ymir_api::{DeviceApi, DeviceClient};
