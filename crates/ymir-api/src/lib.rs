// ymir-api: Async HTTP client for OctoPrint-compatible printer hosts.
//
// The client is a pure I/O boundary: every call carries its own timeout,
// nothing is retried, and failures come back as an `HttpOutcome` value
// rather than an error. Retry and classification policy live in `ymir-core`.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod outcome;
pub mod transport;

pub use auth::API_KEY_HEADER;
pub use client::{DeviceApi, DeviceClient};
pub use error::Error;
pub use models::{
    ConnectCommand, RawFileEntry, RawFileListing, RawJob, RawJobFile, RawJobInformation,
    RawPrinterState, RawPrinterStatus, RawProgress, RawSdState, RawStateFlags, RawTemperature,
};
pub use outcome::{HttpOutcome, TransportFailure, TransportKind};
pub use transport::{TlsMode, TransportConfig};
