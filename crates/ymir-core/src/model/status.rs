use std::collections::BTreeMap;

use serde::Serialize;
use ymir_api::{RawPrinterStatus, RawStateFlags, RawTemperature};

/// Device flags as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct PrinterFlags {
    pub operational: bool,
    pub printing: bool,
    pub paused: bool,
    pub error: bool,
    pub sd_ready: bool,
    pub ready: bool,
    pub cancelling: bool,
    pub closed_or_error: bool,
    pub finishing: bool,
    pub pausing: bool,
    pub resuming: bool,
}

impl From<RawStateFlags> for PrinterFlags {
    fn from(raw: RawStateFlags) -> Self {
        Self {
            operational: raw.operational,
            printing: raw.printing,
            paused: raw.paused,
            error: raw.error,
            sd_ready: raw.sd_ready,
            ready: raw.ready,
            cancelling: raw.cancelling,
            closed_or_error: raw.closed_or_error,
            finishing: raw.finishing,
            pausing: raw.pausing,
            resuming: raw.resuming,
        }
    }
}

/// One sensor reading in °C. `None` when the host reports `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub actual: Option<f64>,
    pub target: Option<f64>,
    pub offset: Option<f64>,
}

impl From<RawTemperature> for TemperatureReading {
    fn from(raw: RawTemperature) -> Self {
        Self {
            actual: raw.actual,
            target: raw.target,
            offset: raw.offset,
        }
    }
}

/// Decoded `GET /api/printer` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrinterStatusSnapshot {
    /// Host state text, e.g. `"Printing"` or `"Operational"`.
    pub state_text: String,
    pub error_text: Option<String>,
    pub flags: PrinterFlags,
    /// SD card reader state (separate from the `sdReady` flag on some hosts).
    pub sd_card_ready: bool,
    /// Keyed by sensor name (`tool0`, `bed`, ...), sorted.
    pub temperatures: BTreeMap<String, TemperatureReading>,
}

impl From<RawPrinterStatus> for PrinterStatusSnapshot {
    fn from(raw: RawPrinterStatus) -> Self {
        let error_text = Some(raw.state.error).filter(|e| !e.is_empty());
        Self {
            state_text: raw.state.text,
            error_text,
            flags: raw.state.flags.into(),
            sd_card_ready: raw.sd.is_some_and(|sd| sd.ready),
            temperatures: raw
                .temperature
                .into_iter()
                .map(|(sensor, reading)| (sensor, reading.into()))
                .collect(),
        }
    }
}
