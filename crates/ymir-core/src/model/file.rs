use chrono::{DateTime, Utc};
use serde::Serialize;
use ymir_api::RawFileEntry;

/// An entry in the printer host's local file storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrinterFile {
    pub name: String,
    pub display: String,
    pub path: String,
    pub origin: Option<String>,
    pub size: Option<u64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    /// `machinecode`, `model` or `folder`.
    pub kind: Option<String>,
}

impl From<RawFileEntry> for PrinterFile {
    fn from(raw: RawFileEntry) -> Self {
        Self {
            display: raw.display.unwrap_or_else(|| raw.name.clone()),
            path: raw.path.unwrap_or_else(|| raw.name.clone()),
            uploaded_at: raw.date.and_then(|secs| DateTime::from_timestamp(secs, 0)),
            name: raw.name,
            origin: raw.origin,
            size: raw.size,
            kind: raw.kind,
        }
    }
}
