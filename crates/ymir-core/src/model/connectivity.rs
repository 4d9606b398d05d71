use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The monitor's classification of whether and why a printer is reachable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityState {
    /// No poll has completed yet, or the last status body was malformed.
    #[default]
    Unknown,
    Online,
    Offline,
    /// The host rejected the API key. Never triggers a reconnect.
    Forbidden,
    /// A connect command sequence is in progress.
    Reconnecting,
}

impl ConnectivityState {
    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}
