//! Events published by the transport layer during a sync exchange

use crate::models::GameRecord;

/// Connection lifecycle and data events from the active peer link
///
/// Everything the sync manager and any UI learn about a connection travels
/// through these; the transport never calls back into its consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A channel to a peer was established
    Connected {
        /// Remote device label, when the link knows one
        device_label: Option<String>,
    },
    /// The channel was torn down, by either side; fires exactly once per
    /// connection
    Disconnected,
    /// A complete inbound payload of game records arrived
    DataReceived(Vec<GameRecord>),
    /// The peer asked for our records
    DataRequested,
    /// The outbound snapshot was fully written to the peer
    SyncComplete,
    /// A transport-level failure
    Error(String),
}

impl PeerEvent {
    /// Short label used in log lines
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected => "disconnected",
            Self::DataReceived(_) => "data_received",
            Self::DataRequested => "data_requested",
            Self::SyncComplete => "sync_complete",
            Self::Error(_) => "error",
        }
    }
}
