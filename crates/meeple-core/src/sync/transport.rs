//! Transport contract shared by all peer links

use async_trait::async_trait;
use thiserror::Error;

use super::capability::Capability;
use super::wire::WireMessage;

/// Transport-level failures
///
/// Every failure here is recoverable: the caller gets the error back, the
/// same message is published on the event bus for any UI listening, and
/// the link settles in a state from which connect can be retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// This platform cannot run the link at all
    #[error("Sync link is not supported on this platform: {0}")]
    CapabilityUnsupported(String),

    /// Establishing the channel failed
    #[error("Connection handshake failed: {0}")]
    HandshakeFailed(String),

    /// A mid-sync write to the peer failed
    #[error("Write to peer failed: {0}")]
    WriteFailed(String),

    /// An inbound payload could not be decoded
    #[error("Received payload could not be decoded: {0}")]
    DecodeFailed(String),

    /// Operation requires an established channel
    #[error("Not connected to a peer")]
    NotConnected,
}

/// An established (or not) logical connection to exactly one peer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncChannel {
    /// Whether the platform supports this link at all
    pub supported: bool,
    /// Whether a channel to a peer is currently up
    pub connected: bool,
    /// Remote device label, when known
    pub device_label: Option<String>,
    /// Last transport error observed on this channel
    pub error: Option<String>,
}

/// Connection-oriented channel to exactly one remote peer at a time
///
/// Inbound traffic is passive: complete payloads surface as
/// [`PeerEvent`](super::PeerEvent)s on the bus the link was built with.
#[async_trait]
pub trait Transport: Send {
    /// Platform capability for this transport
    fn capability(&self) -> Capability;

    /// Current channel state
    fn status(&self) -> SyncChannel;

    /// Establish a channel to the peer
    ///
    /// Fails immediately with `CapabilityUnsupported` on platforms that
    /// cannot run the link; no handshake is attempted.
    async fn connect(&mut self) -> Result<SyncChannel, TransportError>;

    /// Tear the channel down; emits exactly one `Disconnected` event
    async fn disconnect(&mut self);

    /// Send one message to the peer, chunked as the link requires
    async fn send(&mut self, message: &WireMessage) -> Result<(), TransportError>;
}
