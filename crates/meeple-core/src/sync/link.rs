//! Streaming peer link over a byte stream
//!
//! [`LanLink`] runs the wire protocol over any async byte stream: a TCP
//! connection between two devices on the same network, or an in-process
//! duplex pipe when simulating two peers in one test. Outbound messages are
//! framed and written in bounded chunks; inbound bytes are reassembled by a
//! background reader task that publishes complete messages on the event
//! bus. Link loss, from either side, surfaces as exactly one
//! `Disconnected` event per connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::bus::EventBus;
use super::capability::{self, Capability};
use super::chunk::{self, FrameAssembler, CHUNK_SIZE};
use super::event::PeerEvent;
use super::transport::{SyncChannel, Transport, TransportError};
use super::wire::{self, WireMessage};

/// Streaming transport to one peer
pub struct LanLink {
    bus: EventBus<PeerEvent>,
    peer: Option<SocketAddr>,
    status: Arc<Mutex<SyncChannel>>,
    writer: Option<Box<dyn AsyncWrite + Send + Unpin>>,
    reader: Option<JoinHandle<()>>,
    disconnect_flag: Option<Arc<AtomicBool>>,
}

impl LanLink {
    /// Create a link that will dial the given peer address on `connect`
    #[must_use]
    pub fn dial(peer: SocketAddr, bus: EventBus<PeerEvent>) -> Self {
        Self {
            bus,
            peer: Some(peer),
            status: Arc::new(Mutex::new(SyncChannel {
                supported: capability::probe().is_supported,
                ..SyncChannel::default()
            })),
            writer: None,
            reader: None,
            disconnect_flag: None,
        }
    }

    /// Wrap an already-established stream, e.g. an accepted TCP connection
    /// or one end of an in-process duplex pipe
    #[must_use]
    pub fn attached<S>(stream: S, device_label: Option<String>, bus: EventBus<PeerEvent>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let mut link = Self {
            bus,
            peer: None,
            status: Arc::new(Mutex::new(SyncChannel {
                supported: capability::probe().is_supported,
                ..SyncChannel::default()
            })),
            writer: None,
            reader: None,
            disconnect_flag: None,
        };
        link.attach(stream, device_label);
        link
    }

    /// Take ownership of a live stream and start the reader task
    fn attach<S>(&mut self, stream: S, device_label: Option<String>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        self.writer = Some(Box::new(write_half));

        {
            let mut status = self.status.lock();
            status.connected = true;
            status.device_label.clone_from(&device_label);
            status.error = None;
        }

        let flag = Arc::new(AtomicBool::new(false));
        self.reader = Some(tokio::spawn(read_loop(
            read_half,
            self.bus.clone(),
            Arc::clone(&self.status),
            Arc::clone(&flag),
        )));
        self.disconnect_flag = Some(flag);

        tracing::info!(device = ?device_label, "peer link established");
        self.bus.publish(PeerEvent::Connected { device_label });
    }
}

#[async_trait]
impl Transport for LanLink {
    fn capability(&self) -> Capability {
        capability::probe()
    }

    fn status(&self) -> SyncChannel {
        self.status.lock().clone()
    }

    async fn connect(&mut self) -> Result<SyncChannel, TransportError> {
        let capability = capability::probe();
        if !capability.is_supported {
            let error = TransportError::CapabilityUnsupported(capability.advisory_message);
            report_error(&self.bus, &self.status, &error);
            return Err(error);
        }

        if self.status.lock().connected {
            return Ok(self.status());
        }

        let Some(peer) = self.peer else {
            let error = TransportError::HandshakeFailed("no peer address configured".to_string());
            report_error(&self.bus, &self.status, &error);
            return Err(error);
        };

        let stream = match TcpStream::connect(peer).await {
            Ok(stream) => stream,
            Err(error) => {
                let error = TransportError::HandshakeFailed(error.to_string());
                report_error(&self.bus, &self.status, &error);
                return Err(error);
            }
        };

        self.attach(stream, Some(peer.to_string()));
        Ok(self.status())
    }

    async fn disconnect(&mut self) {
        self.writer = None;
        if let Some(task) = self.reader.take() {
            task.abort();
        }
        if let Some(flag) = self.disconnect_flag.take() {
            emit_disconnected(&self.bus, &self.status, &flag);
        }
        self.status.lock().device_label = None;
    }

    async fn send(&mut self, message: &WireMessage) -> Result<(), TransportError> {
        let bus = self.bus.clone();
        let status = Arc::clone(&self.status);

        let writer = self.writer.as_mut().ok_or(TransportError::NotConnected)?;

        let body = match wire::encode(message) {
            Ok(body) => body,
            Err(error) => {
                let error = TransportError::WriteFailed(error.to_string());
                report_error(&bus, &status, &error);
                return Err(error);
            }
        };

        let frame = chunk::encode_frame(&body);
        for piece in chunk::chunks(&frame) {
            if let Err(error) = writer.write_all(piece).await {
                let error = TransportError::WriteFailed(error.to_string());
                report_error(&bus, &status, &error);
                return Err(error);
            }
        }
        if let Err(error) = writer.flush().await {
            let error = TransportError::WriteFailed(error.to_string());
            report_error(&bus, &status, &error);
            return Err(error);
        }

        if matches!(message, WireMessage::Records(_)) {
            bus.publish(PeerEvent::SyncComplete);
        }
        Ok(())
    }
}

/// Record a transport error on the channel and publish it; the caller
/// still gets the error value back
fn report_error(bus: &EventBus<PeerEvent>, status: &Arc<Mutex<SyncChannel>>, error: &TransportError) {
    let message = error.to_string();
    status.lock().error = Some(message.clone());
    tracing::warn!(%message, "transport error");
    bus.publish(PeerEvent::Error(message));
}

/// Publish `Disconnected` at most once per connection
fn emit_disconnected(
    bus: &EventBus<PeerEvent>,
    status: &Arc<Mutex<SyncChannel>>,
    flag: &Arc<AtomicBool>,
) {
    if !flag.swap(true, Ordering::SeqCst) {
        status.lock().connected = false;
        tracing::info!("peer link closed");
        bus.publish(PeerEvent::Disconnected);
    }
}

/// Drive the inbound half of the link until it closes
async fn read_loop<R>(
    mut reader: R,
    bus: EventBus<PeerEvent>,
    status: Arc<Mutex<SyncChannel>>,
    disconnect_flag: Arc<AtomicBool>,
) where
    R: AsyncRead + Send + Unpin,
{
    let mut assembler = FrameAssembler::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                assembler.push(&buf[..n]);
                if !drain_frames(&mut assembler, &bus, &status) {
                    break;
                }
            }
            Err(error) => {
                tracing::warn!(%error, "peer link read failed");
                break;
            }
        }
    }

    emit_disconnected(&bus, &status, &disconnect_flag);
}

/// Decode and publish every complete frame buffered so far
///
/// Returns false when the stream is corrupt beyond recovery.
fn drain_frames(
    assembler: &mut FrameAssembler,
    bus: &EventBus<PeerEvent>,
    status: &Arc<Mutex<SyncChannel>>,
) -> bool {
    loop {
        match assembler.next_frame() {
            Ok(Some(frame)) => match wire::decode(&frame) {
                Ok(WireMessage::Records(records)) => {
                    tracing::debug!(count = records.len(), "received records from peer");
                    bus.publish(PeerEvent::DataReceived(records));
                }
                Ok(WireMessage::Request) => {
                    bus.publish(PeerEvent::DataRequested);
                }
                // Frame boundaries are intact, so one bad payload doesn't
                // poison the stream; report it and keep reading.
                Err(error) => {
                    let error = TransportError::DecodeFailed(error.to_string());
                    report_error(bus, status, &error);
                }
            },
            Ok(None) => return true,
            Err(error) => {
                let error = TransportError::DecodeFailed(error.to_string());
                report_error(bus, status, &error);
                return false;
            }
        }
    }
}
