//! Sync orchestration and state propagation
//!
//! One [`SyncManager`] per device. It owns the transport handle for the
//! duration of a sync attempt, consumes [`PeerEvent`]s from the bus, and
//! republishes a derived [`SyncState`] to anyone watching. The manager is
//! long-lived: every completed or failed attempt settles back to idle,
//! ready for a retry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::db::GameStore;
use crate::models::GameRecord;

use super::bus::{EventBus, ListenerHandle, ListenerSet};
use super::event::PeerEvent;
use super::merge;
use super::transport::{SyncChannel, Transport, TransportError};
use super::wire::WireMessage;

/// Message used for the soft warning when a sync absorbed nothing new
const NO_NEW_GAMES: &str = "No new games to sync";

/// Errors from initiating a sync attempt
#[derive(Debug, Error)]
pub enum SyncError {
    /// Only one attempt may be in flight at a time
    #[error("A sync attempt is already in progress")]
    AlreadySyncing,

    /// The transport refused or lost the exchange
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The local record store failed
    #[error(transparent)]
    Store(#[from] crate::Error),
}

/// Observable state of the sync subsystem
///
/// A set `error` alongside `is_syncing == false` may be a hard failure or
/// the soft "nothing new" warning; both leave the manager ready to retry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// An exchange is currently in flight
    pub is_syncing: bool,
    /// When data was last exchanged with a peer
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Last failure or warning, cleared when a new attempt starts
    pub error: Option<String>,
}

/// Drives the send-then-request exchange and tracks its state
pub struct SyncManager {
    inner: Arc<ManagerInner>,
    events_task: JoinHandle<()>,
}

struct ManagerInner {
    transport: tokio::sync::Mutex<Box<dyn Transport>>,
    store: Arc<dyn GameStore>,
    state: Mutex<SyncState>,
    listeners: ListenerSet<SyncState>,
}

impl SyncManager {
    /// Wire a manager to a transport, a record store, and the event bus
    /// the transport publishes on
    ///
    /// Subscribes to the bus immediately; events published after this call
    /// are handled.
    #[must_use]
    pub fn new(
        transport: Box<dyn Transport>,
        store: Arc<dyn GameStore>,
        bus: &EventBus<PeerEvent>,
    ) -> Self {
        let inner = Arc::new(ManagerInner {
            transport: tokio::sync::Mutex::new(transport),
            store,
            state: Mutex::new(SyncState::default()),
            listeners: ListenerSet::new(),
        });

        let events = bus.subscribe();
        let events_task = tokio::spawn(run_event_loop(Arc::clone(&inner), events));

        Self { inner, events_task }
    }

    /// Current sync state snapshot
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.inner.state.lock().clone()
    }

    /// Watch state changes; the listener stays registered while the handle
    /// lives
    #[must_use]
    pub fn on_state_change(
        &self,
        listener: impl Fn(&SyncState) + Send + 'static,
    ) -> ListenerHandle<SyncState> {
        self.inner.listeners.add_listener(listener)
    }

    /// Establish the channel to the peer
    pub async fn connect(&self) -> Result<SyncChannel, TransportError> {
        self.inner.transport.lock().await.connect().await
    }

    /// Tear down the channel
    pub async fn disconnect(&self) {
        self.inner.transport.lock().await.disconnect().await;
    }

    /// Current channel state
    pub async fn channel(&self) -> SyncChannel {
        self.inner.transport.lock().await.status()
    }

    /// Run one sync exchange with the connected peer
    ///
    /// Sends the full local snapshot, then asks the peer for its records;
    /// the merge happens when the answer arrives as a `DataReceived`
    /// event. Rejected with [`SyncError::AlreadySyncing`] while an attempt
    /// is in flight.
    pub async fn sync_with_device(&self) -> Result<(), SyncError> {
        {
            let mut state = self.inner.state.lock();
            if state.is_syncing {
                return Err(SyncError::AlreadySyncing);
            }
            state.is_syncing = true;
            state.error = None;
        }
        self.inner.notify_state();
        tracing::info!("starting sync exchange");

        if let Err(error) = self.try_exchange().await {
            self.inner.update(|state| {
                state.is_syncing = false;
                state.error = Some(error.to_string());
            });
            return Err(error);
        }
        Ok(())
    }

    async fn try_exchange(&self) -> Result<(), SyncError> {
        let local = self.inner.store.read_all()?;
        let mut transport = self.inner.transport.lock().await;
        transport.send(&WireMessage::Records(local)).await?;
        transport.send(&WireMessage::Request).await?;
        Ok(())
    }
}

impl Drop for SyncManager {
    fn drop(&mut self) {
        self.events_task.abort();
    }
}

impl ManagerInner {
    /// Apply a state change and notify listeners with the new snapshot
    fn update(&self, apply: impl FnOnce(&mut SyncState)) {
        let snapshot = {
            let mut state = self.state.lock();
            apply(&mut state);
            state.clone()
        };
        self.listeners.notify(&snapshot);
    }

    fn notify_state(&self) {
        let snapshot = self.state.lock().clone();
        self.listeners.notify(&snapshot);
    }

    async fn handle_event(&self, event: PeerEvent) {
        tracing::debug!(kind = event.kind(), "handling sync event");
        match event {
            PeerEvent::Connected { .. } => self.update(|state| state.error = None),
            // Connection loss aborts any in-flight sync, whatever state it
            // was in
            PeerEvent::Disconnected => self.update(|state| state.is_syncing = false),
            PeerEvent::DataReceived(records) => self.handle_data_received(&records),
            PeerEvent::DataRequested => self.handle_data_requested().await,
            PeerEvent::SyncComplete => self.update(|state| {
                state.last_sync_time = Some(Utc::now());
                state.error = None;
            }),
            PeerEvent::Error(message) => self.update(|state| {
                state.is_syncing = false;
                state.error = Some(message);
            }),
        }
    }

    fn handle_data_received(&self, records: &[GameRecord]) {
        match merge::merge(self.store.as_ref(), records) {
            Ok(report) => {
                if !report.conflicts.is_empty() {
                    tracing::warn!(
                        count = report.conflicts.len(),
                        "dropped games with mismatched scores during merge"
                    );
                }
                self.update(|state| {
                    state.last_sync_time = Some(Utc::now());
                    state.is_syncing = false;
                    // A no-op sync is valid; the warning is informational
                    state.error = if report.added == 0 {
                        Some(NO_NEW_GAMES.to_string())
                    } else {
                        None
                    };
                });
            }
            Err(error) => self.update(|state| {
                state.is_syncing = false;
                state.error = Some(error.to_string());
            }),
        }
    }

    /// Answer a peer's request with our full snapshot
    async fn handle_data_requested(&self) {
        let records = match self.store.read_all() {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(%error, "could not read local records for peer request");
                return;
            }
        };

        let mut transport = self.transport.lock().await;
        if let Err(error) = transport.send(&WireMessage::Records(records)).await {
            tracing::warn!(%error, "failed to answer peer data request");
        }
    }
}

async fn run_event_loop(inner: Arc<ManagerInner>, mut events: broadcast::Receiver<PeerEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => inner.handle_event(event).await,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "sync event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
