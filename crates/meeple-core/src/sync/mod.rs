//! Device-to-device synchronization
//!
//! Two offline-first devices exchange their full game histories and merge
//! them into one consistent, duplicate-free record collection. Either over
//! a live streaming link ([`LanLink`]) or by carrying a one-shot snapshot
//! payload between devices ([`snapshot`]); both paths speak the same
//! transferable record format and end in the same [`merge`] semantics.

pub mod bus;
pub mod capability;
pub mod chunk;
pub mod event;
pub mod link;
pub mod manager;
pub mod merge;
pub mod snapshot;
pub mod transport;
pub mod wire;

pub use bus::{EventBus, ListenerHandle, ListenerSet};
pub use capability::Capability;
pub use event::PeerEvent;
pub use link::LanLink;
pub use manager::{SyncError, SyncManager, SyncState};
pub use merge::{ImportOutcome, MergeReport, ScoreConflict};
pub use snapshot::{ScanError, ScanSession, Scanner};
pub use transport::{SyncChannel, Transport, TransportError};
pub use wire::WireMessage;
