use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use meeple_core::db::GameStore;
use meeple_core::sync::{capability, EventBus, LanLink, PeerEvent, SyncManager};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep, timeout};

use crate::commands::common::open_store;
use crate::error::CliError;

/// How long the connecting side waits for the peer's answer
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_sync_host(port: u16, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    println!("Waiting for a peer on port {port}... (Ctrl-C to stop)");
    let (stream, peer) = listener.accept().await?;

    let bus = EventBus::new(32);
    let mut events = bus.subscribe();
    let link = LanLink::attached(stream, Some(peer.to_string()), bus.clone());
    let manager = SyncManager::new(Box::new(link), store, &bus);

    loop {
        match events.recv().await {
            Ok(PeerEvent::Connected { device_label }) => {
                println!(
                    "Peer connected: {}",
                    device_label.as_deref().unwrap_or("unknown")
                );
            }
            Ok(PeerEvent::DataReceived(records)) => {
                println!("Received {} game(s) from peer", records.len());
            }
            Ok(PeerEvent::DataRequested) => println!("Peer requested our history"),
            Ok(PeerEvent::SyncComplete) => println!("Sent our history to peer"),
            Ok(PeerEvent::Error(error)) => eprintln!("Sync error: {error}"),
            Ok(PeerEvent::Disconnected) => break,
            Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }

    let state = manager.state();
    if let Some(warning) = state.error {
        println!("Peer disconnected ({warning})");
    } else {
        println!("Peer disconnected");
    }
    Ok(())
}

pub async fn run_sync_connect(addr: SocketAddr, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let before = store.read_all()?.len();

    let bus = EventBus::new(32);
    let mut events = bus.subscribe();
    let link = LanLink::dial(addr, bus.clone());
    let manager = SyncManager::new(Box::new(link), store.clone(), &bus);

    let channel = manager.connect().await?;
    println!(
        "Connected to {}",
        channel.device_label.as_deref().unwrap_or("peer")
    );

    manager.sync_with_device().await?;

    // The merge happens when the peer's answer arrives as an event; wait
    // for that, then for the manager to settle.
    let answered = timeout(EXCHANGE_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(PeerEvent::DataReceived(_)) => break Ok(()),
                Ok(PeerEvent::Disconnected) => {
                    break Err("peer disconnected before answering".to_string())
                }
                Ok(PeerEvent::Error(error)) => break Err(error),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break Err("event stream closed".to_string()),
            }
        }
    })
    .await
    .map_err(|_| CliError::SyncFailed("timed out waiting for the peer".to_string()))?;
    answered.map_err(CliError::SyncFailed)?;

    timeout(Duration::from_secs(5), async {
        while manager.state().is_syncing {
            sleep(Duration::from_millis(25)).await;
        }
    })
    .await
    .map_err(|_| CliError::SyncFailed("merge did not settle".to_string()))?;

    let state = manager.state();
    let after = store.read_all()?.len();
    match state.error {
        Some(warning) => println!("{warning}"),
        None => println!("Added {} new game(s)", after - before),
    }

    manager.disconnect().await;
    Ok(())
}

pub fn run_sync_status() {
    let capability = capability::probe();
    println!("Platform: {}", capability.platform_label);
    println!(
        "Live sync: {}",
        if capability.is_supported {
            "supported"
        } else {
            "not supported"
        }
    );
    println!("{}", capability.advisory_message);
}
