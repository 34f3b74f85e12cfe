//! WhatsApp messenger — pure Rust implementation via `whatsapp-rust`.
//!
//! Uses the WhatsApp Web protocol (Noise handshake + Signal encryption).
//! Pairing is done by scanning a QR code, like WhatsApp Web.
//! Session is persisted to `{data_dir}/whatsapp.db`.

mod bot;
mod events;
mod messenger;
mod qr;
mod send;

#[cfg(test)]
mod tests;

pub use qr::generate_qr_terminal;

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, Mutex};

use arbolito_core::config::WhatsAppConfig;
use arbolito_core::message::AckEvent;

/// Connection/authentication state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Not yet connected (or reconnecting).
    Starting,
    /// Authenticated and connected; sends will be accepted.
    Ready,
    /// Pairing was rejected; operator intervention needed.
    AuthFailed,
}

/// WhatsApp messenger using the WhatsApp Web protocol.
pub struct WhatsAppMessenger {
    pub(super) config: WhatsAppConfig,
    pub(super) data_dir: String,
    /// Client handle for sending — set once connected.
    pub(super) client: Arc<Mutex<Option<Arc<whatsapp_rust::client::Client>>>>,
    /// Readiness state, observable by the HTTP surface and CLI.
    pub(super) ready_tx: watch::Sender<Readiness>,
    /// Delivery-status events fanned out to per-message waiters.
    pub(super) ack_tx: broadcast::Sender<AckEvent>,
    /// Sender for QR code data from the running bot.
    pub(super) qr_tx: Arc<Mutex<Option<mpsc::Sender<String>>>>,
    /// Last QR code data — buffered so `pairing_channel()` can replay it
    /// even if the QR event fired before anyone started listening.
    pub(super) last_qr: Arc<Mutex<Option<String>>>,
}

impl WhatsAppMessenger {
    /// Create a new WhatsApp messenger from config.
    pub fn new(config: WhatsAppConfig, data_dir: &str) -> Self {
        let (ready_tx, _) = watch::channel(Readiness::Starting);
        let (ack_tx, _) = broadcast::channel(64);
        Self {
            config,
            data_dir: data_dir.to_string(),
            client: Arc::new(Mutex::new(None)),
            ready_tx,
            ack_tx,
            qr_tx: Arc::new(Mutex::new(None)),
            last_qr: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribe to readiness changes.
    pub fn readiness(&self) -> watch::Receiver<Readiness> {
        self.ready_tx.subscribe()
    }

    /// Create a fresh QR channel. Returns a receiver that yields QR data
    /// strings as WhatsApp rotates them.
    ///
    /// If a QR code was already generated before this call (e.g., during
    /// startup), it is immediately replayed into the channel. Calling this
    /// replaces any previous sender (stale receivers get dropped).
    pub async fn pairing_channel(&self) -> mpsc::Receiver<String> {
        let (qr_tx, qr_rx) = mpsc::channel::<String>(4);

        if let Some(ref qr) = *self.last_qr.lock().await {
            let _ = qr_tx.send(qr.clone()).await;
        }

        *self.qr_tx.lock().await = Some(qr_tx);
        qr_rx
    }

    /// Get the session database path.
    pub(super) fn session_db_path(&self) -> String {
        let dir = arbolito_core::config::shellexpand(&self.data_dir);
        let _ = std::fs::create_dir_all(&dir);
        format!("{dir}/whatsapp.db")
    }
}
