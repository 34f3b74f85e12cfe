//! Bot lifecycle — building and running the WhatsApp bot.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

use arbolito_core::error::ArbolitoError;
use arbolito_core::message::{AckEvent, InboundMessage, MessageHandle};

use super::events::{handle_inbound_message, receipt_level};
use super::{Readiness, WhatsAppMessenger};

impl WhatsAppMessenger {
    /// Build the WhatsApp bot with the event handler and run it in the
    /// background. Connection state, QR codes, inbound messages, and
    /// delivery receipts all flow out through the messenger's shared
    /// channels.
    pub(super) async fn build_and_run_bot(
        &self,
        tx: mpsc::Sender<InboundMessage>,
    ) -> Result<(), ArbolitoError> {
        let db_path = self.session_db_path();
        let client_handle = self.client.clone();

        info!("WhatsApp bot building (session: {db_path})...");

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| ArbolitoError::Channel(format!("whatsapp store init failed: {e}")))?,
        );

        let tx_events = tx;
        let client_for_event = client_handle.clone();
        let ready_handle = self.ready_tx.clone();
        let ack_handle = self.ack_tx.clone();
        let qr_tx_handle = self.qr_tx.clone();
        let last_qr_handle = self.last_qr.clone();

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_os_info(Some(self.config.device_name.clone()), None)
            .on_event(move |event, client| {
                let tx = tx_events.clone();
                let client_store = client_for_event.clone();
                let ready = ready_handle.clone();
                let acks = ack_handle.clone();
                let qr_fwd = qr_tx_handle.clone();
                let last_qr_buf = last_qr_handle.clone();
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            info!("WhatsApp QR code generated (scan to pair)");
                            // Always buffer the latest QR code for replay.
                            *last_qr_buf.lock().await = Some(code.clone());
                            if let Some(sender) = qr_fwd.lock().await.as_ref() {
                                let _ = sender.send(code).await;
                            }
                        }
                        Event::PairSuccess(_) => {
                            info!("WhatsApp pairing successful!");
                        }
                        Event::PairError(_) => {
                            warn!("WhatsApp pairing failed");
                            let _ = ready.send(Readiness::AuthFailed);
                        }
                        Event::Connected(_) => {
                            info!("WhatsApp connected");
                            *client_store.lock().await = Some(client);
                            // Session is valid, no more QR needed.
                            *last_qr_buf.lock().await = None;
                            let _ = ready.send(Readiness::Ready);
                        }
                        Event::Disconnected(_) => {
                            warn!("WhatsApp disconnected");
                            *client_store.lock().await = None;
                            let _ = ready.send(Readiness::Starting);
                        }
                        Event::LoggedOut(_) => {
                            warn!("WhatsApp logged out — session invalidated");
                            *client_store.lock().await = None;
                            let _ = ready.send(Readiness::AuthFailed);
                        }
                        Event::Message(msg, info) => {
                            handle_inbound_message(*msg, info, &tx).await;
                        }
                        Event::Receipt(receipt) => {
                            let level = receipt_level(&receipt.r#type);
                            for id in &receipt.message_ids {
                                let _ = acks.send(AckEvent {
                                    handle: MessageHandle::new(id.clone()),
                                    level,
                                });
                            }
                        }
                        _ => {}
                    }
                }
            })
            .build()
            .await
            .map_err(|e| ArbolitoError::Channel(format!("whatsapp bot build failed: {e}")))?;

        // Store client reference immediately if already connected.
        *client_handle.lock().await = Some(bot.client());

        // Run bot in background.
        let _handle = bot
            .run()
            .await
            .map_err(|e| ArbolitoError::Channel(format!("whatsapp bot run failed: {e}")))?;

        info!("WhatsApp bot started");
        Ok(())
    }
}
