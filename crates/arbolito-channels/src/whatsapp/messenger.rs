//! Messenger trait implementation for WhatsApp.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use wacore_binary::jid::Jid;
use whatsapp_rust::client::Client;

use arbolito_core::{
    error::ArbolitoError,
    message::{AckEvent, AckLevel, InboundMessage, MessageHandle},
    recipient::{RecipientId, ResolvedRecipient},
    traits::Messenger,
};

use super::send::{jid_for, retry_send};
use super::{Readiness, WhatsAppMessenger};

impl WhatsAppMessenger {
    async fn connected_client(&self) -> Result<Arc<Client>, ArbolitoError> {
        self.client
            .lock()
            .await
            .clone()
            .ok_or_else(|| ArbolitoError::Channel("whatsapp client not connected".into()))
    }

    /// The library's send returning a message id means the server accepted
    /// the message, so a server-level ack is emitted here; higher levels
    /// arrive later as delivery receipts.
    fn confirm_server_ack(&self, msg_id: &str) -> MessageHandle {
        let handle = MessageHandle::new(msg_id);
        let _ = self.ack_tx.send(AckEvent {
            handle: handle.clone(),
            level: AckLevel::Server,
        });
        handle
    }
}

#[async_trait]
impl Messenger for WhatsAppMessenger {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundMessage>, ArbolitoError> {
        let (tx, rx) = mpsc::channel(64);
        self.build_and_run_bot(tx).await?;
        info!("WhatsApp messenger started");
        Ok(rx)
    }

    async fn is_ready(&self) -> bool {
        *self.ready_tx.borrow() == Readiness::Ready
    }

    async fn lookup_recipient(
        &self,
        id: &RecipientId,
    ) -> Result<Option<ResolvedRecipient>, ArbolitoError> {
        let client = self.connected_client().await?;
        let digits = id.digits();

        let result = client
            .contacts()
            .is_on_whatsapp(&[digits])
            .await
            .map_err(|e| ArbolitoError::Channel(format!("whatsapp lookup failed: {e}")))?;

        if result.is_empty() {
            return Ok(None);
        }
        let jid = Jid::new(digits, "s.whatsapp.net");
        Ok(Some(ResolvedRecipient {
            serialized: jid.to_string(),
        }))
    }

    async fn send_text(
        &self,
        target: &str,
        text: &str,
    ) -> Result<MessageHandle, ArbolitoError> {
        let client = self.connected_client().await?;
        let jid = jid_for(target)?;

        let msg = waproto::whatsapp::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        };

        let msg_id = retry_send(&client, &jid, msg).await?;
        Ok(self.confirm_server_ack(&msg_id))
    }

    async fn send_video(
        &self,
        target: &str,
        video: &[u8],
        caption: &str,
    ) -> Result<MessageHandle, ArbolitoError> {
        let client = self.connected_client().await?;
        let jid = jid_for(target)?;

        let upload = client
            .upload(video.to_vec(), whatsapp_rust::download::MediaType::Video)
            .await
            .map_err(|e| ArbolitoError::Channel(format!("whatsapp video upload failed: {e}")))?;

        let msg = waproto::whatsapp::Message {
            video_message: Some(Box::new(waproto::whatsapp::message::VideoMessage {
                mimetype: Some("video/mp4".to_string()),
                caption: Some(caption.to_string()),
                url: Some(upload.url),
                direct_path: Some(upload.direct_path),
                media_key: Some(upload.media_key),
                file_enc_sha256: Some(upload.file_enc_sha256),
                file_sha256: Some(upload.file_sha256),
                file_length: Some(upload.file_length),
                ..Default::default()
            })),
            ..Default::default()
        };

        let msg_id = retry_send(&client, &jid, msg).await?;
        Ok(self.confirm_server_ack(&msg_id))
    }

    async fn send_composing(&self, target: &str) -> Result<(), ArbolitoError> {
        let client_guard = self.client.lock().await;
        if let Some(ref client) = *client_guard {
            let jid = jid_for(target)?;
            // Best-effort: a failed typing indicator never blocks the reply.
            let _ = client.chatstate().send_composing(&jid).await;
        }
        Ok(())
    }

    fn ack_events(&self) -> broadcast::Receiver<AckEvent> {
        self.ack_tx.subscribe()
    }

    async fn stop(&self) -> Result<(), ArbolitoError> {
        info!("WhatsApp messenger stopped");
        *self.client.lock().await = None;
        let _ = self.ready_tx.send(Readiness::Starting);
        Ok(())
    }
}
