//! Incoming WhatsApp event handling — filtering, unwrapping, forwarding.

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;
use wacore::types::presence::ReceiptType;

use arbolito_core::message::{AckLevel, InboundMessage};

/// Map a delivery receipt type to an acknowledgement level.
///
/// Receipts only arrive after the server has relayed the message, so the
/// floor here is [`AckLevel::Device`]; server-level confirmation is
/// emitted directly from the send path.
pub(super) fn receipt_level(receipt_type: &ReceiptType) -> AckLevel {
    match receipt_type {
        ReceiptType::Read | ReceiptType::ReadSelf => AckLevel::Read,
        _ => AckLevel::Device,
    }
}

/// Process an incoming WhatsApp message event.
///
/// Drops group traffic, own messages, and empty payloads; unwraps nested
/// message containers; forwards the rest as an [`InboundMessage`].
pub(super) async fn handle_inbound_message(
    msg: waproto::whatsapp::Message,
    info: wacore::types::message::MessageInfo,
    tx: &mpsc::Sender<InboundMessage>,
) {
    let is_group = info.source.is_group;

    debug!(
        "WA msg: is_group={}, is_from_me={}, sender={}, chat={}",
        is_group, info.source.is_from_me, info.source.sender.user, info.source.chat.user,
    );

    if is_group {
        debug!("WA filtered: ignoring group message");
        return;
    }
    if info.source.is_from_me {
        debug!("WA filtered: ignoring own message");
        return;
    }

    // Unwrap nested wrappers (device_sent, ephemeral, view_once).
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(&msg);

    let text = inner
        .conversation
        .as_deref()
        .or_else(|| {
            inner
                .extended_text_message
                .as_ref()
                .and_then(|e| e.text.as_deref())
        })
        .unwrap_or("")
        .to_string();

    if text.is_empty() {
        debug!("WA filtered: no text payload");
        return;
    }

    let inbound = InboundMessage {
        id: Uuid::new_v4(),
        chat: info.source.chat.to_string(),
        sender: info.source.sender.user.clone(),
        text,
        timestamp: chrono::Utc::now(),
        from_me: false,
        is_group: false,
    };

    if tx.send(inbound).await.is_err() {
        info!("whatsapp message receiver dropped");
    }
}
