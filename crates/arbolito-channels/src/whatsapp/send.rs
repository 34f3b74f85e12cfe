//! Message sending utilities — JID mapping and retry logic.

use tracing::{error, warn};
use wacore_binary::jid::Jid;
use whatsapp_rust::client::Client;

use arbolito_core::error::ArbolitoError;
use arbolito_core::recipient::CHAT_SUFFIX;

/// Retry delays for exponential backoff: 500ms, 1s, 2s.
pub(super) const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Map a chat-destination token to a WhatsApp JID.
///
/// Canonical `digits@c.us` ids map to the protocol's `s.whatsapp.net`
/// server; anything already in JID form is parsed as-is.
pub(super) fn jid_for(target: &str) -> Result<Jid, ArbolitoError> {
    if let Some(digits) = target.strip_suffix(CHAT_SUFFIX) {
        return Ok(Jid::new(digits, "s.whatsapp.net"));
    }
    target
        .parse()
        .map_err(|e| ArbolitoError::Channel(format!("invalid whatsapp JID '{target}': {e}")))
}

/// Send a WhatsApp message with retry and exponential backoff.
///
/// Attempts up to 3 times with delays of 500ms, 1s, 2s between retries.
/// Clones the message for each retry attempt.
pub(super) async fn retry_send(
    client: &Client,
    jid: &Jid,
    msg: waproto::whatsapp::Message,
) -> Result<String, ArbolitoError> {
    let mut last_err = None;

    for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
        match client.send_message(jid.clone(), msg.clone()).await {
            Ok(msg_id) => return Ok(msg_id),
            Err(e) => {
                let attempt_num = attempt + 1;
                if attempt_num < RETRY_DELAYS_MS.len() {
                    warn!(
                        "whatsapp send attempt {attempt_num}/{} failed: {e}, retrying in {delay_ms}ms",
                        RETRY_DELAYS_MS.len()
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(*delay_ms)).await;
                } else {
                    error!(
                        "whatsapp send attempt {attempt_num}/{} failed: {e}, giving up",
                        RETRY_DELAYS_MS.len()
                    );
                }
                last_err = Some(e);
            }
        }
    }

    Err(ArbolitoError::Channel(format!(
        "whatsapp send failed after {} attempts: {}",
        RETRY_DELAYS_MS.len(),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}
