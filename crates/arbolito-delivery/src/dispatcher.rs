//! Outbound send with automatic media-to-text degradation.

use tracing::{info, warn};

use arbolito_core::{
    error::ArbolitoError,
    message::{MessageHandle, OutboundMessage},
    traits::Messenger,
};

/// Upper bound for a media attachment. Larger files degrade to text.
pub const MAX_MEDIA_BYTES: u64 = 64 * 1024 * 1024;

/// Appended to the text body when the media variant could not be sent.
const MEDIA_FALLBACK_NOTE: &str = "(Lo siento, no pude adjuntar el video.)";

/// Send an outbound message to `target`.
///
/// When a media attachment is present it is checked and read before the
/// media send is attempted; any failure along that path (missing file,
/// oversized file, read error, send error) degrades to a text-only send
/// with an appended apology note instead of failing the operation. A
/// failure of the text send itself propagates — there is no retry here.
pub async fn dispatch(
    messenger: &dyn Messenger,
    target: &str,
    message: &OutboundMessage,
) -> Result<MessageHandle, ArbolitoError> {
    if let Some(path) = &message.media_path {
        match load_media(path).await {
            Ok(video) => match messenger.send_video(target, &video, &message.text).await {
                Ok(handle) => {
                    info!(target, handle = %handle, "video message sent");
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(target, error = %e, "video send failed, falling back to text");
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "media unavailable, falling back to text");
            }
        }
        let text = format!("{}\n\n{}", message.text, MEDIA_FALLBACK_NOTE);
        let handle = messenger.send_text(target, &text).await?;
        info!(target, handle = %handle, "fallback text sent");
        return Ok(handle);
    }

    let handle = messenger.send_text(target, &message.text).await?;
    info!(target, handle = %handle, "text message sent");
    Ok(handle)
}

async fn load_media(path: &std::path::Path) -> Result<Vec<u8>, ArbolitoError> {
    let meta = tokio::fs::metadata(path).await?;
    if !meta.is_file() {
        return Err(ArbolitoError::Channel(format!(
            "media path {} is not a file",
            path.display()
        )));
    }
    if meta.len() > MAX_MEDIA_BYTES {
        return Err(ArbolitoError::Channel(format!(
            "media file {} exceeds {} byte limit",
            path.display(),
            MAX_MEDIA_BYTES
        )));
    }
    Ok(tokio::fs::read(path).await?)
}
