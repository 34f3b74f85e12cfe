use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::{
    error::ArbolitoError,
    message::{AckEvent, InboundMessage, MessageHandle},
    recipient::{RecipientId, ResolvedRecipient},
};

/// The external messaging client — the wrapped third-party collaborator.
///
/// Everything hard (wire protocol, encryption, session persistence) lives
/// behind this trait; Arbolito only drives it. All methods are single-shot
/// async operations over one shared logical connection.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Human-readable client name.
    fn name(&self) -> &str;

    /// Connect/initialize and start listening for inbound chat messages.
    /// Returns a receiver that yields them.
    async fn start(&self) -> Result<mpsc::Receiver<InboundMessage>, ArbolitoError>;

    /// Whether the client is authenticated and connected.
    async fn is_ready(&self) -> bool;

    /// Registration lookup: `Ok(Some)` if the id maps to a registered
    /// account, `Ok(None)` if not found, `Err` on transport failure.
    async fn lookup_recipient(
        &self,
        id: &RecipientId,
    ) -> Result<Option<ResolvedRecipient>, ArbolitoError>;

    /// Send a text message. Returns the handle for ack correlation.
    async fn send_text(&self, target: &str, text: &str)
        -> Result<MessageHandle, ArbolitoError>;

    /// Send a video with a caption. Returns the handle for ack correlation.
    async fn send_video(
        &self,
        target: &str,
        video: &[u8],
        caption: &str,
    ) -> Result<MessageHandle, ArbolitoError>;

    /// Signal a "composing" presence indicator on a chat. Best-effort.
    async fn send_composing(&self, target: &str) -> Result<(), ArbolitoError>;

    /// Subscribe to delivery-status events. Each subscriber filters by
    /// handle identity; dropping the receiver deregisters it.
    fn ack_events(&self) -> broadcast::Receiver<AckEvent>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), ArbolitoError>;
}

/// Completion provider — the auto-reply brain.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// One completion call: the inbound text as the user turn, under the
    /// provider's fixed persona prompt. Returns the generated reply.
    async fn complete(&self, user_text: &str) -> Result<String, ArbolitoError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}
