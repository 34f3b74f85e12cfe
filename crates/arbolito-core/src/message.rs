use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recipient::RecipientId;

/// Opaque identifier returned by a send call. Used only to correlate later
/// acknowledgement events to the message that produced them; never reused
/// across two distinct sends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle(String);

impl MessageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordinal delivery-confirmation status reported by the messaging client.
///
/// Monotonic per message in the happy path, but events may be observed
/// out of order or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AckLevel {
    Error,
    Pending,
    /// Message accepted by the server.
    Server,
    /// Message reached the recipient's device.
    Device,
    Read,
    Played,
}

impl AckLevel {
    /// Wire ordinal: -1 error, 0 pending, 1 server, 2 device, 3 read, 4 played.
    pub fn code(&self) -> i8 {
        match self {
            Self::Error => -1,
            Self::Pending => 0,
            Self::Server => 1,
            Self::Device => 2,
            Self::Read => 3,
            Self::Played => 4,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::Error),
            0 => Some(Self::Pending),
            1 => Some(Self::Server),
            2 => Some(Self::Device),
            3 => Some(Self::Read),
            4 => Some(Self::Played),
            _ => None,
        }
    }

    /// Whether this level confirms the message at least reached the server.
    pub fn reached_server(&self) -> bool {
        self.code() >= Self::Server.code()
    }
}

/// A delivery-status event for one sent message.
#[derive(Debug, Clone)]
pub struct AckEvent {
    pub handle: MessageHandle,
    pub level: AckLevel,
}

/// An outbound payload plus its target. Created by the caller, consumed
/// once by the dispatcher.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub recipient: RecipientId,
    pub text: String,
    /// Optional media attachment path (bounded size, checked at dispatch).
    pub media_path: Option<PathBuf>,
}

impl OutboundMessage {
    pub fn text(recipient: RecipientId, text: impl Into<String>) -> Self {
        Self {
            recipient,
            text: text.into(),
            media_path: None,
        }
    }

    pub fn with_media(recipient: RecipientId, text: impl Into<String>, path: PathBuf) -> Self {
        Self {
            recipient,
            text: text.into(),
            media_path: Some(path),
        }
    }
}

/// An inbound chat message from the messaging client.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: Uuid,
    /// Chat the message arrived in; replies go back here.
    pub chat: String,
    /// Sender identifier within the chat.
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Whether the message originates from the bot's own account.
    pub from_me: bool,
    pub is_group: bool,
}

impl InboundMessage {
    /// Whether this message comes from the status/broadcast pseudo-chat.
    pub fn is_status_broadcast(&self) -> bool {
        self.chat.contains("status")
    }
}
