//! Shared mock messaging client for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use arbolito_core::{
    error::ArbolitoError,
    message::{AckEvent, InboundMessage, MessageHandle},
    recipient::{RecipientId, ResolvedRecipient},
    traits::Messenger,
};

/// Scripted outcome for one `lookup_recipient` call.
pub(crate) enum LookupOutcome {
    Found(String),
    NotFound,
    TransportError,
}

pub(crate) struct MockMessenger {
    /// Outcomes consumed front-to-back, one per lookup call.
    pub lookups: Mutex<Vec<LookupOutcome>>,
    /// Ids the mock was asked to look up, in order.
    pub lookups_seen: Mutex<Vec<String>>,
    pub sent_texts: Mutex<Vec<(String, String)>>,
    pub sent_videos: Mutex<Vec<(String, usize, String)>>,
    pub fail_video_send: bool,
    pub fail_text_send: bool,
    ack_tx: broadcast::Sender<AckEvent>,
    next_handle: Mutex<u64>,
}

impl MockMessenger {
    pub fn new() -> Self {
        let (ack_tx, _) = broadcast::channel(16);
        Self {
            lookups: Mutex::new(Vec::new()),
            lookups_seen: Mutex::new(Vec::new()),
            sent_texts: Mutex::new(Vec::new()),
            sent_videos: Mutex::new(Vec::new()),
            fail_video_send: false,
            fail_text_send: false,
            ack_tx,
            next_handle: Mutex::new(0),
        }
    }

    pub fn with_lookups(outcomes: Vec<LookupOutcome>) -> Self {
        let mock = Self::new();
        *mock.lookups.lock().unwrap() = outcomes;
        mock
    }

    pub fn emit_ack(&self, event: AckEvent) {
        let _ = self.ack_tx.send(event);
    }

    fn handle(&self) -> MessageHandle {
        let mut n = self.next_handle.lock().unwrap();
        *n += 1;
        MessageHandle::new(format!("mock-{}", *n))
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundMessage>, ArbolitoError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn lookup_recipient(
        &self,
        id: &RecipientId,
    ) -> Result<Option<ResolvedRecipient>, ArbolitoError> {
        self.lookups_seen.lock().unwrap().push(id.as_str().to_string());
        let outcome = {
            let mut queue = self.lookups.lock().unwrap();
            if queue.is_empty() {
                LookupOutcome::NotFound
            } else {
                queue.remove(0)
            }
        };
        match outcome {
            LookupOutcome::Found(serialized) => Ok(Some(ResolvedRecipient { serialized })),
            LookupOutcome::NotFound => Ok(None),
            LookupOutcome::TransportError => {
                Err(ArbolitoError::Channel("lookup transport failure".into()))
            }
        }
    }

    async fn send_text(
        &self,
        target: &str,
        text: &str,
    ) -> Result<MessageHandle, ArbolitoError> {
        if self.fail_text_send {
            return Err(ArbolitoError::Channel("text send failed".into()));
        }
        self.sent_texts
            .lock()
            .unwrap()
            .push((target.to_string(), text.to_string()));
        Ok(self.handle())
    }

    async fn send_video(
        &self,
        target: &str,
        video: &[u8],
        caption: &str,
    ) -> Result<MessageHandle, ArbolitoError> {
        if self.fail_video_send {
            return Err(ArbolitoError::Channel("video send failed".into()));
        }
        self.sent_videos
            .lock()
            .unwrap()
            .push((target.to_string(), video.len(), caption.to_string()));
        Ok(self.handle())
    }

    async fn send_composing(&self, _target: &str) -> Result<(), ArbolitoError> {
        Ok(())
    }

    fn ack_events(&self) -> broadcast::Receiver<AckEvent> {
        self.ack_tx.subscribe()
    }

    async fn stop(&self) -> Result<(), ArbolitoError> {
        Ok(())
    }
}
