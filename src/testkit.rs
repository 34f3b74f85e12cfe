//! Shared mocks for API and responder tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use arbolito_core::{
    error::ArbolitoError,
    message::{AckEvent, InboundMessage, MessageHandle},
    recipient::{RecipientId, ResolvedRecipient},
    traits::{Messenger, Provider},
};

/// Scripted outcome for one `lookup_recipient` call.
pub enum LookupOutcome {
    Found(String),
    NotFound,
    TransportError,
}

/// A messenger that records sends and replays scripted lookup outcomes.
pub struct MockMessenger {
    pub ready: bool,
    pub lookups: Mutex<Vec<LookupOutcome>>,
    pub sent_texts: Mutex<Vec<(String, String)>>,
    pub sent_videos: Mutex<Vec<(String, usize, String)>>,
    pub composing: Mutex<Vec<String>>,
    pub fail_text_send: bool,
    ack_tx: broadcast::Sender<AckEvent>,
    next_handle: Mutex<u64>,
}

impl MockMessenger {
    pub fn new() -> Self {
        let (ack_tx, _) = broadcast::channel(16);
        Self {
            ready: true,
            lookups: Mutex::new(Vec::new()),
            sent_texts: Mutex::new(Vec::new()),
            sent_videos: Mutex::new(Vec::new()),
            composing: Mutex::new(Vec::new()),
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
        self.ready
    }

    async fn lookup_recipient(
        &self,
        _id: &RecipientId,
    ) -> Result<Option<ResolvedRecipient>, ArbolitoError> {
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
        self.sent_videos
            .lock()
            .unwrap()
            .push((target.to_string(), video.len(), caption.to_string()));
        Ok(self.handle())
    }

    async fn send_composing(&self, target: &str) -> Result<(), ArbolitoError> {
        self.composing.lock().unwrap().push(target.to_string());
        Ok(())
    }

    fn ack_events(&self) -> broadcast::Receiver<AckEvent> {
        self.ack_tx.subscribe()
    }

    async fn stop(&self) -> Result<(), ArbolitoError> {
        Ok(())
    }
}

/// A provider that replies with a fixed string, or fails when scripted to.
pub struct MockProvider {
    pub reply: String,
    pub fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn complete(&self, user_text: &str) -> Result<String, ArbolitoError> {
        self.calls.lock().unwrap().push(user_text.to_string());
        if self.fail {
            return Err(ArbolitoError::Provider("completion failed".into()));
        }
        Ok(self.reply.clone())
    }

    async fn is_available(&self) -> bool {
        true
    }
}
