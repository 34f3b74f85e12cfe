//! Conversational auto-reply flow, independent of welcome delivery.
//!
//! Each inbound chat message gets one completion call under the fixed
//! persona and the result is relayed back to the same chat. Failures are
//! logged and dropped; they never affect the dispatch flow.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use arbolito_core::{
    message::InboundMessage,
    traits::{Messenger, Provider},
};

/// Delay before replying, so the typing indicator reads naturally.
const DEFAULT_PACING: Duration = Duration::from_millis(1000);

pub struct Responder {
    messenger: Arc<dyn Messenger>,
    provider: Option<Arc<dyn Provider>>,
    pacing: Duration,
}

impl Responder {
    /// `provider` is `None` when no model credentials are configured; the
    /// responder then consumes inbound messages without replying.
    pub fn new(messenger: Arc<dyn Messenger>, provider: Option<Arc<dyn Provider>>) -> Self {
        Self {
            messenger,
            provider,
            pacing: DEFAULT_PACING,
        }
    }

    #[cfg(test)]
    fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Consume inbound messages until the channel closes. Each qualifying
    /// message is handled on its own task so a slow completion cannot
    /// stall the stream.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<InboundMessage>) {
        while let Some(msg) = rx.recv().await {
            if msg.from_me || msg.is_group || msg.is_status_broadcast() {
                continue;
            }
            if msg.text.trim().is_empty() {
                continue;
            }
            let Some(provider) = self.provider.clone() else {
                debug!(chat = %msg.chat, "no provider configured, skipping reply");
                continue;
            };
            let responder = self.clone();
            tokio::spawn(async move {
                responder.reply(provider, msg).await;
            });
        }
        info!("responder stream closed");
    }

    async fn reply(&self, provider: Arc<dyn Provider>, msg: InboundMessage) {
        tokio::time::sleep(self.pacing).await;
        if let Err(e) = self.messenger.send_composing(&msg.chat).await {
            debug!(chat = %msg.chat, error = %e, "typing indicator failed");
        }

        let reply = match provider.complete(&msg.text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(chat = %msg.chat, error = %e, "completion failed, dropping reply");
                return;
            }
        };

        match self.messenger.send_text(&msg.chat, &reply).await {
            Ok(handle) => info!(chat = %msg.chat, handle = %handle, "auto-reply sent"),
            Err(e) => warn!(chat = %msg.chat, error = %e, "auto-reply send failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{MockMessenger, MockProvider};
    use chrono::Utc;
    use uuid::Uuid;

    fn inbound(chat: &str, text: &str) -> InboundMessage {
        InboundMessage {
            id: Uuid::new_v4(),
            chat: chat.into(),
            sender: chat.trim_end_matches("@c.us").into(),
            text: text.into(),
            timestamp: Utc::now(),
            from_me: false,
            is_group: false,
        }
    }

    async fn run_with(
        messenger: Arc<MockMessenger>,
        provider: Option<Arc<dyn Provider>>,
        messages: Vec<InboundMessage>,
    ) {
        let responder = Arc::new(
            Responder::new(messenger, provider).with_pacing(Duration::ZERO),
        );
        let (tx, rx) = mpsc::channel(8);
        for msg in messages {
            tx.send(msg).await.unwrap();
        }
        drop(tx);
        responder.run(rx).await;
        // Replies run on spawned tasks; give them a beat to finish.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_replies_with_completion_to_same_chat() {
        let messenger = Arc::new(MockMessenger::new());
        let provider = Arc::new(MockProvider::new("Soy el guardián de la Navidad."));

        run_with(
            messenger.clone(),
            Some(provider.clone()),
            vec![inbound("5215512345678@c.us", "¿Quién eres?")],
        )
        .await;

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["¿Quién eres?"]);

        let texts = messenger.sent_texts.lock().unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "5215512345678@c.us");
        assert_eq!(texts[0].1, "Soy el guardián de la Navidad.");
    }

    #[tokio::test]
    async fn test_sends_typing_indicator_before_reply() {
        let messenger = Arc::new(MockMessenger::new());
        let provider = Arc::new(MockProvider::new("hola"));

        run_with(
            messenger.clone(),
            Some(provider),
            vec![inbound("573001234567@c.us", "hola árbol")],
        )
        .await;

        let composing = messenger.composing.lock().unwrap();
        assert_eq!(composing.as_slice(), ["573001234567@c.us"]);
    }

    #[tokio::test]
    async fn test_no_provider_means_no_calls_and_no_replies() {
        let messenger = Arc::new(MockMessenger::new());

        run_with(
            messenger.clone(),
            None,
            vec![inbound("573001234567@c.us", "hola")],
        )
        .await;

        assert!(messenger.sent_texts.lock().unwrap().is_empty());
        assert!(messenger.composing.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ignores_groups_own_messages_and_status() {
        let messenger = Arc::new(MockMessenger::new());
        let provider = Arc::new(MockProvider::new("hola"));

        let mut own = inbound("573001234567@c.us", "me");
        own.from_me = true;
        let mut group = inbound("1203630012@g.us", "group chatter");
        group.is_group = true;
        let status = inbound("status@broadcast", "story");
        let empty = inbound("573001234567@c.us", "   ");

        run_with(
            messenger.clone(),
            Some(provider.clone()),
            vec![own, group, status, empty],
        )
        .await;

        assert!(provider.calls.lock().unwrap().is_empty());
        assert!(messenger.sent_texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_completion_failure_is_dropped() {
        let messenger = Arc::new(MockMessenger::new());
        let mut provider = MockProvider::new("unused");
        provider.fail = true;

        run_with(
            messenger.clone(),
            Some(Arc::new(provider)),
            vec![inbound("573001234567@c.us", "hola")],
        )
        .await;

        assert!(messenger.sent_texts.lock().unwrap().is_empty());
    }
}
