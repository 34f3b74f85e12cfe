//! Acknowledgement waiter.
//!
//! One waiter per sent message: it subscribes to the client's ack stream
//! before the send result is acted on, filters events by handle identity,
//! and resolves on the first matching event at server level or above.
//! Dropping the receiver on return is what deregisters the subscription,
//! so a terminal waiter can never be re-triggered.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use arbolito_core::message::{AckEvent, AckLevel, MessageHandle};

/// Terminal state of one acknowledgement wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// A matching event at server level or above arrived in time.
    Satisfied(AckLevel),
    /// The window elapsed without such an event.
    TimedOut,
}

impl AckOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }
}

/// Wait until `handle` is confirmed at [`AckLevel::Server`] or above, or
/// until `window` elapses. Events for other handles and sub-server levels
/// for this handle are ignored.
pub async fn await_server_ack(
    mut events: broadcast::Receiver<AckEvent>,
    handle: &MessageHandle,
    window: Duration,
) -> AckOutcome {
    let deadline = Instant::now() + window;

    loop {
        let event = match tokio::time::timeout_at(deadline, events.recv()).await {
            Err(_) => {
                warn!(handle = %handle, "ack window elapsed");
                return AckOutcome::TimedOut;
            }
            Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                warn!(handle = %handle, skipped, "ack stream lagged");
                continue;
            }
            Ok(Err(broadcast::error::RecvError::Closed)) => {
                // Sender gone: no further events can arrive.
                warn!(handle = %handle, "ack stream closed before confirmation");
                return AckOutcome::TimedOut;
            }
            Ok(Ok(event)) => event,
        };

        if event.handle != *handle {
            continue;
        }
        debug!(handle = %handle, level = ?event.level, "ack observed");
        if event.level.reached_server() {
            return AckOutcome::Satisfied(event.level);
        }
    }
}
