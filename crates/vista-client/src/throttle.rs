// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rate-limited outbound senders.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};
use vista_proto::Message;

/// Outbound channel of whichever connection is currently open.
///
/// Sessions attach a fresh channel on every connect and detach it on close.
/// Sends while detached are dropped.
#[derive(Clone, Default)]
pub struct OutboundTarget {
    slot: Arc<Mutex<Option<mpsc::Sender<Message>>>>,
}

impl OutboundTarget {
    /// Detached target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route sends to `tx` until [`Self::detach`].
    pub fn attach(&self, tx: mpsc::Sender<Message>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
    }

    /// Stop routing sends.
    pub fn detach(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns true while a connection channel is attached.
    pub fn is_attached(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Queue `msg` on the current connection. Returns false if it was dropped.
    pub fn send(&self, msg: Message) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = slot.as_ref() else {
            debug!(kind = msg.kind(), "not connected; dropping outbound message");
            return false;
        };
        match tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                warn!(kind = msg.kind(), "outbound queue full; dropping message");
                false
            }
            Err(TrySendError::Closed(msg)) => {
                debug!(kind = msg.kind(), "connection closed; dropping outbound message");
                false
            }
        }
    }
}

#[derive(Default)]
struct ThrottleState {
    last_sent: Option<Instant>,
    pending: Option<Message>,
    armed: bool,
}

struct Inner {
    target: OutboundTarget,
    interval: Duration,
    state: Mutex<ThrottleState>,
}

impl Inner {
    fn flush(&self) {
        let msg = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.armed = false;
            let msg = state.pending.take();
            if msg.is_some() {
                state.last_sent = Some(Instant::now());
            }
            msg
        };
        if let Some(msg) = msg {
            self.target.send(msg);
        }
    }
}

/// Sends at most once per interval; a burst collapses to its first and
/// last message.
///
/// Clones share one rate limit. Independent senders (camera, pointer) are
/// separate [`make_sender`] calls.
#[derive(Clone)]
pub struct ThrottledSender {
    inner: Arc<Inner>,
}

/// Wrap `target` so sends are spaced at least `min_interval` apart.
pub fn make_sender(target: OutboundTarget, min_interval: Duration) -> ThrottledSender {
    ThrottledSender {
        inner: Arc::new(Inner {
            target,
            interval: min_interval,
            state: Mutex::new(ThrottleState::default()),
        }),
    }
}

impl ThrottledSender {
    /// Minimum spacing between sends.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Send now if the window has elapsed, else replace the deferred payload.
    ///
    /// Deferral needs a tokio runtime; without one the message goes out
    /// immediately.
    pub fn send(&self, msg: Message) {
        let now = Instant::now();
        let deadline = {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.armed {
                state.pending = Some(msg);
                return;
            }
            match state.last_sent {
                Some(last) if now.saturating_duration_since(last) < self.inner.interval => {
                    state.pending = Some(msg);
                    state.armed = true;
                    last + self.inner.interval
                }
                _ => {
                    state.last_sent = Some(now);
                    drop(state);
                    self.inner.target.send(msg);
                    return;
                }
            }
        };

        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    sleep_until(deadline).await;
                    inner.flush();
                });
            }
            Err(_) => inner.flush(),
        }
    }
}
