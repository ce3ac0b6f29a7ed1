// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-connection ordering pipeline.
//!
//! Decode starts the moment a payload is enqueued, so decode work overlaps
//! network waits. Application is serialized: one runner task awaits the
//! queued decodes strictly in enqueue order and hands each result to the
//! [`Dispatcher`], regardless of which decode finished first.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use vista_proto::{codec, CodecError, Message};

use crate::dispatch::Dispatcher;

/// Future produced by a [`Decoder`].
pub type DecodeFuture = Pin<Box<dyn Future<Output = Result<Message, CodecError>> + Send>>;

/// Payload decoder. The default runs [`codec::decode`] on the blocking pool.
pub type Decoder = Arc<dyn Fn(Bytes) -> DecodeFuture + Send + Sync>;

/// Dispatcher shared between the pipelines of successive connections.
pub type SharedDispatcher = Arc<Mutex<Dispatcher>>;

/// Decoder that moves CBOR parsing off the async workers.
pub fn blocking_decoder() -> Decoder {
    Arc::new(|payload: Bytes| {
        Box::pin(async move {
            match tokio::task::spawn_blocking(move || codec::decode(&payload)).await {
                Ok(result) => result,
                Err(err) => Err(CodecError::Malformed(format!("decode task failed: {err}"))),
            }
        })
    })
}

enum Pending {
    Decoding(JoinHandle<Result<Message, CodecError>>),
    Ready(Message),
}

/// FIFO decode-then-apply queue for one connection.
///
/// Dropping the pipeline (or calling [`Self::shutdown`]) abandons anything
/// still queued: decodes that resolve afterwards are never applied.
pub struct OrderingPipeline {
    queue: mpsc::UnboundedSender<Pending>,
    done: DoneFlag,
    decoder: Decoder,
    runner: JoinHandle<()>,
}

/// Raises the done flag when the pipeline goes away.
struct DoneFlag(Arc<AtomicBool>);

impl Drop for DoneFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

impl OrderingPipeline {
    /// Pipeline applying to `dispatcher` while its generation equals
    /// `generation`. Must be called inside a tokio runtime.
    pub fn new(dispatcher: SharedDispatcher, generation: u64) -> Self {
        Self::with_decoder(dispatcher, generation, blocking_decoder())
    }

    /// Same as [`Self::new`] with a custom decoder.
    pub fn with_decoder(dispatcher: SharedDispatcher, generation: u64, decoder: Decoder) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let done = Arc::new(AtomicBool::new(false));
        let runner = tokio::spawn(run(rx, dispatcher, Arc::clone(&done), generation));
        Self {
            queue,
            done: DoneFlag(done),
            decoder,
            runner,
        }
    }

    /// Start decoding `payload` now; apply it after everything enqueued before.
    pub fn enqueue(&self, payload: Bytes) {
        if self.is_done() {
            return;
        }
        let handle = tokio::spawn((self.decoder)(payload));
        if self.queue.send(Pending::Decoding(handle)).is_err() {
            debug!("pipeline runner gone; dropping payload");
        }
    }

    /// Queue an already decoded message (playback sources).
    pub fn enqueue_message(&self, msg: Message) {
        if self.is_done() {
            return;
        }
        if self.queue.send(Pending::Ready(msg)).is_err() {
            debug!("pipeline runner gone; dropping message");
        }
    }

    /// Returns true once shut down.
    pub fn is_done(&self) -> bool {
        self.done.0.load(Ordering::Acquire)
    }

    /// Stop applying. Already running application finishes; nothing after it
    /// starts.
    pub fn shutdown(&self) {
        self.done.0.store(true, Ordering::Release);
    }

    /// Close the queue and wait until everything enqueued so far is applied
    /// (or abandoned, if shut down).
    pub async fn drain(self) {
        let Self {
            queue, runner, done, ..
        } = self;
        drop(queue);
        if let Err(err) = runner.await {
            if err.is_panic() {
                error!(?err, "pipeline runner panicked");
            }
        }
        drop(done);
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Pending>,
    dispatcher: SharedDispatcher,
    done: Arc<AtomicBool>,
    generation: u64,
) {
    while let Some(pending) = rx.recv().await {
        let msg = match pending {
            Pending::Ready(msg) => msg,
            Pending::Decoding(handle) => match handle.await {
                Ok(Ok(msg)) => msg,
                Ok(Err(err)) => {
                    error!(%err, "undecodable payload skipped");
                    continue;
                }
                Err(err) => {
                    warn!(?err, "decode task did not complete");
                    continue;
                }
            },
        };
        if done.load(Ordering::Acquire) {
            debug!("pipeline shut down; abandoning queued messages");
            break;
        }
        let mut dispatcher = dispatcher.lock().unwrap_or_else(PoisonError::into_inner);
        if dispatcher.generation() != generation {
            debug!(
                generation,
                current = dispatcher.generation(),
                "stale pipeline; abandoning queued messages"
            );
            break;
        }
        dispatcher.dispatch(msg);
    }
}
