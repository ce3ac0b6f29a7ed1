// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reconnecting session loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use vista_app_core::prefs::ClientPrefs;

use crate::camera_sync::CameraSync;
use crate::pipeline::{OrderingPipeline, SharedDispatcher};
use crate::throttle::OutboundTarget;
use crate::transport::{read_payloads, write_messages, BoxedStream, Connector};

const OUTBOUND_CAPACITY: usize = 256;

/// Session timing and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delay before the first attempt.
    pub initial_delay: Duration,
    /// Fixed delay between attempts.
    pub reconnect_delay: Duration,
    /// Delay before the first camera report on a new connection.
    pub camera_on_connect: Duration,
    /// Largest accepted payload.
    pub max_payload: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&ClientPrefs::default())
    }
}

impl From<&ClientPrefs> for SessionConfig {
    fn from(prefs: &ClientPrefs) -> Self {
        Self {
            initial_delay: prefs.initial_delay(),
            reconnect_delay: prefs.reconnect_delay(),
            camera_on_connect: prefs.camera_on_connect(),
            max_payload: prefs.max_frame_bytes,
        }
    }
}

/// Stops a running [`Session`].
#[derive(Clone)]
pub struct SessionHandle {
    done: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl SessionHandle {
    /// Stop the loop: the open connection closes and no reconnect is
    /// scheduled.
    pub fn stop(&self) {
        self.done.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Returns true once [`Self::stop`] was called.
    pub fn is_stopped(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// Counters reported when [`Session::run`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Connections that opened.
    pub connections: u32,
    /// Attempts that failed to open.
    pub failed_attempts: u32,
}

/// Connects, streams payloads into a fresh [`OrderingPipeline`] per
/// connection, and reconnects with a fixed delay until stopped.
pub struct Session<C> {
    connector: C,
    dispatcher: SharedDispatcher,
    outbound: OutboundTarget,
    camera_sync: Option<CameraSync>,
    config: SessionConfig,
    handle: SessionHandle,
}

impl<C: Connector> Session<C> {
    /// Session over `connector`; outbound messages go through `outbound`.
    pub fn new(
        connector: C,
        dispatcher: SharedDispatcher,
        outbound: OutboundTarget,
        config: SessionConfig,
    ) -> Self {
        Self {
            connector,
            dispatcher,
            outbound,
            camera_sync: None,
            config,
            handle: SessionHandle {
                done: Arc::new(AtomicBool::new(false)),
                wake: Arc::new(Notify::new()),
            },
        }
    }

    /// Report the camera shortly after every connect.
    pub fn with_camera_sync(mut self, sync: CameraSync) -> Self {
        self.camera_sync = Some(sync);
        self
    }

    /// Handle that stops this session.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Run until stopped.
    pub async fn run(self) -> SessionStats {
        let mut stats = SessionStats::default();
        let server = self.connector.describe();
        self.dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_server(&server);

        if !self.pause(self.config.initial_delay).await {
            return stats;
        }
        loop {
            let attempt = tokio::select! {
                res = self.connector.connect() => Some(res),
                () = self.handle.wake.notified() => None,
            };
            match attempt {
                Some(Ok(stream)) => {
                    stats.connections += 1;
                    self.serve(&server, stream).await;
                }
                Some(Err(err)) => {
                    stats.failed_attempts += 1;
                    warn!(server = %server, "connect failed: {err:#}");
                }
                None => {}
            }
            if self.handle.is_stopped() {
                break;
            }
            info!(server = %server, delay_ms = self.config.reconnect_delay.as_millis(), "reconnect scheduled");
            if !self.pause(self.config.reconnect_delay).await {
                break;
            }
        }
        info!(server = %server, "session stopped");
        stats
    }

    /// Sleep unless stopped first; returns false if stopped.
    async fn pause(&self, delay: Duration) -> bool {
        if self.handle.is_stopped() {
            return false;
        }
        tokio::select! {
            () = sleep(delay) => !self.handle.is_stopped(),
            () = self.handle.wake.notified() => false,
        }
    }

    async fn serve(&self, server: &str, stream: BoxedStream) {
        let generation = {
            let mut dispatcher = self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner);
            let generation = dispatcher.begin_generation();
            dispatcher.on_connected(server);
            generation
        };
        info!(server, generation, "connected");

        let pipeline = OrderingPipeline::new(Arc::clone(&self.dispatcher), generation);
        let (reader, writer) = tokio::io::split(stream);
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.outbound.attach(tx);
        let writer_task = tokio::spawn(write_messages(writer, rx));
        let camera_task = self.camera_sync.clone().map(|sync| {
            let delay = self.config.camera_on_connect;
            tokio::spawn(async move {
                sleep(delay).await;
                sync.publish();
            })
        });

        let result = tokio::select! {
            res = read_payloads(reader, self.config.max_payload, |payload| pipeline.enqueue(payload)) => res,
            () = self.handle.wake.notified() => Ok(()),
        };
        match result {
            Ok(()) => info!(server, "connection closed"),
            Err(err) => warn!(server, "connection failed: {err:#}"),
        }

        self.outbound.detach();
        pipeline.shutdown();
        if let Some(task) = camera_task {
            task.abort();
        }
        writer_task.abort();
        if let Ok(Err(err)) = writer_task.await {
            debug!(server, "writer ended: {err:#}");
        }
        self.dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_disconnected();
    }
}
