// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless Vista viewer.
//! Connects to a scene server (TCP or Unix socket) or replays a recording, and
//! logs what a windowed viewer would draw.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vista_app_core::config::ConfigService;
use vista_app_core::prefs::{ClientPrefs, PREFS_KEY};
use vista_client::{
    make_sender, play, CameraSync, Connector, Dispatcher, OrderingPipeline, OutboundTarget,
    Recording, Session, SessionConfig, SharedDispatcher, SortWorker, StoreReader, Stores,
    TcpConnector,
};
use vista_config_fs::FsConfigStore;
use vista_geom::{focal_lengths, CameraState, Vec3};
use vista_scene::{MockAdapter, Renderable, ScenePort};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Vista viewer client")]
struct Args {
    /// Scene server TCP address (e.g. 127.0.0.1:8080); saved for next time
    #[arg(long)]
    server: Option<String>,
    /// Connect over this Unix socket instead of TCP
    #[arg(long)]
    unix_socket: Option<PathBuf>,
    /// Replay a recording instead of connecting
    #[arg(long)]
    playback: Option<PathBuf>,
    /// Fixed delay between reconnect attempts, in milliseconds
    #[arg(long)]
    reconnect_ms: Option<u64>,
    /// Do not write command-line overrides back to the saved preferences
    #[arg(long)]
    no_save_prefs: bool,
    /// Preferences directory (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

impl Args {
    /// Fold flags into `prefs`; returns true if anything changed.
    fn apply(&self, prefs: &mut ClientPrefs) -> bool {
        let before = prefs.clone();
        if let Some(server) = &self.server {
            prefs.server.clone_from(server);
            prefs.unix_socket = None;
        }
        if let Some(path) = &self.unix_socket {
            prefs.unix_socket = Some(path.clone());
        }
        if let Some(ms) = self.reconnect_ms {
            prefs.reconnect_delay_ms = ms;
        }
        *prefs != before
    }
}

fn load_prefs(args: &Args) -> Result<ClientPrefs> {
    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::with_base(dir),
        None => FsConfigStore::new(),
    }
    .context("open preferences directory")?;
    let config = ConfigService::new(store);
    let mut prefs: ClientPrefs = config.load_or_init(PREFS_KEY);
    if args.apply(&mut prefs) && !args.no_save_prefs {
        if let Err(err) = config.save(PREFS_KEY, &prefs) {
            warn!(?err, "could not save preferences");
        }
    }
    Ok(prefs)
}

/// Splat centers of every drawn splat node, placed in the render frame by
/// the pose `port` last received for that node.
fn splat_centers(reader: &StoreReader, port: &MockAdapter) -> Vec<[f32; 3]> {
    reader.read_scene(|tree, _| {
        let mut out = Vec::new();
        for path in tree.walk() {
            let (Some(node), Some(drawn)) = (tree.get(path), port.get_node(path)) else {
                continue;
            };
            let Renderable::GaussianSplats { centers, .. } = &node.renderable else {
                continue;
            };
            let pose = drawn.pose;
            out.extend(
                centers
                    .iter()
                    .map(|c| (pose.translation + pose.rotation * Vec3::from_array(*c)).to_array()),
            );
        }
        out
    })
}

/// Render-frame direction the camera looks along.
fn view_direction(cam: &CameraState) -> [f32; 3] {
    (cam.look_at - cam.position).normalize_or_zero().to_array()
}

/// Viewport the headless renderer reports: width, height, device pixel ratio.
const HEADLESS_VIEWPORT: (u32, u32, f32) = (1280, 720, 1.0);

/// Redraws into a mock port on every store change and keeps splats sorted.
fn spawn_renderer(reader: StoreReader) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut changes = reader.subscribe();
        let mut port = MockAdapter::new();
        let (width, height, dpr) = HEADLESS_VIEWPORT;
        port.resize(width, height, dpr);
        let mut sorter = match SortWorker::spawn() {
            Ok(worker) => Some(worker),
            Err(err) => {
                warn!(%err, "splat sorting disabled");
                None
            }
        };
        let mut centers = Vec::new();
        while changes.changed().await.is_ok() {
            let stats = reader.render(&mut port);
            let widgets = reader.read_gui(|gui| gui.widget_count());
            let cam = reader.camera();
            let (width, height, dpr) = port.viewport;
            #[allow(clippy::cast_precision_loss)]
            let (fx, fy) = focal_lengths(cam.fov_y, width as f32, height as f32, dpr);
            info!(
                revision = reader.revision(),
                nodes = stats.synced,
                visible = stats.visible,
                failed = stats.failed,
                widgets,
                fx,
                fy,
                "frame"
            );
            let Some(worker) = sorter.as_mut() else {
                continue;
            };
            let latest = splat_centers(&reader, &port);
            if latest != centers {
                centers = latest;
                worker.set_centers(centers.clone());
            }
            if !centers.is_empty() {
                worker.request_sort(view_direction(&cam));
            }
            if let Some(order) = worker.poll() {
                debug!(generation = order.generation, splats = order.indices.len(), "splats sorted");
            }
        }
    })
}

async fn run_session<C: Connector>(
    connector: C,
    dispatcher: SharedDispatcher,
    outbound: OutboundTarget,
    sync: CameraSync,
    prefs: &ClientPrefs,
) -> Result<()> {
    let session = Session::new(connector, dispatcher, outbound, SessionConfig::from(prefs))
        .with_camera_sync(sync);
    let handle = session.handle();
    let mut run = tokio::spawn(session.run());
    let stats = tokio::select! {
        res = &mut run => res?,
        res = tokio::signal::ctrl_c() => {
            res.context("listen for ctrl-c")?;
            info!("shutting down");
            handle.stop();
            run.await?
        }
    };
    info!(
        connections = stats.connections,
        failed = stats.failed_attempts,
        "session ended"
    );
    Ok(())
}

async fn run_playback(path: PathBuf, dispatcher: SharedDispatcher) -> Result<()> {
    let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
    let recording = Recording::read_from(BufReader::new(file))
        .with_context(|| format!("load recording {}", path.display()))?;
    info!(
        path = %path.display(),
        messages = recording.messages.len(),
        looping = recording.loop_start_index.is_some(),
        "playing recording"
    );
    let generation = {
        let mut d = dispatcher.lock().unwrap_or_else(PoisonError::into_inner);
        d.set_server(&path.display().to_string());
        d.begin_generation()
    };
    let pipeline = OrderingPipeline::new(dispatcher, generation);
    tokio::select! {
        stats = play(&recording, |msg| pipeline.enqueue_message(msg)) => {
            info!(messages = stats.messages, "recording finished");
        }
        res = tokio::signal::ctrl_c() => {
            res.context("listen for ctrl-c")?;
            info!("playback stopped");
        }
    }
    pipeline.drain().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = load_prefs(&args)?;

    let (writer, reader) = Stores::new().split();
    let outbound = OutboundTarget::new();
    let sync = CameraSync::new(
        reader.clone(),
        make_sender(outbound.clone(), prefs.camera_throttle()),
    );
    let dispatcher: SharedDispatcher = Arc::new(Mutex::new(
        Dispatcher::new(writer).with_camera_sync(sync.clone()),
    ));
    let renderer = spawn_renderer(reader);

    let result = if let Some(path) = args.playback {
        run_playback(path, dispatcher).await
    } else if let Some(path) = &prefs.unix_socket {
        #[cfg(unix)]
        {
            let connector = vista_client::UnixConnector::new(path);
            run_session(connector, dispatcher, outbound, sync, &prefs).await
        }
        #[cfg(not(unix))]
        {
            Err(anyhow::anyhow!(
                "unix sockets are unavailable on this platform: {}",
                path.display()
            ))
        }
    } else {
        let connector = TcpConnector::new(prefs.server.clone());
        run_session(connector, dispatcher, outbound, sync, &prefs).await
    };

    renderer.abort();
    result
}
