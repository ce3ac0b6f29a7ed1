// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vista viewer client runtime.
//!
//! A [`Session`] holds one connection at a time to a scene server, feeds every
//! inbound payload through an [`OrderingPipeline`] (decode in parallel, apply
//! in arrival order) into the [`Dispatcher`], which alone writes the shared
//! [`Stores`]. Renderers and panels read through a [`StoreReader`]; outbound
//! camera and pointer events leave through rate-limited [`ThrottledSender`]s.

pub mod camera_sync;
pub mod dispatch;
pub mod pipeline;
pub mod playback;
pub mod pointer;
pub mod session;
pub mod splat;
pub mod stores;
pub mod throttle;
pub mod transport;

pub use camera_sync::{viewer_camera_message, CameraSync};
pub use dispatch::{DispatchError, Dispatcher};
pub use pipeline::{OrderingPipeline, SharedDispatcher};
pub use playback::{play, PlaybackError, PlaybackStats, Recording};
pub use pointer::PointerTracker;
pub use session::{Session, SessionConfig, SessionHandle, SessionStats};
pub use splat::{counting_sort, SortResult, SortWorker};
pub use stores::{StoreReader, StoreWriter, Stores};
pub use throttle::{make_sender, OutboundTarget, ThrottledSender};
#[cfg(unix)]
pub use transport::UnixConnector;
pub use transport::{BoxedStream, Connector, TcpConnector};
