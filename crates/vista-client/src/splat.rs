// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Background depth sort for Gaussian splats.
//!
//! Splats blend back to front, so every camera move needs a fresh order.
//! The sort runs on its own thread; results are tagged with the generation
//! of the center buffer they were computed from and dropped if that buffer
//! has since been replaced.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

const DEPTH_SCALE: f32 = 4096.0;
const BINS: usize = 1 << 16;

/// Indices into the center buffer, farthest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortResult {
    /// Center buffer generation the order belongs to.
    pub generation: u64,
    /// Splat indices in draw order.
    pub indices: Vec<u32>,
}

/// Order `centers` back to front along `view_dir` with a 16-bit counting
/// sort.
///
/// `view_dir` points away from the eye; a larger `view_dir · center` is
/// farther. Depths are quantized to fixed point and binned over their
/// observed range, so splats closer than one bin apart keep index order.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn counting_sort(centers: &[[f32; 3]], view_dir: [f32; 3]) -> Vec<u32> {
    if centers.is_empty() {
        return Vec::new();
    }
    let depths: Vec<i32> = centers
        .iter()
        .map(|c| -((view_dir[0] * c[0] + view_dir[1] * c[1] + view_dir[2] * c[2]) * DEPTH_SCALE) as i32)
        .collect();
    let (min, max) = depths
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), d| (lo.min(*d), hi.max(*d)));
    let inv = (BINS - 1) as f64 / (f64::from(max) - f64::from(min) + 1e-5);

    let bins: Vec<usize> = depths
        .iter()
        .map(|d| (((f64::from(*d) - f64::from(min)) * inv) as usize).min(BINS - 1))
        .collect();
    let mut starts = vec![0u32; BINS];
    for bin in &bins {
        starts[*bin] += 1;
    }
    let mut total = 0u32;
    for slot in &mut starts {
        let count = *slot;
        *slot = total;
        total += count;
    }
    let mut out = vec![0u32; centers.len()];
    for (i, bin) in bins.iter().enumerate() {
        let slot = &mut starts[*bin];
        out[*slot as usize] = i as u32;
        *slot += 1;
    }
    out
}

enum Request {
    Centers { generation: u64, centers: Arc<[[f32; 3]]> },
    Sort { view_dir: [f32; 3] },
    Stop,
}

/// Handle to the sorting thread.
pub struct SortWorker {
    requests: Sender<Request>,
    results: Receiver<SortResult>,
    generation: u64,
    thread: Option<JoinHandle<()>>,
}

impl SortWorker {
    /// Spawn the sorting thread.
    pub fn spawn() -> std::io::Result<Self> {
        let (requests, req_rx) = mpsc::channel();
        let (res_tx, results) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("vista-splat-sort".into())
            .spawn(move || sort_loop(&req_rx, &res_tx))?;
        Ok(Self {
            requests,
            results,
            generation: 0,
            thread: Some(thread),
        })
    }

    /// Generation of the current center buffer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the center buffer. Any result for an older buffer is stale
    /// from now on. Returns the new generation.
    pub fn set_centers(&mut self, centers: Vec<[f32; 3]>) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.submit(Request::Centers {
            generation,
            centers: centers.into(),
        });
        generation
    }

    /// Ask for a new order along `view_dir`. Requests queued faster than
    /// the thread sorts collapse into the newest.
    pub fn request_sort(&self, view_dir: [f32; 3]) {
        self.submit(Request::Sort { view_dir });
    }

    fn submit(&self, req: Request) {
        if self.requests.send(req).is_err() {
            warn!("splat sort thread is gone");
        }
    }

    /// Newest finished order for the current buffer, if any.
    pub fn poll(&self) -> Option<SortResult> {
        let mut newest = None;
        loop {
            match self.results.try_recv() {
                Ok(result) => {
                    if let Some(fresh) = self.accept(result) {
                        newest = Some(fresh);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return newest,
            }
        }
    }

    /// Block up to `timeout` for an order matching the current buffer.
    pub fn wait(&self, timeout: Duration) -> Option<SortResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(left) {
                Ok(result) => {
                    if let Some(fresh) = self.accept(result) {
                        return Some(fresh);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn accept(&self, result: SortResult) -> Option<SortResult> {
        if result.generation == self.generation {
            Some(result)
        } else {
            debug!(
                stale = result.generation,
                current = self.generation,
                "discarding stale splat order"
            );
            None
        }
    }
}

impl Drop for SortWorker {
    fn drop(&mut self) {
        let _ = self.requests.send(Request::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("splat sort thread panicked");
            }
        }
    }
}

fn sort_loop(requests: &Receiver<Request>, results: &Sender<SortResult>) {
    let mut centers: Option<(u64, Arc<[[f32; 3]]>)> = None;
    let mut view: Option<[f32; 3]> = None;
    while let Ok(first) = requests.recv() {
        let mut next = Some(first);
        while let Some(req) = next.take() {
            match req {
                Request::Centers {
                    generation,
                    centers: buf,
                } => {
                    centers = Some((generation, buf));
                }
                Request::Sort { view_dir } => {
                    view = Some(view_dir);
                }
                Request::Stop => return,
            }
            next = requests.try_recv().ok();
        }
        let (Some((generation, buf)), Some(view_dir)) = (&centers, view) else {
            continue;
        };
        let indices = counting_sort(buf, view_dir);
        trace!(generation, splats = indices.len(), "splats sorted");
        if results
            .send(SortResult {
                generation: *generation,
                indices,
            })
            .is_err()
        {
            return;
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn farthest_splat_comes_first() {
        let centers = [[0.0, 0.0, 1.0], [0.0, 0.0, 3.0], [0.0, 0.0, 2.0]];
        assert_eq!(counting_sort(&centers, [0.0, 0.0, 1.0]), [1, 2, 0]);
        assert_eq!(counting_sort(&centers, [0.0, 0.0, -1.0]), [0, 2, 1]);
    }

    #[test]
    fn ties_keep_index_order() {
        let centers = [[1.0, 0.0, 0.0], [1.0, 5.0, 0.0], [-2.0, 0.0, 0.0]];
        assert_eq!(counting_sort(&centers, [1.0, 0.0, 0.0]), [0, 1, 2]);
        assert!(counting_sort(&[], [1.0, 0.0, 0.0]).is_empty());
    }

    #[test]
    fn worker_drops_orders_for_replaced_buffers() {
        let mut worker = SortWorker::spawn().expect("spawn");
        let first = worker.set_centers(vec![[0.0, 0.0, 1.0]; 4]);
        worker.request_sort([0.0, 0.0, 1.0]);
        let second = worker.set_centers(vec![[0.0, 0.0, 1.0], [0.0, 0.0, 2.0]]);
        assert!(second > first);

        let result = worker.wait(Duration::from_secs(5)).expect("sorted");
        assert_eq!(result.generation, second);
        assert_eq!(result.indices, [1, 0]);
        assert_eq!(worker.poll(), None);
    }
}
