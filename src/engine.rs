// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time engine: chunked, pull-scheduled iteration over the
//! plane's live index.
//!
//! A pass splits the live index into fixed-size contiguous chunks and
//! feeds them through a rendezvous channel to a pool of workers.  The
//! chunk size is deliberately independent of the worker count: points
//! near the set boundary iterate hundreds of times longer than points
//! that escape immediately, and a static per-worker split would leave
//! most of the pool idle behind one slow slice.  Workers pull chunks
//! until the queue closes, read the shared grid, and return their
//! verdicts; the grid is only mutated after the full barrier, when the
//! per-worker results are merged and the live index compacted.

use crossbeam;
use crossbeam::channel;
use crossbeam::thread::ScopedJoinHandle;
use num::Complex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use plane::{CellUpdate, GridPoint, Plane};

/// How many live points one unit of queued work covers.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Drives iteration passes over a [`Plane`].
///
/// The engine owns no plane state of its own; it can be reused across
/// planes and across passes.  Worker threads live only for the
/// duration of a single [`advance`](Engine::advance) call.
pub struct Engine {
    workers: usize,
    chunk_size: usize,
    stop: Option<Arc<AtomicBool>>,
}

impl Engine {
    /// An engine running `workers` worker threads per pass (at least
    /// one), with the default chunk size.
    pub fn new(workers: usize) -> Engine {
        Engine {
            workers: workers.max(1),
            chunk_size: DEFAULT_CHUNK_SIZE,
            stop: None,
        }
    }

    /// Overrides the chunk size.  Mostly useful for tests, which want
    /// several chunks out of a small plane.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Engine {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Installs a best-effort cancellation token.  When the flag is
    /// set, the distributor stops handing out chunks; chunks already
    /// dispatched run to completion, and points never dispatched keep
    /// their prior state, so the plane stays consistent.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Engine {
        self.stop = Some(stop);
        self
    }

    /// The number of worker threads a pass will use.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Advances every live point by up to `budget` steps of
    /// `z = z*z + c`, testing for escape after every single step, then
    /// compacts the live index.  Returns the surviving live count.
    ///
    /// A point that escapes at 1-based step `j` adds `j` to its
    /// running count and is frozen; a survivor adds the whole budget
    /// and keeps its updated `z`, so successive small passes
    /// accumulate exactly as one large pass would.  A budget of zero
    /// is a no-op.
    pub fn advance(&self, plane: &mut Plane, budget: usize) -> usize {
        if budget == 0 || plane.live_len() == 0 {
            return plane.live_len();
        }

        let total_chunks = (plane.live_len() + self.chunk_size - 1) / self.chunk_size;
        let completed = AtomicUsize::new(0);
        let mut updates: Vec<CellUpdate> = Vec::with_capacity(plane.live_len());

        {
            let grid: &[GridPoint] = &plane.points;
            let live: &[usize] = &plane.live;
            let completed = &completed;

            crossbeam::scope(|spawner| {
                let (sender, receiver) = channel::bounded::<&[usize]>(0);

                let handles: Vec<ScopedJoinHandle<Vec<CellUpdate>>> = (0..self.workers)
                    .map(|_| {
                        let receiver = receiver.clone();
                        spawner.spawn(move |_| {
                            let mut verdicts = Vec::new();
                            for chunk in receiver.iter() {
                                for &index in chunk {
                                    verdicts.push(step_cell(index, &grid[index], budget));
                                }
                                completed.fetch_add(1, Ordering::Release);
                            }
                            verdicts
                        })
                    })
                    .collect();
                drop(receiver);

                let mut reported = 0;
                for chunk in live.chunks(self.chunk_size) {
                    if let Some(ref stop) = self.stop {
                        if stop.load(Ordering::Acquire) {
                            warn!("iteration pass cancelled before completion");
                            break;
                        }
                    }
                    sender
                        .send(chunk)
                        .expect("iteration worker pool disconnected");

                    let done = completed.load(Ordering::Acquire);
                    let percent = done * 100 / total_chunks / 10 * 10;
                    if percent != reported {
                        info!("iterations are {}% complete", percent);
                        reported = percent;
                    }
                }
                drop(sender);

                for handle in handles {
                    updates.extend(handle.join().unwrap());
                }
            })
            .unwrap();
        }

        plane.apply(updates)
    }
}

/// Runs one cell for up to `budget` steps of the recurrence, expanded
/// to real arithmetic.  Escape is `|z|^2 >= 4`, checked after every
/// step so the recorded count is exact; a non-finite `|z|^2` (a
/// pathological constant overflowing to infinity or NaN) counts as
/// escape at that same step.
fn step_cell(index: usize, cell: &GridPoint, budget: usize) -> CellUpdate {
    let (mut x, mut y) = (cell.z.re, cell.z.im);
    let (cx, cy) = (cell.c.re, cell.c.im);

    for step in 1..=budget {
        let next_x = x * x - y * y + cx;
        let next_y = 2.0 * x * y + cy;
        x = next_x;
        y = next_y;

        let norm = x * x + y * y;
        if norm >= 4.0 || !norm.is_finite() {
            return CellUpdate {
                index,
                z: Complex::new(x, y),
                steps: step as f64,
                diverged: true,
            };
        }
    }

    CellUpdate {
        index,
        z: Complex::new(x, y),
        steps: budget as f64,
        diverged: false,
    }
}
