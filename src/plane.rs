// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The plane: a row-major grid of points under iteration, plus the
//! ordered index of points not yet known to diverge.
//!
//! The plane is a passive structure; the [`Engine`](::engine::Engine)
//! drives it.  The live index holds linear indices into the grid
//! rather than references, so exclusive access during a parallel pass
//! is a matter of index-range disjointness instead of pointer
//! discipline.

use crossbeam;
use num::Complex;

use config::{Mode, PlaneSpec};

/// One cell of the plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridPoint {
    /// The iterated value, updated on every pass the point survives.
    pub z: Complex<f64>,
    /// The fixed constant of the recurrence: the cell's position on
    /// the plane in Mandelbrot mode, the shared constant in Julia mode.
    pub c: Complex<f64>,
    /// Running iteration count.  A surviving point accumulates the
    /// full budget of each pass; a diverging point adds the 1-based
    /// step at which it escaped and is then frozen forever.
    pub iterations: f64,
}

impl Default for GridPoint {
    fn default() -> GridPoint {
        GridPoint {
            z: Complex::new(0.0, 0.0),
            c: Complex::new(0.0, 0.0),
            iterations: 0.0,
        }
    }
}

/// One worker's verdict on one cell after a pass: the updated value,
/// the steps consumed, and whether the cell escaped.  Produced on the
/// worker's own chunk and merged into the grid at the barrier.
pub(crate) struct CellUpdate {
    pub(crate) index: usize,
    pub(crate) z: Complex<f64>,
    pub(crate) steps: f64,
    pub(crate) diverged: bool,
}

/// The grid of points and the live index.
///
/// Invariants: the live index is strictly increasing (hence
/// duplicate-free), it only shrinks, and it never names a point that
/// has diverged.
#[derive(Debug)]
pub struct Plane {
    pub(crate) points: Vec<GridPoint>,
    pub(crate) live: Vec<usize>,
    x_steps: usize,
    y_steps: usize,
}

impl Plane {
    /// Lays out and fully populates the grid described by `spec`,
    /// spreading the rows across `workers` threads.  Worker `w` owns
    /// rows `w, w + W, w + 2W, …`, so no row is ever touched by two
    /// workers and no locking is needed; the call joins every worker
    /// before returning, so a partially built grid is never visible.
    pub fn new(spec: &PlaneSpec, workers: usize) -> Plane {
        let (x_steps, y_steps) = (spec.x_steps, spec.y_steps);
        let mut points = vec![GridPoint::default(); x_steps * y_steps];
        let workers = workers.max(1).min(y_steps);

        {
            let mut strided: Vec<Vec<(usize, &mut [GridPoint])>> =
                (0..workers).map(|_| Vec::new()).collect();
            for (y, row) in points.chunks_mut(x_steps).enumerate() {
                strided[y % workers].push((y, row));
            }
            crossbeam::scope(|spawner| {
                for rows in strided {
                    spawner.spawn(move |_| {
                        for (y, row) in rows {
                            for (x, cell) in row.iter_mut().enumerate() {
                                let position = Complex::new(
                                    spec.min.re + (x as f64) * spec.step_size,
                                    spec.min.im + (y as f64) * spec.step_size,
                                );
                                *cell = match spec.mode {
                                    Mode::Mandelbrot => GridPoint {
                                        z: Complex::new(0.0, 0.0),
                                        c: position,
                                        iterations: 0.0,
                                    },
                                    Mode::Julia(c) => GridPoint {
                                        z: position,
                                        c,
                                        iterations: 0.0,
                                    },
                                };
                            }
                        }
                    });
                }
            })
            .unwrap();
        }

        Plane {
            live: (0..points.len()).collect(),
            points,
            x_steps,
            y_steps,
        }
    }

    /// Number of columns in the grid.
    pub fn x_steps(&self) -> usize {
        self.x_steps
    }

    /// Number of rows in the grid.
    pub fn y_steps(&self) -> usize {
        self.y_steps
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the grid holds no points.  Specs reject empty grids, so
    /// a constructed plane is never empty.
    pub fn is_empty(&self) -> bool {
        self.points.len() == 0
    }

    /// Number of points not yet known to diverge.
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// The live index itself: the linear indices of the still-live
    /// points, in increasing order.
    pub fn live(&self) -> &[usize] {
        &self.live
    }

    /// The cell at `(row, col)`, row 0 at the region's lower edge.
    ///
    /// Panics if either coordinate is out of range.
    pub fn point(&self, row: usize, col: usize) -> &GridPoint {
        assert!(row < self.y_steps && col < self.x_steps);
        &self.points[row * self.x_steps + col]
    }

    /// Whether the cell at `(row, col)` is still live.
    pub fn is_live(&self, row: usize, col: usize) -> bool {
        self.live.binary_search(&(row * self.x_steps + col)).is_ok()
    }

    /// One bool per grid cell, true where the cell is still live.
    pub fn live_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.points.len()];
        for &i in &self.live {
            mask[i] = true;
        }
        mask
    }

    /// Merges a pass's per-worker results back into the grid, then
    /// rebuilds the live index in a single ordered filtering pass.
    /// Batching the removal to this one fence point is what lets the
    /// parallel phase run without any per-divergence synchronization.
    /// Returns the surviving live count.
    pub(crate) fn apply(&mut self, updates: Vec<CellUpdate>) -> usize {
        let mut escaped = vec![false; self.points.len()];
        for update in updates {
            let cell = &mut self.points[update.index];
            cell.z = update.z;
            cell.iterations += update.steps;
            if update.diverged {
                escaped[update.index] = true;
            }
        }
        self.live.retain(|&i| !escaped[i]);
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_spec(mode: Mode) -> PlaneSpec {
        PlaneSpec::from_region(
            Complex::new(-2.0, -2.0),
            Complex::new(2.0, 2.0),
            4,
            mode,
        )
        .unwrap()
    }

    #[test]
    fn mandelbrot_cells_start_at_zero_with_positional_constants() {
        let plane = Plane::new(&square_spec(Mode::Mandelbrot), 3);
        assert_eq!(plane.len(), 16);
        for row in 0..4 {
            for col in 0..4 {
                let cell = plane.point(row, col);
                assert_eq!(cell.z, Complex::new(0.0, 0.0));
                assert_eq!(
                    cell.c,
                    Complex::new(-2.0 + (col as f64), -2.0 + (row as f64))
                );
                assert_eq!(cell.iterations, 0.0);
            }
        }
    }

    #[test]
    fn julia_cells_start_at_their_position_with_a_shared_constant() {
        let c = Complex::new(0.35, 0.35);
        let plane = Plane::new(&square_spec(Mode::Julia(c)), 2);
        for row in 0..4 {
            for col in 0..4 {
                let cell = plane.point(row, col);
                assert_eq!(cell.c, c);
                assert_eq!(
                    cell.z,
                    Complex::new(-2.0 + (col as f64), -2.0 + (row as f64))
                );
            }
        }
    }

    #[test]
    fn live_index_starts_full_and_in_row_major_order() {
        let plane = Plane::new(&square_spec(Mode::Mandelbrot), 1);
        let expected: Vec<usize> = (0..16).collect();
        assert_eq!(plane.live(), expected.as_slice());
        assert!(plane.is_live(0, 0));
        assert!(plane.is_live(3, 3));
    }

    #[test]
    fn worker_count_does_not_change_the_grid() {
        let narrow = Plane::new(&square_spec(Mode::Mandelbrot), 1);
        let wide = Plane::new(&square_spec(Mode::Mandelbrot), 7);
        assert_eq!(narrow.points, wide.points);
    }

    #[test]
    fn apply_freezes_escapees_and_keeps_survivor_order() {
        let mut plane = Plane::new(&square_spec(Mode::Mandelbrot), 1);
        let updates = vec![
            CellUpdate {
                index: 5,
                z: Complex::new(9.0, 0.0),
                steps: 3.0,
                diverged: true,
            },
            CellUpdate {
                index: 6,
                z: Complex::new(0.5, 0.5),
                steps: 10.0,
                diverged: false,
            },
        ];
        assert_eq!(plane.apply(updates), 15);
        assert!(!plane.is_live(1, 1));
        assert_eq!(plane.point(1, 1).iterations, 3.0);
        assert_eq!(plane.point(1, 2).iterations, 10.0);
        let expected: Vec<usize> = (0..16).filter(|&i| i != 5).collect();
        assert_eq!(plane.live(), expected.as_slice());
    }
}
