#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time fractal engine
//!
//! The Mandelbrot set is drawn by taking each point `c` of a region of
//! the complex plane and iterating `z = z*z + c` from `z = 0`, counting
//! how many steps it takes for `|z|` to escape past 2.  That count is
//! the "velocity" of the point, and it is the number used to color the
//! image.  The Julia set is the same recurrence with the roles swapped:
//! `z` starts at the point's position and `c` is a single constant
//! shared by the whole plane.
//!
//! The interesting part of the problem is that points near the set's
//! boundary take enormously longer to escape than points far from it,
//! so the work per point is wildly non-uniform.  The [`Plane`] owns the
//! grid of points and an ordered index of the ones still live; the
//! [`Engine`] feeds fixed-size chunks of that index through a work
//! queue to a pool of workers, so that fast chunks never leave a worker
//! idle while a slow chunk grinds on elsewhere.  After every pass the
//! live index is compacted, and the next pass only touches survivors.
//!
//! ```
//! extern crate escapetime;
//! extern crate num;
//!
//! use escapetime::{Engine, Mode, Plane, PlaneSpec};
//! use num::Complex;
//!
//! let spec = PlaneSpec::from_region(
//!     Complex::new(-2.0, -2.0),
//!     Complex::new(2.0, 2.0),
//!     4,
//!     Mode::Mandelbrot,
//! )
//! .unwrap();
//! let mut plane = Plane::new(&spec, 2);
//! let engine = Engine::new(2);
//! let live = engine.advance(&mut plane, 50);
//! // The interior of the set never escapes.
//! assert!(live > 0);
//! ```

extern crate crossbeam;
extern crate gif;
extern crate image;
extern crate itertools;
extern crate num;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[cfg(test)]
extern crate tempfile;

pub mod config;
pub mod engine;
pub mod plane;
pub mod render;

pub use config::{ConfigError, Mode, PlaneSpec};
pub use engine::Engine;
pub use plane::{GridPoint, Plane};
pub use render::ColorMap;
