//! Validated construction input for the plane and the engine.
//!
//! Nothing downstream of this module ever checks its inputs again: a
//! [`PlaneSpec`] can only be obtained through constructors that have
//! already rejected empty grids, non-finite bounds, and inverted
//! regions.  The worker count and the Julia constant travel inside the
//! spec and the engine rather than as process-global state, so two
//! planes built in the same process cannot interfere with each other.

use num::Complex;

/// Which parameterization of the `z = z*z + c` recurrence to run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    /// `z` starts at zero and `c` is the point's position on the plane.
    Mandelbrot,
    /// `z` starts at the point's position and `c` is this constant,
    /// shared by every point on the plane.
    Julia(Complex<f64>),
}

/// Everything needed to lay out a plane: the minimum (lower-left)
/// corner, the number of grid steps along each axis, the linear step
/// size, and the recurrence mode.
#[derive(Copy, Clone, Debug)]
pub struct PlaneSpec {
    /// The lower-left corner of the region.  Row 0, column 0 of the
    /// grid sits exactly here.
    pub min: Complex<f64>,
    /// Number of columns in the grid.
    pub x_steps: usize,
    /// Number of rows in the grid.
    pub y_steps: usize,
    /// Distance between adjacent grid points, the same on both axes.
    pub step_size: f64,
    /// Mandelbrot or Julia parameterization.
    pub mode: Mode,
}

/// The ways a requested region or resolution can be unusable.  All of
/// these are caller errors, caught before any plane is built.
#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    /// A step count of zero on either axis.
    #[fail(display = "step counts must be positive")]
    EmptyGrid,
    /// A zero, negative, or non-finite step size.
    #[fail(display = "step size must be positive and finite")]
    BadStepSize,
    /// A region corner or Julia constant with a NaN or infinite part.
    #[fail(display = "region bounds and constants must be finite")]
    NonFiniteBounds,
    /// An upper bound at or below the lower bound on some axis.
    #[fail(display = "the upper bound must exceed the lower bound on both axes")]
    InvertedBounds,
}

fn finite(z: &Complex<f64>) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

impl PlaneSpec {
    /// Builds a spec from the raw grid parameters, rejecting anything
    /// the plane and engine are not prepared to handle.
    pub fn new(
        min: Complex<f64>,
        x_steps: usize,
        y_steps: usize,
        step_size: f64,
        mode: Mode,
    ) -> Result<PlaneSpec, ConfigError> {
        if x_steps == 0 || y_steps == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(ConfigError::BadStepSize);
        }
        if !finite(&min) {
            return Err(ConfigError::NonFiniteBounds);
        }
        if let Mode::Julia(c) = mode {
            if !finite(&c) {
                return Err(ConfigError::NonFiniteBounds);
            }
        }
        Ok(PlaneSpec {
            min,
            x_steps,
            y_steps,
            step_size,
            mode,
        })
    }

    /// Builds a spec from a region given as its lower-left and
    /// upper-right corners plus a horizontal resolution.  The step size
    /// is the region width divided by the resolution, and the row count
    /// follows from the region height at that same step, so pixels stay
    /// square even for non-square regions.
    pub fn from_region(
        lower_left: Complex<f64>,
        upper_right: Complex<f64>,
        x_steps: usize,
        mode: Mode,
    ) -> Result<PlaneSpec, ConfigError> {
        if !finite(&lower_left) || !finite(&upper_right) {
            return Err(ConfigError::NonFiniteBounds);
        }
        if upper_right.re <= lower_left.re || upper_right.im <= lower_left.im {
            return Err(ConfigError::InvertedBounds);
        }
        if x_steps == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let step_size = (upper_right.re - lower_left.re) / (x_steps as f64);
        let y_steps = ((upper_right.im - lower_left.im) / step_size) as usize;
        PlaneSpec::new(lower_left, x_steps, y_steps.max(1), step_size, mode)
    }

    /// The total number of grid points the spec describes.
    pub fn len(&self) -> usize {
        self.x_steps * self.y_steps
    }

    /// Whether the spec describes an empty grid.  Constructors reject
    /// empty grids, so this is always false for a spec they returned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_grid() {
        let err = PlaneSpec::new(Complex::new(0.0, 0.0), 0, 10, 0.1, Mode::Mandelbrot);
        assert_eq!(err.unwrap_err(), ConfigError::EmptyGrid);
        let err = PlaneSpec::new(Complex::new(0.0, 0.0), 10, 0, 0.1, Mode::Mandelbrot);
        assert_eq!(err.unwrap_err(), ConfigError::EmptyGrid);
    }

    #[test]
    fn rejects_bad_step_size() {
        for step in &[0.0, -1.0, ::std::f64::NAN, ::std::f64::INFINITY] {
            let err = PlaneSpec::new(Complex::new(0.0, 0.0), 4, 4, *step, Mode::Mandelbrot);
            assert_eq!(err.unwrap_err(), ConfigError::BadStepSize);
        }
    }

    #[test]
    fn rejects_non_finite_corners_and_constants() {
        let err = PlaneSpec::new(
            Complex::new(::std::f64::NAN, 0.0),
            4,
            4,
            0.5,
            Mode::Mandelbrot,
        );
        assert_eq!(err.unwrap_err(), ConfigError::NonFiniteBounds);
        let err = PlaneSpec::new(
            Complex::new(0.0, 0.0),
            4,
            4,
            0.5,
            Mode::Julia(Complex::new(0.0, ::std::f64::INFINITY)),
        );
        assert_eq!(err.unwrap_err(), ConfigError::NonFiniteBounds);
    }

    #[test]
    fn rejects_inverted_regions() {
        let err = PlaneSpec::from_region(
            Complex::new(1.0, -2.0),
            Complex::new(-1.0, 2.0),
            100,
            Mode::Mandelbrot,
        );
        assert_eq!(err.unwrap_err(), ConfigError::InvertedBounds);
    }

    #[test]
    fn square_region_derives_square_grid() {
        let spec = PlaneSpec::from_region(
            Complex::new(-2.0, -2.0),
            Complex::new(2.0, 2.0),
            100,
            Mode::Mandelbrot,
        )
        .unwrap();
        assert_eq!(spec.x_steps, 100);
        assert_eq!(spec.y_steps, 100);
        assert_eq!(spec.step_size, 0.04);
        assert_eq!(spec.len(), 10_000);
    }

    #[test]
    fn tall_region_derives_more_rows() {
        let spec = PlaneSpec::from_region(
            Complex::new(0.0, 0.0),
            Complex::new(1.0, 2.0),
            10,
            Mode::Mandelbrot,
        )
        .unwrap();
        assert_eq!(spec.y_steps, 20);
    }
}
