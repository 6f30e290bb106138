extern crate escapetime;
extern crate num;

use escapetime::{Engine, Mode, Plane, PlaneSpec};
use num::Complex;

/// The 4x4 grid over [-2,-2]..[2,2]: step size 1, positions -2..1 on
/// both axes, the origin at row 2, col 2.
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
fn mandelbrot_end_to_end() {
    let mut plane = Plane::new(&square_spec(Mode::Mandelbrot), 2);
    let engine = Engine::new(2);
    engine.advance(&mut plane, 50);

    // The origin is the fixed point of the recurrence and never
    // escapes; it stays in the live index with the full budget on its
    // running count.
    assert!(plane.is_live(2, 2));
    assert_eq!(plane.point(2, 2).iterations, 50.0);

    // The corner escapes on the very first step.
    assert!(!plane.is_live(0, 0));
    assert_eq!(plane.point(0, 0).iterations, 1.0);
}

#[test]
fn a_point_at_two_two_escapes_in_one_step() {
    // A grid that actually contains c = (2, 2): 5x5 with step 1.
    let spec = PlaneSpec::new(Complex::new(-2.0, -2.0), 5, 5, 1.0, Mode::Mandelbrot).unwrap();
    let mut plane = Plane::new(&spec, 2);
    Engine::new(2).advance(&mut plane, 50);

    assert_eq!(plane.point(4, 4).c, Complex::new(2.0, 2.0));
    assert!(!plane.is_live(4, 4));
    assert_eq!(plane.point(4, 4).iterations, 1.0);
}

#[test]
fn julia_mode_swaps_the_roles_of_z_and_c() {
    let constant = Complex::new(0.35, 0.35);
    let plane = Plane::new(&square_spec(Mode::Julia(constant)), 2);

    for row in 0..plane.y_steps() {
        for col in 0..plane.x_steps() {
            let cell = plane.point(row, col);
            assert_eq!(cell.c, constant);
            assert_eq!(
                cell.z,
                Complex::new(-2.0 + (col as f64), -2.0 + (row as f64))
            );
        }
    }
}

#[test]
fn repeated_framed_passes_match_one_large_pass() {
    let mut whole = Plane::new(&square_spec(Mode::Julia(Complex::new(0.35, 0.35))), 1);
    let mut framed = Plane::new(&square_spec(Mode::Julia(Complex::new(0.35, 0.35))), 3);

    Engine::new(1).advance(&mut whole, 40);
    let framed_engine = Engine::new(3).with_chunk_size(2);
    for _ in 0..8 {
        framed_engine.advance(&mut framed, 5);
    }

    for row in 0..4 {
        for col in 0..4 {
            assert_eq!(
                whole.point(row, col).iterations,
                framed.point(row, col).iterations
            );
            assert_eq!(
                whole.is_live(row, col),
                framed.is_live(row, col)
            );
        }
    }
}
