//! Turns frozen iteration counts into pixels: still images as PNG,
//! progressively refined sequences as animated GIF.
//!
//! The plane's row 0 is the lower edge of the region, so rows are
//! flipped on the way into the image buffer.  Points still live when a
//! frame is drawn belong (as far as the budget can tell) to the set
//! interior and render black.

use crossbeam;
use crossbeam::thread::ScopedJoinHandle;
use failure::Error;
use gif::{Encoder, Frame, Repeat, SetParameter};
use image::{Rgba, RgbaImage};
use itertools::iproduct;
use std::io::Write;
use std::path::Path;

use engine::Engine;
use plane::Plane;

/// Maps an iteration count to a color intensity through the monotonic
/// curve `255 - 255 / (1 + gain * count)`: fast escapees stay dark,
/// slow ones saturate toward white.
#[derive(Copy, Clone, Debug)]
pub struct ColorMap {
    /// Steepness of the curve.  Larger values brighten low counts.
    pub gain: f64,
}

impl Default for ColorMap {
    fn default() -> ColorMap {
        ColorMap { gain: 0.05 }
    }
}

impl ColorMap {
    /// A color map with the given gain.
    pub fn new(gain: f64) -> ColorMap {
        ColorMap { gain }
    }

    /// The 8-bit intensity for a frozen iteration count.
    pub fn intensity(&self, iterations: f64) -> u8 {
        (255.0 - 255.0 / (1.0 + self.gain * iterations)) as u8
    }
}

/// Settings for animated output.
#[derive(Copy, Clone, Debug)]
pub struct GifOptions {
    /// Iteration budget spent between consecutive frames.
    pub iterations_per_frame: usize,
    /// Total iteration budget across the whole animation.
    pub max_iterations: usize,
    /// Per-frame delay in hundredths of a second.
    pub delay: u16,
}

/// Renders the plane's current state to an RGBA image.  Diverged
/// points get their intensity from `colors`; live points are black.
pub fn plot_image(plane: &Plane, colors: &ColorMap) -> RgbaImage {
    let (width, height) = (plane.x_steps(), plane.y_steps());
    let mut img = RgbaImage::from_pixel(width as u32, height as u32, Rgba([0, 0, 0, 255]));
    let live = plane.live_mask();

    for (row, col) in iproduct!(0..height, 0..width) {
        if live[row * width + col] {
            continue;
        }
        let value = colors.intensity(plane.point(row, col).iterations);
        img.put_pixel(
            col as u32,
            (height - 1 - row) as u32,
            Rgba([value, value, value, 255]),
        );
    }
    img
}

/// Renders the plane and writes it to `path` as a PNG.
pub fn write_png<P: AsRef<Path>>(path: P, plane: &Plane, colors: &ColorMap) -> Result<(), Error> {
    plot_image(plane, colors).save(path)?;
    Ok(())
}

/// Runs the engine a frame's worth of iterations at a time, rendering
/// after each pass, and writes the frames out as a looping animated
/// GIF.  Frame generation stops when the budget is spent or every
/// point has escaped.
///
/// Palettizing RGBA frames down to GIF's 256 colors is the expensive
/// half of encoding, so the frames are quantized in parallel, one
/// contiguous batch per worker, before the serial write.
pub fn write_gif<W: Write>(
    out: W,
    plane: &mut Plane,
    engine: &Engine,
    colors: &ColorMap,
    opts: &GifOptions,
) -> Result<(), Error> {
    ensure!(
        opts.iterations_per_frame > 0,
        "iterations per frame must be positive"
    );
    ensure!(
        opts.iterations_per_frame <= opts.max_iterations,
        "iterations per frame cannot exceed the total budget"
    );

    let mut images: Vec<RgbaImage> = Vec::new();
    let mut spent = 0;
    while spent + opts.iterations_per_frame <= opts.max_iterations && plane.live_len() > 0 {
        engine.advance(plane, opts.iterations_per_frame);
        spent += opts.iterations_per_frame;
        images.push(plot_image(plane, colors));
    }
    info!("finished generating {} frames, now encoding", images.len());

    let width = plane.x_steps() as u16;
    let height = plane.y_steps() as u16;
    let delay = opts.delay;
    let batch_len = images.len() / engine.workers() + 1;
    let mut frames: Vec<Frame<'static>> = Vec::with_capacity(images.len());

    crossbeam::scope(|spawner| {
        let handles: Vec<ScopedJoinHandle<Vec<Frame<'static>>>> = images
            .chunks(batch_len)
            .map(|batch| {
                spawner.spawn(move |_| {
                    batch
                        .iter()
                        .map(|img| {
                            let mut data = img.as_raw().clone();
                            let mut frame = Frame::from_rgba(width, height, &mut data);
                            frame.delay = delay;
                            frame
                        })
                        .collect()
                })
            })
            .collect();
        for handle in handles {
            frames.extend(handle.join().unwrap());
        }
    })
    .unwrap();

    let mut encoder = Encoder::new(out, width, height, &[])?;
    encoder.set(Repeat::Infinite)?;
    for frame in &frames {
        encoder.write_frame(frame)?;
    }
    Ok(())
}
