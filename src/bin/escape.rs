extern crate clap;
extern crate env_logger;
extern crate escapetime;
extern crate failure;
extern crate num;
extern crate num_cpus;
#[macro_use]
extern crate log;

use clap::{App, Arg, ArgMatches};
use escapetime::render::{self, GifOptions};
use escapetime::{ColorMap, Engine, Mode, Plane, PlaneSpec};
use failure::{format_err, Error};
use num::Complex;
use std::fs::File;
use std::str::FromStr;
use std::time::Instant;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_positive_float(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(f) if f.is_finite() && f > 0.0 => Ok(()),
        _ => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const RESOLUTION: &str = "resolution";
const ITERATIONS: &str = "iterations";
const LOWERLEFT: &str = "lowerleft";
const UPPERRIGHT: &str = "upperright";
const JULIA: &str = "julia";
const JULIAPOINT: &str = "julia-point";
const THREADS: &str = "threads";
const GAIN: &str = "gain";
const FRAMEITERS: &str = "frame-iterations";
const GIFDELAY: &str = "gif-delay";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("escape")
        .version("0.1.0")
        .about("Mandelbrot and Julia set renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (.png, or .gif with --frame-iterations)"),
        )
        .arg(
            Arg::with_name(RESOLUTION)
                .required(false)
                .long(RESOLUTION)
                .short("r")
                .takes_value(true)
                .default_value("2000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        20_000,
                        "Could not parse the horizontal resolution",
                        "Resolution must be between 1 and 20000",
                    )
                })
                .help("Horizontal resolution in pixels; rows follow from the region shape"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("500")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        1_000_000,
                        "Could not parse the iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Total iteration budget per point"),
        )
        .arg(
            Arg::with_name(LOWERLEFT)
                .required(false)
                .long(LOWERLEFT)
                .short("l")
                .takes_value(true)
                .default_value("-2,-2")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse lower left corner"))
                .help("Lower left corner of the region"),
        )
        .arg(
            Arg::with_name(UPPERRIGHT)
                .required(false)
                .long(UPPERRIGHT)
                .short("u")
                .takes_value(true)
                .default_value("2,2")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse upper right corner"))
                .help("Upper right corner of the region"),
        )
        .arg(
            Arg::with_name(JULIA)
                .required(false)
                .long(JULIA)
                .short("j")
                .help("Render the Julia set instead of the Mandelbrot set"),
        )
        .arg(
            Arg::with_name(JULIAPOINT)
                .required(false)
                .long(JULIAPOINT)
                .short("c")
                .takes_value(true)
                .default_value("0.35,0.35")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse Julia constant"))
                .help("The c constant for the Julia set"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads (defaults to the CPU count)"),
        )
        .arg(
            Arg::with_name(GAIN)
                .required(false)
                .long(GAIN)
                .short("k")
                .takes_value(true)
                .default_value("0.05")
                .validator(|s| {
                    validate_positive_float(&s, "Gain must be a positive finite number")
                })
                .help("Steepness of the iteration-count-to-intensity curve"),
        )
        .arg(
            Arg::with_name(FRAMEITERS)
                .required(false)
                .long(FRAMEITERS)
                .short("g")
                .takes_value(true)
                .default_value("0")
                .validator(|s| {
                    validate_range(
                        &s,
                        0usize,
                        1_000_000,
                        "Could not parse the per-frame iteration count",
                        "Per-frame iterations must be between 0 and 1000000",
                    )
                })
                .help("If non-zero, write an animated GIF advancing this many iterations per frame"),
        )
        .arg(
            Arg::with_name(GIFDELAY)
                .required(false)
                .long(GIFDELAY)
                .short("d")
                .takes_value(true)
                .default_value("20")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u16,
                        10_000,
                        "Could not parse the GIF frame delay",
                        "GIF frame delay must be between 1 and 10000",
                    )
                })
                .help("GIF frame delay in hundredths of a second"),
        )
        .get_matches()
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let output = matches.value_of(OUTPUT).unwrap();
    let resolution = usize::from_str(matches.value_of(RESOLUTION).unwrap())?;
    let iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap())?;
    let lower_left = parse_complex(matches.value_of(LOWERLEFT).unwrap())
        .ok_or_else(|| format_err!("could not parse the lower left corner"))?;
    let upper_right = parse_complex(matches.value_of(UPPERRIGHT).unwrap())
        .ok_or_else(|| format_err!("could not parse the upper right corner"))?;
    let threads = match matches.value_of(THREADS) {
        Some(s) => usize::from_str(s)?,
        None => num_cpus::get(),
    };
    let colors = ColorMap::new(f64::from_str(matches.value_of(GAIN).unwrap())?);
    let frame_iterations = usize::from_str(matches.value_of(FRAMEITERS).unwrap())?;
    let gif_delay = u16::from_str(matches.value_of(GIFDELAY).unwrap())?;

    let mode = if matches.is_present(JULIA) {
        let c = parse_complex(matches.value_of(JULIAPOINT).unwrap())
            .ok_or_else(|| format_err!("could not parse the Julia constant"))?;
        Mode::Julia(c)
    } else {
        Mode::Mandelbrot
    };

    let spec = PlaneSpec::from_region(lower_left, upper_right, resolution, mode)?;
    let engine = Engine::new(threads);

    let started = Instant::now();
    let mut plane = Plane::new(&spec, threads);
    info!(
        "initialized {} points in {} ms",
        plane.len(),
        started.elapsed().as_millis()
    );

    if frame_iterations > 0 {
        let started = Instant::now();
        let file = File::create(output)?;
        render::write_gif(
            file,
            &mut plane,
            &engine,
            &colors,
            &GifOptions {
                iterations_per_frame: frame_iterations,
                max_iterations: iterations,
                delay: gif_delay,
            },
        )?;
        info!(
            "{} workers wrote {} in {} ms",
            threads,
            output,
            started.elapsed().as_millis()
        );
    } else {
        let started = Instant::now();
        let live = engine.advance(&mut plane, iterations);
        info!(
            "{} workers completed {} iterations on {} points in {} ms ({} still live)",
            threads,
            iterations,
            plane.len(),
            started.elapsed().as_millis(),
            live
        );

        let started = Instant::now();
        render::write_png(output, &plane, &colors)?;
        info!("wrote {} in {} ms", output, started.elapsed().as_millis());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run(&args()) {
        eprintln!("escape: {}", e);
        std::process::exit(1);
    }
}
