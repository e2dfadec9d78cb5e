//! # minilight
//!
//! A minimal, unbiased global illumination renderer: progressive Monte
//! Carlo path tracing with next-event emitter sampling over an octree
//! spatial index, writing a tone-mapped PPM snapshot as it converges.
//!
//! ## Architecture
//!
//! The renderer implements a unidirectional path tracer with:
//! - **Geometry**: triangle-only scenes, accelerated by an octree
//!   ([`minilight::spatial_index`]).
//! - **Shading**: Lambertian surfaces only ([`minilight::surface_point`]).
//! - **Integration**: next-event estimation plus Russian-roulette
//!   termination ([`minilight::raytracer`]).
//! - **Output**: one binary PPM snapshot per power-of-two iteration count,
//!   Ward tone-mapped ([`minilight::image`]).

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use minilight::error::MiniLightError;
use minilight::image::Image;
use minilight::model;
use minilight::rng::{Lfsr113, REFERENCE_SEED};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// minilight — a minimal unbiased global illumination renderer
#[derive(Parser, Debug)]
#[command(
    name = "minilight",
    version,
    about = "Progressive Monte Carlo path tracing with next-event estimation",
    long_about = "Renders a textual scene description via unbiased Monte Carlo \
                  path tracing, writing a tone-mapped PPM snapshot to \
                  <model-file>.ppm after every power-of-two iteration.",
    after_help = "EXAMPLES:\n  minilight scene.ml.txt"
)]
struct Cli {
    /// Path to the model file to render
    model_file: PathBuf,
}

/// `-?` is not a form clap recognizes on its own; treat it exactly like
/// `--help` before handing argv to the parser (spec §6: "`-?` or `--help`
/// prints help").
fn wants_help(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == "-?")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().collect();
    if wants_help(&argv) {
        Cli::command().print_help().ok();
        println!();
        std::process::exit(0);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            print!("{e}");
            std::process::exit(0);
        }
        // A missing model-file argument prints help rather than a bare
        // usage error (spec §6: "missing argument prints help").
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            Cli::command().print_help().ok();
            println!();
            std::process::exit(0);
        }
        Err(e) => e.exit(),
    };

    match run(&cli.model_file) {
        Ok(()) => {
            println!("\nfinished");
        }
        Err(e) => {
            let code = e.exit_code();
            if matches!(e, MiniLightError::Interrupted) {
                println!("\ninterrupted");
            } else {
                eprintln!("*** execution failed: {e}");
            }
            std::process::exit(code);
        }
    }
}

fn run(model_file: &PathBuf) -> Result<(), MiniLightError> {
    let text = fs::read_to_string(model_file).map_err(|source| MiniLightError::FileNotFound {
        path: model_file.clone(),
        source,
    })?;

    let model = model::parse(&text)?;

    tracing::info!(
        triangles = model.scene.triangles().len(),
        emitters = model.scene.emitters_count(),
        width = model.width,
        height = model.height,
        iterations = model.iterations,
        "scene loaded"
    );

    let mut image = Image::new(model.width, model.height);
    let mut rng = Lfsr113::new(REFERENCE_SEED);
    let out_path = output_path(model_file);

    for iteration in 1..=model.iterations {
        model.camera.get_frame(&model.scene, &mut rng, &mut image);

        print!("\riteration: {iteration}");
        std::io::stdout().flush().ok();

        if is_power_of_two(iteration) || iteration == model.iterations {
            save_snapshot(&image, iteration, &out_path)?;
        }
    }

    Ok(())
}

fn output_path(model_file: &PathBuf) -> PathBuf {
    let mut path = model_file.clone().into_os_string();
    path.push(".ppm");
    PathBuf::from(path)
}

fn is_power_of_two(n: u32) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

fn save_snapshot(image: &Image, iteration: u32, path: &PathBuf) -> Result<(), MiniLightError> {
    let mut file =
        fs::File::create(path).map_err(|e| MiniLightError::Internal(format!("{e}")))?;
    image
        .write_ppm(&mut file, iteration)
        .map_err(|e| MiniLightError::Internal(format!("{e}")))
}
