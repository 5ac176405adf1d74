use std::fs;
use std::path::PathBuf;
use std::process::exit;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{debug, info};

use qcsynth::ast::Pgm;
use qcsynth::parser;
use qcsynth::search::{self, SearchOptions};
use qcsynth::spec::Spec;

/// Synthesize a quantum-circuit-generating program from a statevector
/// specification.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Specification file
    #[arg(value_name = "SPEC")]
    specification: PathBuf,
    /// Load and print the specification, then exit
    #[arg(short, long)]
    dry_run: bool,
    /// Seed the search with a partial sketch instead of an empty program
    #[arg(short, long, value_name = "FILE")]
    sketch: Option<PathBuf>,
    /// Wall-clock budget in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,
}

fn main() {
    colog::init();
    let args = Args::parse();

    debug!("specification file: {}", args.specification.display());
    let spec = match Spec::from_file(&args.specification) {
        Ok(spec) => spec,
        Err(err) => {
            eprintln!("error: {err}");
            exit(2);
        }
    };
    info!("specification loaded: {spec}");

    if args.dry_run {
        return;
    }

    let seed = match &args.sketch {
        None => Pgm::empty("n"),
        Some(path) => {
            let source = match fs::read_to_string(path) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("error: failed to read sketch file: {err}");
                    exit(2);
                }
            };
            match parser::parse(&source) {
                Ok(pgm) => pgm,
                Err(err) => {
                    eprintln!("error: {err}");
                    exit(2);
                }
            }
        }
    };
    info!("seed sketch:\n{seed}");

    let options = SearchOptions {
        timeout: args.timeout.map(Duration::from_secs),
        ..Default::default()
    };
    let start = Instant::now();
    match search::synthesize_from(&spec, seed, &options) {
        Ok(pgm) => {
            println!("{pgm}");
            println!("synthesized in {:.2?}", start.elapsed());
        }
        Err(err) => {
            eprintln!("error: {err}");
            exit(1);
        }
    }
}
