//! `gvsim` demo binary: loads a config document (if given), wires up the
//! `Simulator` facade against its built-in demo bus, loads a flat binary
//! image into guest RAM, and runs it to completion.
//!
//! A thin analogue of `engine/src/main.cpp` — a convenience wrapper, not
//! part of the execution core's own contract (spec §1).

use std::path::PathBuf;
use std::process;

use gvsim_sim::{Configuration, Simulator, DEFAULT_ENTRY_PC};

struct CliArgs {
    config_path: Option<PathBuf>,
    image_path: Option<PathBuf>,
    deadline: Option<u64>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        image_path: None,
        deadline: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                cli.config_path = args.get(i).map(PathBuf::from);
            }
            "--image" => {
                i += 1;
                cli.image_path = args.get(i).map(PathBuf::from);
            }
            "--step-until" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.deadline = s.parse().ok();
                }
            }
            "--help" | "-h" => {
                eprintln!("Usage: gvsim [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --config <file>       JSON configuration document");
                eprintln!("  --image <file>        Flat binary image loaded at the entry PC");
                eprintln!("  --step-until <ps>     Advance to a fixed deadline instead of running to exit");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();

    let config = match cli.config_path {
        Some(path) => match Configuration::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("gvsim: {err}");
                process::exit(-1);
            }
        },
        None => Configuration::default(),
    };

    let mut sim = match Simulator::open(config) {
        Ok(sim) => sim,
        Err(code) => {
            eprintln!("gvsim: failed to open the component graph");
            process::exit(code);
        }
    };

    if let Some(image_path) = cli.image_path {
        let image = match std::fs::read(&image_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                eprintln!("gvsim: could not read {}: {err}", image_path.display());
                process::exit(-1);
            }
        };
        let base = DEFAULT_ENTRY_PC as usize;
        let mut bus = sim.bus().borrow_mut();
        bus.ram_mut()[base..base + image.len()].copy_from_slice(&image);
    }

    sim.start();
    let code = match cli.deadline {
        Some(deadline) => {
            sim.step_until(deadline);
            0
        }
        None => sim.join(),
    };
    sim.close();
    process::exit(code);
}
