// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: split a floor description into rooms (JSON output)
//!
//! Usage:
//!   extract-rooms <floor.json> [--strategy skeleton|divide|multi|many|default] [--output out.json]
//!
//! Thresholds come from `PLANKIT_*` environment variables; log verbosity
//! from `RUST_LOG`.

use plankit_room::{ExtractorConfig, ExtractorPhase, FloorInput, RoomExtractor, Strategy};
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let floor_path = &args[1];

    // Parse options
    let mut strategy = Strategy::Default;
    let mut output_path: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--strategy" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    fail("--strategy needs a value");
                };
                strategy = value.parse().unwrap_or_else(|e: String| fail(&e));
            }
            "--output" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    fail("--output needs a value");
                };
                output_path = Some(value.clone());
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let json = fs::read_to_string(floor_path)
        .unwrap_or_else(|e| fail(&format!("Cannot read '{}': {}", floor_path, e)));
    let floor = FloorInput::from_json(&json)
        .unwrap_or_else(|e| fail(&format!("Cannot parse '{}': {}", floor_path, e)));

    let config = ExtractorConfig::from_env();
    tracing::info!(floor = %floor.id, %strategy, "extracting rooms");

    let mut extractor = RoomExtractor::new(config);
    extractor.supply(floor);
    let rooms = extractor.extract(strategy);

    if extractor.phase() == ExtractorPhase::Failed {
        fail(extractor.last_error().unwrap_or("extraction failed"));
    }

    for room in &rooms {
        tracing::info!(
            room = %room.id,
            area = format_args!("{:.2}", room.area),
            openings = room.openings.len(),
            contents = room.contents.len(),
            "room"
        );
    }

    let out = serde_json::to_string_pretty(&rooms)
        .unwrap_or_else(|e| fail(&format!("Cannot serialize results: {}", e)));

    match output_path {
        Some(path) => {
            fs::write(&path, out).unwrap_or_else(|e| fail(&format!("Cannot write '{}': {}", path, e)));
            tracing::info!(path = %path, rooms = rooms.len(), "results written");
        }
        None => println!("{}", out),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn print_usage() {
    eprintln!("Usage: extract-rooms <floor.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --strategy <name>   skeleton, divide, multi, many or default (default: default)");
    eprintln!("  --output <path>     Write JSON here instead of stdout");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG            Log filter (default: info)");
    eprintln!("  PLANKIT_*           Extraction thresholds, e.g. PLANKIT_MIN_ROOM_AREA=0.5");
}
