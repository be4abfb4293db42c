// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Parameter Image Emitter

Builds one fixed-point parameter image per population in `neurokin.toml` and
writes it to `<output>/<population>.bin`.

Usage:
  cargo run --bin emit_param_image -- [--config <path>] [--output <dir>]
      [--timestep-us <n>] [--log-level <level>] [--describe] [--debug-<crate>]

With `--describe`, the section table of every image is printed to stdout as JSON.
*/

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};

use neurokin::config::{load_config, validate_config, LogFormat};
use neurokin::observability::{debug_flags_help, init_logging, parse_debug_flags, ConsoleFormat, LoggingSettings};
use neurokin::{build_population_images, write_population_images};

struct Args {
    config: Option<PathBuf>,
    overrides: HashMap<String, String>,
    describe: bool,
    log_dir: Option<PathBuf>,
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage: emit_param_image [--config <path>] [--output <dir>] [--timestep-us <n>]\n\
         \x20                       [--log-level <level>] [--log-dir <dir>] [--describe]\n\n\
         Defaults:\n\
         - config: NEUROKIN_CONFIG_PATH, else ./neurokin.toml or a parent directory\n\
         - output: [output] directory from the config\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(code);
}

fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        overrides: HashMap::new(),
        describe: false,
        log_dir: None,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next().unwrap_or_else(|| {
                eprintln!("Missing value for {name}");
                usage_and_exit(2)
            })
        };
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config"))),
            "--output" => {
                parsed
                    .overrides
                    .insert("output.directory".to_string(), value("--output"));
            }
            "--timestep-us" => {
                parsed
                    .overrides
                    .insert("simulation.timestep_us".to_string(), value("--timestep-us"));
            }
            "--log-level" => {
                parsed
                    .overrides
                    .insert("logging.level".to_string(), value("--log-level"));
            }
            "--log-dir" => parsed.log_dir = Some(PathBuf::from(value("--log-dir"))),
            "--describe" => parsed.describe = true,
            "-h" | "--help" => usage_and_exit(0),
            // collected separately by parse_debug_flags
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit(2);
            }
        }
    }

    parsed
}

fn main() -> Result<()> {
    let args = parse_args();

    let config = load_config(args.config.as_deref(), Some(&args.overrides)).context("Failed to load configuration")?;

    let settings = LoggingSettings {
        level: config.logging.level.clone(),
        format: match config.logging.format {
            LogFormat::Text => ConsoleFormat::Text,
            LogFormat::Json => ConsoleFormat::Json,
        },
        log_dir: args.log_dir.clone(),
        ..Default::default()
    };
    let _logging = init_logging(&parse_debug_flags(), &settings).context("Failed to initialize logging")?;

    validate_config(&config)?;
    if config.populations.is_empty() {
        tracing::warn!("Configuration declares no populations; nothing to emit");
        return Ok(());
    }

    let images = build_population_images(&config)?;
    let written = write_population_images(&images, &config.output.directory)?;

    for (built, path) in images.iter().zip(&written) {
        tracing::info!(
            population = %built.population,
            model = built.image.model_name(),
            bytes = built.image.len(),
            cpu_cycles = built.n_cpu_cycles,
            path = %path.display(),
            "emitted parameter image"
        );
    }

    if args.describe {
        let summaries = images
            .iter()
            .map(|built| {
                let sections: serde_json::Value = serde_json::from_str(&built.image.describe()?)?;
                Ok(serde_json::json!({
                    "population": built.population,
                    "n_neurons": built.n_neurons,
                    "max_atoms_per_core": built.max_atoms_per_core,
                    "n_cpu_cycles": built.n_cpu_cycles,
                    "bytes": built.image.len(),
                    "image": sections,
                }))
            })
            .collect::<serde_json::Result<Vec<_>>>()
            .context("Failed to describe images")?;
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }

    Ok(())
}
