//! # notetrack
//!
//! Command-line front end for `notetrack-core`: live tracking from an audio
//! input to a MIDI output, offline tracking of WAV files, and device listing.
//!
//! Logs go to stderr (`RUST_LOG`, or `-v`); note events go to stdout.

mod cli_args;
mod file;
mod live;
mod midi_out;
mod settings;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use notetrack_core::{audio, NoteDetector, NoteEvent};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use cli_args::{Cli, Commands};
use live::LiveSettings;
use midi_out::OutputTarget;
use settings::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Live {
            device,
            block_size,
            sample_rate,
            midi_port,
            virtual_port,
            duration,
        } => {
            config.apply_detector_overrides(block_size, sample_rate);

            let output = if virtual_port {
                OutputTarget::Virtual
            } else if let Some(port) = midi_port.or(config.midi_port) {
                OutputTarget::Port(port)
            } else if config.virtual_port {
                OutputTarget::Virtual
            } else {
                OutputTarget::Print
            };

            let duration = match duration {
                Some(secs) if !(secs.is_finite() && secs > 0.0) => {
                    bail!("--duration must be a positive number of seconds")
                }
                Some(secs) => Some(Duration::from_secs_f64(secs)),
                None => None,
            };

            live::run(&LiveSettings {
                detector: config.detector,
                device: device.or(config.device),
                output,
                duration,
            })
        }
        Commands::File {
            input,
            block_size,
            json,
            raw,
        } => {
            let audio = file::read_mono(&input)?;
            config.apply_detector_overrides(block_size, Some(audio.sample_rate));

            let mut detector = NoteDetector::new(config.detector)?;
            for timed in file::track(&mut detector, &audio.samples)? {
                let bytes = if raw { raw_bytes(&timed.event) } else { None };
                if json {
                    let mut value = serde_json::to_value(&timed)?;
                    if let Some(bytes) = bytes {
                        value["bytes"] = serde_json::json!(bytes);
                    }
                    println!("{}", value);
                } else {
                    let mut line = format!(
                        "{:>10.4}s  block {:>6}  {}",
                        timed.time,
                        timed.block,
                        midi_out::describe(&timed.event)
                    );
                    if let Some([status, note, velocity]) = bytes {
                        line.push_str(&format!("  [{:02x} {:02x} {:02x}]", status, note, velocity));
                    }
                    println!("{}", line);
                }
            }
            Ok(())
        }
        Commands::Devices => {
            println!("Audio input devices:");
            for name in audio::list_input_devices()? {
                println!("  {}", name);
            }
            println!("MIDI output ports:");
            for name in midi_out::list_output_ports()? {
                println!("  {}", name);
            }
            Ok(())
        }
    }
}

/// Encoded bytes of an event for `--raw` output, or `None` with a warning
/// when the note cannot be encoded.
fn raw_bytes(event: &NoteEvent) -> Option<[u8; 3]> {
    match event.to_midi() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("No MIDI bytes for {:?} event: {}", event.kind, e);
            None
        }
    }
}
