//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// notetrack - monophonic pitch to MIDI note tracker
#[derive(Parser)]
#[command(name = "notetrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Raise log verbosity (-v for debug, -vv for trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON config file with detector and device settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Track notes from an audio input device and send them to a MIDI output
    Live {
        /// Substring of the input device name (default input device if omitted)
        #[arg(short, long)]
        device: Option<String>,

        /// Samples per analysis block (power of two)
        #[arg(short, long)]
        block_size: Option<usize>,

        /// Sample rate to request from the device, in Hz
        #[arg(short, long)]
        sample_rate: Option<u32>,

        /// Substring of an existing MIDI output port to connect to
        #[arg(short, long, conflicts_with = "virtual_port")]
        midi_port: Option<String>,

        /// Create a virtual MIDI output port instead (Unix only)
        #[arg(long)]
        virtual_port: bool,

        /// Stop after this many seconds (default: until Enter or end of stdin)
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Track notes in a WAV file and print the resulting events
    File {
        /// Path to the WAV file
        input: PathBuf,

        /// Samples per analysis block (power of two)
        #[arg(short, long)]
        block_size: Option<usize>,

        /// Print one JSON object per event
        #[arg(long)]
        json: bool,

        /// Include the encoded MIDI bytes of each event
        #[arg(long)]
        raw: bool,
    },

    /// List audio input devices and MIDI output ports
    Devices,
}
