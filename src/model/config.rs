use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_TICKS_PER_BEAT: i16 = 480;

#[derive(Parser, Debug)]
#[command(
    name = "midiseq",
    about = "Inspect and edit the note events of a Standard MIDI File."
)]
pub struct Args {
    /// Path to the target MIDI file. A missing or unreadable file is treated as an empty sequence.
    pub midi: PathBuf,

    /// Prints extra information to the terminal.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the header and how many events each track holds.
    Info,

    /// List the events of one track.
    Events {
        /// Zero-based track index.
        #[arg(short, long, default_value_t = 0)]
        track: usize,

        /// Only events at exactly this tick.
        #[arg(long, conflicts_with_all = ["start", "end"])]
        at: Option<i32>,

        /// First tick of the listed range (inclusive).
        #[arg(long)]
        start: Option<i32>,

        /// Last tick of the listed range (exclusive).
        #[arg(long)]
        end: Option<i32>,

        /// Print the events as JSON instead of one line per event.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Add a note-on and its matching note-off, creating tracks up to `--track` if needed.
    AddNote {
        #[arg(short, long, default_value_t = 0)]
        track: usize,

        #[arg(long)]
        ticks: i32,

        #[arg(short, long)]
        pitch: u8,

        #[arg(long, default_value_t = 100)]
        velocity: u8,

        /// Note length in ticks. Defaults to one beat.
        #[arg(short, long)]
        length: Option<i32>,

        /// Port, written to the file as the MIDI channel (0..=15).
        #[arg(long, default_value_t = 0)]
        port: u8,
    },

    /// Remove one matching note-on (or note-off with `--off`).
    RemoveNote {
        #[arg(short, long, default_value_t = 0)]
        track: usize,

        #[arg(long)]
        ticks: i32,

        #[arg(short, long)]
        pitch: u8,

        /// Defaults to 100 for note-on and 0 for note-off.
        #[arg(long)]
        velocity: Option<u8>,

        #[arg(long, default_value_t = 0)]
        port: u8,

        /// Match a note-off instead of a note-on.
        #[arg(long, default_value_t = false)]
        off: bool,
    },

    /// Write a fresh file with empty tracks, replacing whatever is at the path.
    New {
        #[arg(long, default_value_t = DEFAULT_TICKS_PER_BEAT)]
        ticks_per_beat: i16,

        #[arg(long, default_value_t = 1)]
        tracks: usize,
    },
}
