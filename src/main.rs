use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info, warn};
use midiseq::{
    Args, Command, DEFAULT_TICKS_PER_BEAT, Event, File, Note, Track, TrackEvent, describe,
    note_name, parse_range,
};
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match args.command {
        Command::Info => show_info(&args.midi),
        Command::Events {
            track,
            at,
            start,
            end,
            json,
        } => list_events(&args.midi, track, at, start, end, json),
        Command::AddNote {
            track,
            ticks,
            pitch,
            velocity,
            length,
            port,
        } => add_note(&args.midi, track, ticks, Note::new(port, pitch, velocity), length),
        Command::RemoveNote {
            track,
            ticks,
            pitch,
            velocity,
            port,
            off,
        } => {
            let event = if off {
                Event::NoteOff(Note::new(port, pitch, velocity.unwrap_or(0)))
            } else {
                Event::NoteOn(Note::new(port, pitch, velocity.unwrap_or(100)))
            };
            remove_note(&args.midi, track, TrackEvent::new(ticks, event))
        }
        Command::New {
            ticks_per_beat,
            tracks,
        } => new_file(&args.midi, ticks_per_beat, tracks),
    }
}

fn show_info(path: &Path) -> Result<()> {
    let file = File::new(path);
    let header = file.header();

    println!("{}", file.path().display());
    println!(
        "format {}, {} ticks per beat, {} track(s) declared, {} read",
        header.format(),
        header.ticks_per_beat,
        header.track_count,
        file.tracks().len()
    );
    for (n, track) in file.tracks().iter().enumerate() {
        println!("  track {:>2}: {} event(s)", n, track.count());
    }

    Ok(())
}

fn list_events(
    path: &Path,
    track_index: usize,
    at: Option<i32>,
    start: Option<i32>,
    end: Option<i32>,
    json: bool,
) -> Result<()> {
    let file = File::new(path);
    let Some(track) = file.track(track_index) else {
        bail!(
            "Track {} does not exist, '{}' has {} track(s)..!",
            track_index,
            path.display(),
            file.tracks().len()
        );
    };

    let range = parse_range(at, start, end);
    let events = track.events(range);
    debug!("{:?} matched {} event(s)", range, events.len());

    if json {
        println!("{}", serde_json::to_string_pretty(events)?);
    } else {
        for track_event in events {
            println!("{:>10}  {}", track_event.ticks, describe(&track_event.event));
        }
    }

    Ok(())
}

fn add_note(
    path: &Path,
    track_index: usize,
    ticks: i32,
    note: Note,
    length: Option<i32>,
) -> Result<()> {
    if note.pitch > 127 || note.velocity > 127 {
        bail!("Pitch and velocity must be within 0..=127..!");
    }

    let mut file = File::load(path)
        .with_context(|| format!("Refusing to edit '{}'", path.display()))?;
    if file.header().ticks_per_beat == 0 {
        file.set_ticks_per_beat(DEFAULT_TICKS_PER_BEAT);
    }

    let beat = file
        .header()
        .metrical_ticks_per_beat()
        .unwrap_or(i32::from(DEFAULT_TICKS_PER_BEAT));
    let length = length.unwrap_or(beat);
    if length < 0 {
        bail!("Note length must not be negative..!");
    }
    let end = ticks
        .checked_add(length)
        .context("Note end does not fit in a tick value..!")?;

    while file.tracks().len() <= track_index {
        file.push_track(Track::new())
            .with_context(|| format!("Cannot create track {}", track_index))?;
    }
    let track = file
        .track_mut(track_index)
        .context("Track disappeared while adding a note..!")?;

    let release = Note::new(note.port, note.pitch, 0);
    track.insert(TrackEvent::new(ticks, Event::NoteOn(note)))?;
    track.insert(TrackEvent::new(end, Event::NoteOff(release)))?;

    file.sync_header();
    file.write()
        .with_context(|| format!("Failed to write '{}'", path.display()))?;

    info!(
        "Added {} at [{}, {}) to track {}..!",
        note_name(note.pitch),
        ticks,
        end,
        track_index
    );

    Ok(())
}

fn remove_note(path: &Path, track_index: usize, target: TrackEvent) -> Result<()> {
    let mut file = File::load(path)
        .with_context(|| format!("Refusing to edit '{}'", path.display()))?;
    let Some(track) = file.track_mut(track_index) else {
        bail!("Track {} does not exist..!", track_index);
    };

    if !track.erase(&target) {
        warn!(
            "No {} at tick {} in track {}, nothing removed..!",
            describe(&target.event),
            target.ticks,
            track_index
        );
        return Ok(());
    }

    file.sync_header();
    file.write()
        .with_context(|| format!("Failed to write '{}'", path.display()))?;

    info!(
        "Removed {} at tick {} from track {}..!",
        describe(&target.event),
        target.ticks,
        track_index
    );

    Ok(())
}

fn new_file(path: &Path, ticks_per_beat: i16, tracks: usize) -> Result<()> {
    if ticks_per_beat <= 0 {
        bail!("Ticks per beat must be positive..!");
    }

    let mut file = File::empty(path, ticks_per_beat);
    for _ in 0..tracks {
        file.push_track(Track::new())?;
    }
    file.sync_header();
    file.write()
        .with_context(|| format!("Failed to write '{}'", path.display()))?;

    info!(
        "Created '{}' with {} empty track(s)..!",
        path.display(),
        tracks
    );

    Ok(())
}
