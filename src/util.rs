use crate::model::event::Event;
use crate::model::track::EventRange;
use log::info;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Turns the optional `--at`/`--start`/`--end` arguments into a range query.
/// An open start or end extends to the beginning or end of the track.
pub fn parse_range(at: Option<i32>, start: Option<i32>, end: Option<i32>) -> EventRange {
    match (at, start, end) {
        (Some(ticks), _, _) => EventRange::AtTicks(ticks),
        (None, None, None) => EventRange::All,
        (None, start, end) => {
            let start = start.unwrap_or(0);
            let end = end.unwrap_or(i32::MAX);
            if start >= end {
                info!(
                    "Range [{}, {}) is empty, nothing will be listed..!",
                    start, end
                );
            }
            EventRange::TickRange { start, end }
        }
    }
}

/// Scientific pitch name, with MIDI 60 as C4.
pub fn note_name(pitch: u8) -> String {
    let octave = i32::from(pitch / 12) - 1;
    format!("{}{}", NOTE_NAMES[usize::from(pitch % 12)], octave)
}

pub fn describe(event: &Event) -> String {
    match event {
        Event::PortsUpdated => String::from("ports updated"),
        Event::NoteOn(note) => format!(
            "note on  {:<4} ({:>3}) vel {:>3} port {}",
            note_name(note.pitch),
            note.pitch,
            note.velocity,
            note.port
        ),
        Event::NoteOff(note) => format!(
            "note off {:<4} ({:>3}) vel {:>3} port {}",
            note_name(note.pitch),
            note.pitch,
            note.velocity,
            note.port
        ),
    }
}
