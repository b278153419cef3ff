use serde::{Deserialize, Serialize};

/// A single key on a single port.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub port: u8,
    /// 0..=127
    pub pitch: u8,
    /// 0..=127, attack velocity for note-on and release velocity for note-off.
    pub velocity: u8,
}

impl Note {
    pub fn new(port: u8, pitch: u8, velocity: u8) -> Self {
        Self {
            port,
            pitch,
            velocity,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// MIDI devices were plugged in or removed. Only meaningful at runtime, never written to a file.
    PortsUpdated,
    NoteOn(Note),
    NoteOff(Note),
}

impl Event {
    pub fn note(&self) -> Option<&Note> {
        match self {
            Event::NoteOn(note) | Event::NoteOff(note) => Some(note),
            Event::PortsUpdated => None,
        }
    }
}

/// An event placed at an absolute tick position, counted from the start of its track.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackEvent {
    pub ticks: i32,
    pub event: Event,
}

impl TrackEvent {
    pub fn new(ticks: i32, event: Event) -> Self {
        Self { ticks, event }
    }
}
