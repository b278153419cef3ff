//! `MTrk` chunks: framing plus the delta-time/status-byte event stream inside them.

use crate::codec::{
    read_big_endian, read_bytes, read_variable_count, skip_bytes, write_big_endian,
    write_variable_count,
};
use crate::error::{Error, Result};
use crate::model::event::{Event, Note, TrackEvent};
use crate::model::track::Track;
use log::debug;
use std::io::{Cursor, Read, Write};

pub const TRACK_ID: [u8; 4] = *b"MTrk";

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const SYSEX: u8 = 0xF0;
const SYSEX_ESCAPE: u8 = 0xF7;
const META: u8 = 0xFF;
const META_END_OF_TRACK: u8 = 0x2F;

/// Reads a chunk's 4-byte ID and the byte length of its body.
pub fn read_chunk_header<R: Read>(stream: &mut R) -> Result<([u8; 4], u32)> {
    let id = read_bytes::<4, _>(stream)?;
    let length: u32 = read_big_endian(stream)?;
    Ok((id, length))
}

/// Reads the `length`-byte body of an `MTrk` chunk and decodes it into a track.
pub fn read_track_body<R: Read>(stream: &mut R, length: u32) -> Result<Track> {
    let mut body = Vec::new();
    stream.by_ref().take(u64::from(length)).read_to_end(&mut body)?;
    if body.len() < length as usize {
        return Err(Error::UnexpectedEndOfStream);
    }

    decode_events(&body)
}

pub fn write_track<W: Write>(track: &Track, stream: &mut W) -> Result<()> {
    let body = encode_events(track)?;
    let length = u32::try_from(body.len())
        .map_err(|_| Error::invalid("track chunk does not fit a 32-bit length"))?;

    stream.write_all(&TRACK_ID)?;
    write_big_endian(length, stream)?;
    stream.write_all(&body)?;
    Ok(())
}

/// Number of data bytes following a channel status byte.
fn data_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        _ => 2,
    }
}

fn read_data_byte(stream: &mut Cursor<&[u8]>) -> Result<u8> {
    let [byte] = read_bytes::<1, _>(stream)?;
    if byte & 0x80 != 0 {
        return Err(Error::invalid(format!(
            "expected a data byte, found status 0x{:02X}",
            byte
        )));
    }
    Ok(byte)
}

fn decode_events(body: &[u8]) -> Result<Track> {
    let mut stream = Cursor::new(body);
    let mut track = Track::new();
    let mut absolute: i64 = 0;
    let mut running_status: Option<u8> = None;
    let mut skipped = 0usize;
    let mut ended = false;

    while (stream.position() as usize) < body.len() {
        let delta: u32 = read_variable_count(&mut stream)?;
        absolute += i64::from(delta);
        let ticks = i32::try_from(absolute)
            .map_err(|_| Error::CloseToOverflow { ticks: i32::MAX })?;

        let [first] = read_bytes::<1, _>(&mut stream)?;
        let (status, pending_data) = if first & 0x80 != 0 {
            (first, None)
        } else {
            match running_status {
                Some(status) => (status, Some(first)),
                None => {
                    return Err(Error::invalid(format!(
                        "data byte 0x{:02X} at tick {} without a running status",
                        first, ticks
                    )));
                }
            }
        };

        match status {
            META => {
                running_status = None;
                let [kind] = read_bytes::<1, _>(&mut stream)?;
                let length: u32 = read_variable_count(&mut stream)?;
                skip_bytes(u64::from(length), &mut stream)?;
                if kind == META_END_OF_TRACK {
                    ended = true;
                    break;
                }
                skipped += 1;
            }
            SYSEX | SYSEX_ESCAPE => {
                running_status = None;
                let length: u32 = read_variable_count(&mut stream)?;
                skip_bytes(u64::from(length), &mut stream)?;
                skipped += 1;
            }
            0x80..=0xEF => {
                running_status = Some(status);
                let first_data = match pending_data {
                    Some(byte) => byte,
                    None => read_data_byte(&mut stream)?,
                };
                let second_data = if data_len(status) == 2 {
                    read_data_byte(&mut stream)?
                } else {
                    0
                };

                let note = Note::new(status & 0x0F, first_data, second_data);
                let event = match status & 0xF0 {
                    NOTE_ON if second_data == 0 => Some(Event::NoteOff(note)),
                    NOTE_ON => Some(Event::NoteOn(note)),
                    NOTE_OFF => Some(Event::NoteOff(note)),
                    _ => None,
                };

                match event {
                    Some(event) => track.insert(TrackEvent::new(ticks, event))?,
                    None => skipped += 1,
                }
            }
            other => {
                return Err(Error::invalid(format!(
                    "unexpected status 0x{:02X} at tick {}",
                    other, ticks
                )));
            }
        }
    }

    if !ended {
        debug!("Track chunk ended without an End of Track event");
    } else if (stream.position() as usize) < body.len() {
        debug!(
            "Ignoring {} byte(s) after End of Track",
            body.len() - stream.position() as usize
        );
    }

    debug!(
        "Decoded {} note event(s), skipped {} other event(s)",
        track.count(),
        skipped
    );

    Ok(track)
}

fn encode_events(track: &Track) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut previous_ticks = 0;
    let mut running_status: Option<u8> = None;

    for track_event in track {
        let Some(&note) = track_event.event.note() else {
            continue;
        };
        let kind = match track_event.event {
            Event::NoteOn(_) => NOTE_ON,
            _ => NOTE_OFF,
        };

        if note.port > 0x0F {
            return Err(Error::PortOutOfRange(note.port));
        }
        for data in [note.pitch, note.velocity] {
            if data > 0x7F {
                return Err(Error::DataOutOfRange(data));
            }
        }
        let status = kind | note.port;

        // Ticks are sorted and non-negative, so the delta never goes below zero.
        let delta = u32::try_from(track_event.ticks - previous_ticks)
            .map_err(|_| Error::NegativeTicks(track_event.ticks - previous_ticks))?;
        write_variable_count(delta, &mut body)?;

        if running_status != Some(status) {
            body.push(status);
            running_status = Some(status);
        }
        body.push(note.pitch);
        body.push(note.velocity);

        previous_ticks = track_event.ticks;
    }

    write_variable_count(0u32, &mut body)?;
    body.extend_from_slice(&[META, META_END_OF_TRACK, 0x00]);

    Ok(body)
}
