use crate::codec::{read_big_endian, read_bytes, write_big_endian};
use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

pub const HEADER_ID: [u8; 4] = *b"MThd";
pub const HEADER_SIZE: i32 = 6;

/// Standard MIDI Files can hold more, but nothing here ever needs to.
pub const MAX_TRACKS: usize = 32;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub track_count: i16,
    /// Also known as the file's resolution.
    pub ticks_per_beat: i16,
}

impl Header {
    /// Format 0 holds a single track, everything else is written as format 1.
    pub fn format(&self) -> i16 {
        if self.track_count == 1 { 0 } else { 1 }
    }

    /// Ticks per quarter note, or `None` when the division is unset (0) or SMPTE (negative).
    pub fn metrical_ticks_per_beat(&self) -> Option<i32> {
        (self.ticks_per_beat > 0).then(|| i32::from(self.ticks_per_beat))
    }

    pub fn read_from<R: Read>(stream: &mut R) -> Result<Self> {
        let id = read_bytes::<4, _>(stream)?;
        if id != HEADER_ID {
            return Err(Error::invalid(format!(
                "expected header chunk 'MThd', found {:?}",
                String::from_utf8_lossy(&id)
            )));
        }

        let size: i32 = read_big_endian(stream)?;
        if size != HEADER_SIZE {
            return Err(Error::invalid(format!(
                "header chunk size must be {}, found {}",
                HEADER_SIZE, size
            )));
        }

        let format: i16 = read_big_endian(stream)?;
        match format {
            0 | 1 => {}
            2 => return Err(Error::invalid("format 2 (independent tracks) is not supported")),
            other => return Err(Error::invalid(format!("unknown format {}", other))),
        }

        let track_count: i16 = read_big_endian(stream)?;
        if track_count < 0 || track_count as usize > MAX_TRACKS {
            return Err(Error::invalid(format!(
                "track count {} is outside 0..={}",
                track_count, MAX_TRACKS
            )));
        }

        let ticks_per_beat: i16 = read_big_endian(stream)?;

        debug!(
            "MIDI header: format {}, {} track(s), {} ticks per beat",
            format, track_count, ticks_per_beat
        );

        Ok(Header {
            track_count,
            ticks_per_beat,
        })
    }

    pub fn write_to<W: Write>(&self, stream: &mut W) -> Result<()> {
        stream.write_all(&HEADER_ID)?;
        write_big_endian(HEADER_SIZE, stream)?;
        write_big_endian(self.format(), stream)?;
        write_big_endian(self.track_count, stream)?;
        write_big_endian(self.ticks_per_beat, stream)?;
        Ok(())
    }
}
