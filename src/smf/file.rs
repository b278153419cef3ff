use crate::codec::skip_bytes;
use crate::error::{Error, Result};
use crate::model::track::Track;
use crate::smf::chunk::{TRACK_ID, read_chunk_header, read_track_body, write_track};
use crate::smf::header::{Header, MAX_TRACKS};
use log::{debug, warn};
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// A Standard MIDI File: its header and up to [`MAX_TRACKS`] tracks.
///
/// The path is only used by [`File::read`] and [`File::write`]; the stream-level
/// [`File::read_from`] and [`File::write_to`] work on any reader or writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
    header: Header,
    tracks: Vec<Track>,
}

impl File {
    /// Loads the file at `path` on a best-effort basis.
    ///
    /// A missing or malformed file is not an error here: it yields an empty sequence with a
    /// default header, so callers can treat it as a new song.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let mut file = File::empty(path, 0);

        if let Err(err) = file.read() {
            warn!(
                "Could not load '{}', starting an empty sequence instead..! ({})",
                file.path.display(),
                err
            );
        }

        file
    }

    /// Loads the file at `path` for editing.
    ///
    /// Only a missing file yields an empty sequence. A file that exists but cannot be read back
    /// in full is an error, since writing it out again would lose whatever was not read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::empty(path, 0);

        match file.read() {
            Ok(()) => {}
            Err(Error::Io(err)) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "'{}' does not exist yet, starting an empty sequence",
                    file.path.display()
                );
                return Ok(file);
            }
            Err(err) => return Err(err),
        }

        let declared = file.header.track_count as usize;
        if file.tracks.len() < declared {
            return Err(Error::invalid(format!(
                "only {} of {} declared track(s) could be read",
                file.tracks.len(),
                declared
            )));
        }

        Ok(file)
    }

    /// A file with no tracks that has not been read from disk.
    pub fn empty<P: AsRef<Path>>(path: P, ticks_per_beat: i16) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header: Header {
                track_count: 0,
                ticks_per_beat,
            },
            tracks: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The header as last read, see [`File::sync_header`].
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// Appends a track and returns its index.
    pub fn push_track(&mut self, track: Track) -> Result<usize> {
        if self.tracks.len() >= MAX_TRACKS {
            return Err(Error::invalid(format!(
                "a file holds at most {} tracks",
                MAX_TRACKS
            )));
        }

        self.tracks.push(track);
        Ok(self.tracks.len() - 1)
    }

    pub fn set_ticks_per_beat(&mut self, ticks_per_beat: i16) {
        self.header.ticks_per_beat = ticks_per_beat;
    }

    /// Makes `header().track_count` agree with the tracks actually held.
    pub fn sync_header(&mut self) {
        self.header.track_count = self.tracks.len() as i16;
    }

    pub fn read(&mut self) -> Result<()> {
        let mut reader = BufReader::new(fs::File::open(&self.path)?);
        self.read_from(&mut reader)
    }

    /// Replaces the header and tracks with the contents of `stream`.
    ///
    /// Track chunks are read until the stream runs out. A track chunk that fails to decode ends
    /// reading without failing the call. On error the file is left untouched.
    pub fn read_from<R: Read>(&mut self, stream: &mut R) -> Result<()> {
        let header = Header::read_from(stream)?;
        let mut tracks: Vec<Track> = Vec::new();

        loop {
            let (id, length) = match read_chunk_header(stream) {
                Ok(chunk) => chunk,
                Err(Error::UnexpectedEndOfStream) => break,
                Err(err) => {
                    warn!("Stopped reading tracks at chunk {}: {}", tracks.len(), err);
                    break;
                }
            };

            if id != TRACK_ID {
                debug!(
                    "Skipping {} byte chunk {:?}",
                    length,
                    String::from_utf8_lossy(&id)
                );
                if let Err(err) = skip_bytes(u64::from(length), stream) {
                    warn!("Stopped reading tracks in an unknown chunk: {}", err);
                    break;
                }
                continue;
            }

            if tracks.len() >= MAX_TRACKS {
                return Err(Error::invalid(format!(
                    "found more than {} track chunks",
                    MAX_TRACKS
                )));
            }

            match read_track_body(stream, length) {
                Ok(track) => {
                    debug!("Track {}: {} event(s)", tracks.len(), track.count());
                    tracks.push(track);
                }
                Err(err) => {
                    warn!(
                        "Track {} could not be decoded, ignoring it and any following tracks..! ({})",
                        tracks.len(),
                        err
                    );
                    break;
                }
            }
        }

        if tracks.len() != header.track_count as usize {
            warn!(
                "Header declares {} track(s) but {} were read..!",
                header.track_count,
                tracks.len()
            );
        }

        self.header = header;
        self.tracks = tracks;

        Ok(())
    }

    /// Encodes the whole file before touching the path, so a rejected write leaves any existing
    /// file as it was.
    pub fn write(&self) -> Result<()> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;

        let mut writer = BufWriter::new(fs::File::create(&self.path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the header, with the track count taken from the tracks held, then every track.
    pub fn write_to<W: Write>(&self, stream: &mut W) -> Result<()> {
        self.check_track_count()?;

        let header = Header {
            track_count: self.tracks.len() as i16,
            ticks_per_beat: self.header.ticks_per_beat,
        };
        header.write_to(stream)?;

        for track in &self.tracks {
            write_track(track, stream)?;
        }

        Ok(())
    }

    fn check_track_count(&self) -> Result<()> {
        if self.tracks.len() > MAX_TRACKS {
            return Err(Error::invalid(format!(
                "cannot write {} tracks, at most {} are allowed",
                self.tracks.len(),
                MAX_TRACKS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::event::{Event, Note, TrackEvent};
    use crate::model::track::EventRange;
    use std::io::Cursor;

    fn note_track(pitches: &[u8]) -> Track {
        let mut track = Track::new();
        for (n, &pitch) in pitches.iter().enumerate() {
            let ticks = n as i32 * 120;
            let note = Note::new(0, pitch, 100);
            track.insert(TrackEvent::new(ticks, Event::NoteOn(note))).unwrap();
            track
                .insert(TrackEvent::new(ticks + 60, Event::NoteOff(note)))
                .unwrap();
        }
        track
    }

    fn to_bytes(file: &File) -> Vec<u8> {
        let mut out = Vec::new();
        file.write_to(&mut out).unwrap();
        out
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<File> {
        let mut file = File::empty("memory.mid", 0);
        file.read_from(&mut Cursor::new(bytes))?;
        Ok(file)
    }

    #[test]
    fn header_round_trip() {
        env_logger::try_init().unwrap_or(());

        let mut file = File::empty("memory.mid", 480);
        file.push_track(note_track(&[60, 62])).unwrap();
        file.push_track(note_track(&[48])).unwrap();

        let back = from_bytes(to_bytes(&file)).unwrap();
        assert_eq!(
            *back.header(),
            Header {
                track_count: 2,
                ticks_per_beat: 480
            }
        );
        assert_eq!(back.tracks(), file.tracks());
    }

    #[test]
    fn single_track_writes_format_0() {
        let mut file = File::empty("memory.mid", 96);
        file.push_track(Track::new()).unwrap();
        let bytes = to_bytes(&file);
        assert_eq!(&bytes[8..10], &[0, 0]);
        assert_eq!(&bytes[10..12], &[0, 1]);
    }

    #[test]
    fn header_count_follows_tracks() {
        let mut file = File::empty("memory.mid", 480);
        file.push_track(Track::new()).unwrap();
        file.push_track(Track::new()).unwrap();
        file.push_track(Track::new()).unwrap();
        assert_eq!(file.header().track_count, 0);

        let back = from_bytes(to_bytes(&file)).unwrap();
        assert_eq!(back.header().track_count, 3);

        file.sync_header();
        assert_eq!(file.header().track_count, 3);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = to_bytes(&File::empty("memory.mid", 480));
        bytes[..4].copy_from_slice(b"XXXX");
        assert!(matches!(from_bytes(bytes), Err(Error::InvalidMidiFile(_))));
    }

    #[test]
    fn rejects_declared_33_tracks() {
        let mut bytes = to_bytes(&File::empty("memory.mid", 480));
        bytes[10..12].copy_from_slice(&33i16.to_be_bytes());
        assert!(matches!(from_bytes(bytes), Err(Error::InvalidMidiFile(_))));
    }

    #[test]
    fn rejects_33_actual_track_chunks() {
        let mut file = File::empty("memory.mid", 480);
        file.tracks = vec![Track::new(); MAX_TRACKS];
        let mut bytes = to_bytes(&file);
        write_track(&Track::new(), &mut bytes).unwrap();
        assert!(matches!(from_bytes(bytes), Err(Error::InvalidMidiFile(_))));
    }

    #[test]
    fn write_rejects_33_tracks() {
        let mut file = File::empty("memory.mid", 480);
        file.tracks = vec![Track::new(); MAX_TRACKS + 1];
        let result = file.write_to(&mut Vec::new());
        assert!(matches!(result, Err(Error::InvalidMidiFile(_))));
    }

    #[test]
    fn push_track_is_capped() {
        let mut file = File::empty("memory.mid", 480);
        for n in 0..MAX_TRACKS {
            assert_eq!(file.push_track(Track::new()).unwrap(), n);
        }
        assert!(matches!(
            file.push_track(Track::new()),
            Err(Error::InvalidMidiFile(_))
        ));
        assert_eq!(file.tracks().len(), MAX_TRACKS);
    }

    #[test]
    fn tolerates_track_count_mismatch() {
        env_logger::try_init().unwrap_or(());

        let mut file = File::empty("memory.mid", 480);
        file.push_track(note_track(&[60])).unwrap();
        file.push_track(note_track(&[61])).unwrap();
        let mut bytes = to_bytes(&file);
        bytes[10..12].copy_from_slice(&5i16.to_be_bytes());

        let back = from_bytes(bytes).unwrap();
        assert_eq!(back.header().track_count, 5);
        assert_eq!(back.tracks().len(), 2);
    }

    #[test]
    fn broken_track_ends_reading() {
        env_logger::try_init().unwrap_or(());

        let mut file = File::empty("memory.mid", 480);
        file.push_track(note_track(&[60])).unwrap();
        let mut bytes = to_bytes(&file);

        // A chunk whose first event is a data byte with no running status.
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 60, 100]);
        write_track(&note_track(&[72]), &mut bytes).unwrap();

        let back = from_bytes(bytes).unwrap();
        assert_eq!(back.tracks().len(), 1);
        assert_eq!(back.track(0), file.track(0));
    }

    #[test]
    fn skips_unknown_chunks() {
        let mut file = File::empty("memory.mid", 480);
        file.push_track(note_track(&[60])).unwrap();
        let mut bytes = to_bytes(&file);

        let mut with_alien = bytes[..14].to_vec();
        with_alien.extend_from_slice(b"XFIH");
        with_alien.extend_from_slice(&2u32.to_be_bytes());
        with_alien.extend_from_slice(&[1, 2]);
        with_alien.extend_from_slice(&bytes.split_off(14));

        let back = from_bytes(with_alien).unwrap();
        assert_eq!(back.tracks(), file.tracks());
    }

    #[test]
    fn failed_read_leaves_file_untouched() {
        let mut file = File::empty("memory.mid", 480);
        file.push_track(note_track(&[60])).unwrap();
        let before = file.clone();

        let result = file.read_from(&mut Cursor::new(b"XXXX".to_vec()));
        assert!(result.is_err());
        assert_eq!(file, before);
    }

    #[test]
    fn missing_file_loads_empty() {
        env_logger::try_init().unwrap_or(());

        let file = File::new("./this/path/does/not/exist.mid");
        assert_eq!(*file.header(), Header::default());
        assert!(file.tracks().is_empty());
        assert_eq!(file.path(), Path::new("./this/path/does/not/exist.mid"));
    }

    #[test]
    fn track_events_survive_round_trip() {
        let mut file = File::empty("memory.mid", 480);
        let index = file.push_track(Track::new()).unwrap();
        let track = file.track_mut(index).unwrap();
        let note = Note::new(9, 36, 127);
        track.insert(TrackEvent::new(0, Event::NoteOn(note))).unwrap();
        track.insert(TrackEvent::new(0, Event::PortsUpdated)).unwrap();
        track.insert(TrackEvent::new(30, Event::NoteOff(note))).unwrap();

        let back = from_bytes(to_bytes(&file)).unwrap();
        let events = back.track(0).unwrap().events(EventRange::All);
        assert_eq!(
            events,
            &[
                TrackEvent::new(0, Event::NoteOn(note)),
                TrackEvent::new(30, Event::NoteOff(note)),
            ]
        );
    }
}
