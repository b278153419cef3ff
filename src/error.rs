use thiserror::Error;

/// Everything that can go wrong while editing a track or moving a file through its byte stream.
#[derive(Error, Debug)]
pub enum Error {
    /// The byte stream is not a Standard MIDI File this crate can load or produce.
    #[error("Invalid MIDI file: {0}")]
    InvalidMidiFile(String),

    /// Tick values at or above `i32::MAX` are reserved.
    #[error("Tick value {ticks} is too close to overflow..!")]
    CloseToOverflow { ticks: i32 },

    #[error("Tick value {0} is negative..!")]
    NegativeTicks(i32),

    /// A variable-length quantity did not terminate within the byte budget of its integer type.
    #[error("Invalid variable-length quantity..!")]
    InvalidVariableCount,

    #[error("Unexpected end of stream..!")]
    UnexpectedEndOfStream,

    /// Ports are written as MIDI channels, so only 0..=15 survive encoding.
    #[error("Port {0} cannot be encoded as a MIDI channel..!")]
    PortOutOfRange(u8),

    /// Pitch and velocity are MIDI data bytes and must fit in 7 bits.
    #[error("Value {0} does not fit a 7-bit MIDI data byte..!")]
    DataOutOfRange(u8),

    #[error(transparent)]
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::UnexpectedEndOfStream,
            _ => Error::Io(err),
        }
    }
}

impl Error {
    pub(crate) fn invalid<S: Into<String>>(reason: S) -> Self {
        Error::InvalidMidiFile(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
