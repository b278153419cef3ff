pub mod chunk;
pub mod file;
pub mod header;

pub use file::File;
pub use header::{Header, MAX_TRACKS};
