mod codec;
mod error;
mod model;
mod smf;
mod util;

pub use codec::*;
pub use error::*;
pub use model::config::*;
pub use model::event::*;
pub use model::track::*;
pub use smf::*;
pub use util::*;
