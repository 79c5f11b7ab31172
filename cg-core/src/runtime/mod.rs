pub mod flags;
pub mod pacer;

pub use flags::PlaybackFlags;
pub use pacer::{Outcome, Pacer, Ticker};
