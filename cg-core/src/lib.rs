pub mod config;
pub mod error;
pub mod event;
pub mod runtime;
pub mod element;
pub mod animator;
pub mod dialog;
pub mod stage;
pub mod chapter;
pub mod player;
pub mod renderer;

pub use cg_script::{Language, LineType, Script, StoryLine};
pub use chapter::Chapter;
pub use error::{CgError, Result};
pub use event::{EventHub, PlayerEvent, Subscription};
pub use player::{PlaybackState, Player};
pub use stage::{StageLayout, StageSnapshot};
