pub mod driver;
pub mod terminal;

use crate::event::PlayerEvent;
use crate::stage::StageSnapshot;

/// A host-side view of the player, fed one snapshot per frame.
pub trait Renderer {
    fn render(&mut self, snapshot: &StageSnapshot);

    fn notify(&mut self, _event: PlayerEvent) {}
}
