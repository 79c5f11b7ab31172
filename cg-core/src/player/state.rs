use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// A line is being dispatched.
    Playing,
    /// Between lines, waiting on an interval or an explicit advance.
    Waiting,
    Paused,
    /// Like `Playing`, with auto-play on.
    AutoPlaying,
    /// The script ran out; cleanup back to `Idle` follows at once.
    Completed,
}

impl PlaybackState {
    /// The dispatching state for the given auto-play setting.
    pub fn dispatching(auto_play: bool) -> Self {
        if auto_play {
            PlaybackState::AutoPlaying
        } else {
            PlaybackState::Playing
        }
    }

    pub fn is_dispatching(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::AutoPlaying)
    }

    /// States a session passes through between `play()` and its end.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::Waiting | PlaybackState::Paused | PlaybackState::AutoPlaying
        )
    }
}
