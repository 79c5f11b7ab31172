use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::error::Result;
use crate::player::Player;
use crate::renderer::Renderer;

/// Feeds `renderer` a snapshot every `frame` until `session` ends, then
/// renders once more and returns the session's result.
pub async fn drive<R: Renderer>(
    player: &Player,
    mut session: JoinHandle<Result<()>>,
    renderer: &mut R,
    frame: Duration,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = player.subscribe(move |ev| {
        let _ = tx.send(ev);
    });

    let mut frames = interval(frame.max(Duration::from_millis(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            res = &mut session => break res?,
            _ = frames.tick() => {
                while let Ok(ev) = rx.try_recv() {
                    renderer.notify(ev);
                }
                renderer.render(&player.snapshot());
            }
        }
    };

    while let Ok(ev) = rx.try_recv() {
        renderer.notify(ev);
    }
    renderer.render(&player.snapshot());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::Chapter;
    use crate::config::PlayerConfig;
    use crate::event::PlayerEvent;
    use crate::player::PlaybackState;
    use crate::stage::{StageLayout, StageSnapshot};
    use cg_script::{LineType, Script, StoryLine};

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        states: Vec<PlaybackState>,
        events: Vec<PlayerEvent>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, snapshot: &StageSnapshot) {
            self.frames += 1;
            if self.states.last() != Some(&snapshot.state) {
                self.states.push(snapshot.state);
            }
        }

        fn notify(&mut self, event: PlayerEvent) {
            self.events.push(event);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn renders_until_the_session_ends() {
        let layout = StageLayout::from_toml("[[scene]]\nname = \"a\"\nbackground = \"a.png\"\n").unwrap();
        let script = Script::new(vec![StoryLine::new(LineType::Scene)]);
        let player = Player::new(PlayerConfig::default(), "chapters");
        player.load_chapter(Chapter::from_parts("t", layout, script)).unwrap();

        let mut recorder = Recorder::default();
        let session = player.play().unwrap();
        drive(&player, session, &mut recorder, Duration::from_millis(50)).await.unwrap();

        assert!(recorder.frames > 10);
        assert_eq!(recorder.states.first(), Some(&PlaybackState::Playing));
        assert_eq!(recorder.states.last(), Some(&PlaybackState::Idle));
        assert_eq!(recorder.events, vec![PlayerEvent::PlayCompleted]);
    }
}
