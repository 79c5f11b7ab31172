use std::sync::atomic::Ordering;
use std::sync::Arc;

use cg_script::{Script, StoryLine};

use crate::error::Result;
use crate::event::PlayerEvent;
use crate::player::dispatch::Progress;
use crate::player::{Inner, PlaybackState};
use crate::runtime::{Outcome, Pacer};
use crate::stage::Stage;

/// The task behind one `play()` call.
pub(super) struct Runner {
    pub inner: Arc<Inner>,
    pub stage: Arc<Stage>,
    pub pacer: Pacer,
    pub generation: u64,
}

impl Runner {
    pub async fn run(self, script: Script) -> Result<()> {
        let _stage_guard = self.inner.stage_lock.clone().lock_owned().await;
        if self.pacer.is_cancelled() {
            return Ok(());
        }
        self.stage.reset();
        self.inner.dispatched.store(0, Ordering::Release);

        let mut cursor = script.cursor();
        let mut progress = Progress::default();

        while let Some(line) = cursor.next() {
            if self.pacer.is_cancelled() {
                return Ok(());
            }
            self.inner.dispatched.fetch_add(1, Ordering::AcqRel);
            log::debug!("Line {}: {:?}", cursor.position(), line.line_type);

            match progress.dispatch(&self.stage, line.clone(), &self.pacer).await {
                Ok(Outcome::Completed) => {}
                Ok(Outcome::Cancelled) => return Ok(()),
                Err(e) => {
                    log::error!("Playback aborted at line {}: {}", cursor.position(), e);
                    self.inner.end_session(Some(self.generation));
                    return Err(e);
                }
            }

            if self.wait_continuation(&line).await.is_cancelled() {
                return Ok(());
            }
            self.set_activity(PlaybackState::dispatching(self.pacer.flags().auto_play()));
        }

        if self.inner.complete(self.generation) {
            log::info!("Playback completed after {} line(s)", cursor.position());
            self.inner.events.emit(PlayerEvent::PlayCompleted);
            self.inner.end_session(Some(self.generation));
        }
        Ok(())
    }

    /// Holds between lines.
    ///
    /// `Interval` lines wait their interval; click and gesture lines wait
    /// for an explicit advance, or for the auto-play delay while auto-play
    /// is on. Fast-forward ends any wait.
    async fn wait_continuation(&self, line: &StoryLine) -> Outcome {
        let advance = self.inner.advance.notified();
        tokio::pin!(advance);
        advance.as_mut().enable();
        self.set_activity(PlaybackState::Waiting);

        let config = &self.inner.config;
        let flags = self.pacer.flags();
        let interval = (!line.continuation.waits_for_input())
            .then(|| line.interval.unwrap_or(config.default_interval));

        let mut ticker = self.pacer.ticker();
        let mut elapsed = 0.0f32;
        loop {
            if flags.fast_forward() {
                return Outcome::Completed;
            }
            // 每个 tick 重新判断，等待中途开启自动播放也会生效
            let limit = interval.or_else(|| flags.auto_play().then_some(config.auto_play_delay));
            if limit.is_some_and(|l| elapsed >= l) {
                return Outcome::Completed;
            }

            tokio::select! {
                biased;
                _ = advance.as_mut() => return Outcome::Completed,
                dt = ticker.tick() => match dt {
                    Some(dt) => elapsed += dt,
                    None => return Outcome::Cancelled,
                },
            }
        }
    }

    fn set_activity(&self, next: PlaybackState) {
        let mut session = self.inner.session();
        if session.generation != self.generation {
            return;
        }
        if session.state == PlaybackState::Paused {
            session.resume_state = Some(next);
        } else if session.state != next {
            log::debug!("{:?} -> {:?}", session.state, next);
            session.state = next;
        }
    }
}
