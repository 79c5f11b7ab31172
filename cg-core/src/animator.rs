//! Frame-by-frame playback of a scene's sprite sequence.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::runtime::{Outcome, Pacer};

#[derive(Debug, Default)]
struct AnimState {
    current: Option<usize>,
    playing: bool,
    skip_requested: bool,
}

#[derive(Clone)]
pub struct SceneAnimator {
    frames: Arc<[String]>,
    frame_rate: u32,
    state: Arc<Mutex<AnimState>>,
}

impl SceneAnimator {
    pub fn new(frames: Vec<String>, frame_rate: u32) -> Self {
        Self {
            frames: frames.into(),
            frame_rate: frame_rate.max(1),
            state: Arc::new(Mutex::new(AnimState::default())),
        }
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Time each frame stays on screen, `1000 / frame_rate` milliseconds.
    pub fn frame_interval(&self) -> f32 {
        (1000 / self.frame_rate) as f32 / 1000.0
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state().current
    }

    pub fn current_frame(&self) -> Option<String> {
        self.state().current.and_then(|i| self.frames.get(i).cloned())
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    /// Shows every frame in order, each for one frame interval of unpaused
    /// time. The last frame stays visible afterwards.
    pub async fn play(&self, pacer: &Pacer) -> Outcome {
        if self.frames.is_empty() {
            return Outcome::Completed;
        }
        {
            let mut st = self.state();
            st.playing = true;
            st.skip_requested = false;
            st.current = Some(0);
        }

        let interval = self.frame_interval();
        let last = self.frames.len() - 1;
        let mut ticker = pacer.ticker();
        let mut index = 0;
        let mut elapsed = 0.0f32;

        let outcome = 'frames: loop {
            while elapsed < interval {
                if self.state().skip_requested {
                    self.state().current = Some(last);
                    break 'frames Outcome::Completed;
                }
                match ticker.tick().await {
                    Some(dt) => elapsed += dt,
                    None => break 'frames Outcome::Cancelled,
                }
            }
            elapsed -= interval;

            if index == last {
                break Outcome::Completed;
            }
            index += 1;
            self.state().current = Some(index);
        };

        // 被取消的会话不再改动状态
        if !outcome.is_cancelled() {
            let mut st = self.state();
            st.playing = false;
            st.skip_requested = false;
        }
        outcome
    }

    /// Jumps a running animation to its last frame and ends it.
    pub fn skip(&self) {
        let mut st = self.state();
        if st.playing {
            st.skip_requested = true;
        }
    }

    pub fn reset(&self) {
        *self.state() = AnimState::default();
    }

    fn state(&self) -> MutexGuard<'_, AnimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHub;
    use crate::runtime::PlaybackFlags;
    use std::time::Duration;
    use tokio::time::sleep;
    use tokio_util::sync::CancellationToken;

    fn frames(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}.png")).collect()
    }

    fn pacer() -> (Pacer, CancellationToken) {
        let scope = CancellationToken::new();
        let pacer = Pacer::new(
            scope.clone(),
            Arc::new(PlaybackFlags::default()),
            EventHub::new(),
            Duration::from_millis(10),
        );
        (pacer, scope)
    }

    #[tokio::test(start_paused = true)]
    async fn plays_all_frames_at_frame_rate() {
        let (pacer, _scope) = pacer();
        let anim = SceneAnimator::new(frames(4), 10);
        let probe = anim.clone();
        assert!((anim.frame_interval() - 0.1).abs() < 1e-6);

        let task = tokio::spawn(async move { anim.play(&pacer).await });
        sleep(Duration::from_millis(55)).await;
        assert_eq!(probe.current_index(), Some(0));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(probe.current_index(), Some(1));
        sleep(Duration::from_millis(200)).await;
        assert_eq!(probe.current_frame().as_deref(), Some("f3.png"));

        assert_eq!(task.await.unwrap(), Outcome::Completed);
        assert_eq!(probe.current_index(), Some(3));
        assert!(!probe.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_the_frame() {
        let (pacer, _scope) = pacer();
        let flags = pacer.flags().clone();
        let anim = SceneAnimator::new(frames(3), 10);
        let probe = anim.clone();

        let task = tokio::spawn(async move { anim.play(&pacer).await });
        sleep(Duration::from_millis(155)).await;
        assert_eq!(probe.current_index(), Some(1));
        flags.set_paused(true);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(probe.current_index(), Some(1));
        flags.set_paused(false);
        assert_eq!(task.await.unwrap(), Outcome::Completed);
        assert_eq!(probe.current_index(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_keeps_last_shown_frame() {
        let (pacer, scope) = pacer();
        let anim = SceneAnimator::new(frames(5), 10);
        let probe = anim.clone();

        let task = tokio::spawn(async move { anim.play(&pacer).await });
        sleep(Duration::from_millis(255)).await;
        scope.cancel();
        assert_eq!(task.await.unwrap(), Outcome::Cancelled);
        assert_eq!(probe.current_index(), Some(2));
        assert!(probe.is_playing());

        probe.reset();
        assert!(!probe.is_playing());
        assert_eq!(probe.current_index(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_jumps_to_last_frame() {
        let (pacer, _scope) = pacer();
        let anim = SceneAnimator::new(frames(8), 4);
        let probe = anim.clone();

        let task = tokio::spawn(async move { anim.play(&pacer).await });
        sleep(Duration::from_millis(30)).await;
        probe.skip();
        assert_eq!(task.await.unwrap(), Outcome::Completed);
        assert_eq!(probe.current_index(), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn no_frames_completes_at_once() {
        let (pacer, _scope) = pacer();
        let anim = SceneAnimator::new(Vec::new(), 8);
        assert_eq!(anim.play(&pacer).await, Outcome::Completed);
        assert_eq!(anim.current_frame(), None);
    }
}
