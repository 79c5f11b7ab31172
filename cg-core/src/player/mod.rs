//! The playback engine and its control surface.
//!
//! A [`Player`] owns the stage of one chapter and runs its script on a
//! spawned task. Every `play()` opens a session with a fresh cancellation
//! scope; `stop()` cancels it and drops every event listener. Pause never
//! cancels, in-flight operations hold on the pause flag instead.

mod dispatch;
mod run;
mod state;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cg_script::{Language, Script};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::chapter::Chapter;
use crate::config::{PlayerConfig, SystemConfig};
use crate::error::{CgError, Result};
use crate::event::{EventHub, PlayerEvent, Subscription};
use crate::runtime::{Pacer, PlaybackFlags};
use crate::stage::{Stage, StageSnapshot};

pub use state::PlaybackState;

struct Loaded {
    id: String,
    script: Script,
    stage: Arc<Stage>,
}

#[derive(Default)]
struct Session {
    state: PlaybackState,
    resume_state: Option<PlaybackState>,
    chapter: Option<Loaded>,
    scope: CancellationToken,
    /// Bumped whenever a session starts or ends, so a stale run task
    /// cannot touch the state of a newer one.
    generation: u64,
}

pub(crate) struct Inner {
    config: PlayerConfig,
    chapters_root: PathBuf,
    flags: Arc<PlaybackFlags>,
    events: EventHub,
    advance: Notify,
    dispatched: AtomicUsize,
    session: Mutex<Session>,
    /// Held by a run task for its whole life. A new session takes it
    /// before resetting the stage, so a cancelled task is fully gone
    /// first.
    stage_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, generation: u64) -> bool {
        let mut session = self.session();
        if session.generation != generation {
            return false;
        }
        session.state = PlaybackState::Completed;
        session.resume_state = None;
        true
    }

    /// Stop cleanup. With `Some(generation)` only that session is ended.
    fn end_session(&self, generation: Option<u64>) {
        {
            let mut session = self.session();
            if generation.is_some_and(|g| g != session.generation) {
                return;
            }
            session.scope.cancel();
            session.generation += 1;
            session.state = PlaybackState::Idle;
            session.resume_state = None;
        }
        self.flags.set_paused(false);
        self.events.clear();
        log::debug!("Session ended");
    }

    fn stage(&self) -> Option<Arc<Stage>> {
        self.session().chapter.as_ref().map(|c| c.stage.clone())
    }
}

/// Cheap to clone; clones control the same player.
#[derive(Clone)]
pub struct Player {
    inner: Arc<Inner>,
}

impl Player {
    pub fn new(config: PlayerConfig, chapters_root: impl Into<PathBuf>) -> Self {
        let flags = Arc::new(PlaybackFlags::new(config.default_language));
        Self {
            inner: Arc::new(Inner {
                config,
                chapters_root: chapters_root.into(),
                flags,
                events: EventHub::new(),
                advance: Notify::new(),
                dispatched: AtomicUsize::new(0),
                session: Mutex::new(Session::default()),
                stage_lock: Arc::new(tokio::sync::Mutex::new(())),
            }),
        }
    }

    /// A player configured from the `[system]` and `[player]` sections of
    /// the global config.
    pub fn from_config() -> Self {
        let system: SystemConfig = cg_shared::config::get("system");
        Self::new(PlayerConfig::load(), system.chapters_path)
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    /// Loads chapter `chapter_id` from the chapters directory.
    pub async fn initialize(&self, chapter_id: &str) -> Result<()> {
        let chapter = Chapter::load(&self.inner.chapters_root, chapter_id).await?;
        self.load_chapter(chapter)
    }

    /// Builds the stage of `chapter` and makes it the one `play()` runs.
    /// A running session is stopped first.
    pub fn load_chapter(&self, chapter: Chapter) -> Result<()> {
        let stage = Stage::build(&chapter.layout, &self.inner.config)?;
        if self.state().is_live() {
            self.stop();
        }
        self.inner.session().chapter = Some(Loaded {
            id: chapter.id,
            script: chapter.script,
            stage: Arc::new(stage),
        });
        Ok(())
    }

    pub fn chapter_id(&self) -> Option<String> {
        self.inner.session().chapter.as_ref().map(|c| c.id.clone())
    }

    /// Starts a session from the first line.
    ///
    /// Must be called from within a tokio runtime. The stage is reset once
    /// the previous session's task has wound down. The returned handle
    /// resolves once the session ends, with the configuration error that
    /// aborted it if any.
    pub fn play(&self) -> Result<JoinHandle<Result<()>>> {
        let (stage, script, scope, generation) = {
            let mut session = self.inner.session();
            if session.state.is_live() {
                return Err(CgError::AlreadyPlaying);
            }
            let Some(loaded) = session.chapter.as_ref() else {
                return Err(CgError::NotInitialized);
            };
            let stage = loaded.stage.clone();
            let script = loaded.script.clone();

            session.scope = CancellationToken::new();
            session.generation += 1;
            session.state = PlaybackState::dispatching(self.inner.flags.auto_play());
            session.resume_state = None;
            (stage, script, session.scope.clone(), session.generation)
        };

        self.inner.flags.set_paused(false);
        log::info!("Play: {} line(s)", script.len());

        let runner = run::Runner {
            inner: self.inner.clone(),
            stage,
            pacer: Pacer::new(
                scope,
                self.inner.flags.clone(),
                self.inner.events.clone(),
                self.inner.config.tick(),
            ),
            generation,
        };
        Ok(tokio::spawn(runner.run(script)))
    }

    pub fn pause(&self) {
        let mut session = self.inner.session();
        match session.state {
            PlaybackState::Playing | PlaybackState::Waiting | PlaybackState::AutoPlaying => {
                session.resume_state = Some(session.state);
                session.state = PlaybackState::Paused;
                self.inner.flags.set_paused(true);
                log::debug!("Paused");
            }
            other => log::warn!("pause() ignored in state {:?}", other),
        }
    }

    pub fn resume(&self) {
        let mut session = self.inner.session();
        if session.state != PlaybackState::Paused {
            log::warn!("resume() ignored in state {:?}", session.state);
            return;
        }
        let fallback = PlaybackState::dispatching(self.inner.flags.auto_play());
        session.state = session.resume_state.take().unwrap_or(fallback);
        self.inner.flags.set_paused(false);
        log::debug!("Resumed to {:?}", session.state);
    }

    /// Cancels the session and returns to `Idle`. Every event listener is
    /// dropped; hosts subscribe again for the next session.
    pub fn stop(&self) {
        self.inner.end_session(None);
    }

    /// Ends a pending inter-line wait, or snaps whatever is in flight.
    pub fn skip(&self) {
        let state = self.state();
        match state {
            PlaybackState::Waiting => self.inner.advance.notify_waiters(),
            PlaybackState::Playing | PlaybackState::AutoPlaying => {
                if let Some(stage) = self.inner.stage() {
                    stage.skip_all();
                }
            }
            other => log::debug!("skip() ignored in state {:?}", other),
        }
    }

    pub fn hide_text(&self) {
        self.inner.flags.set_text_visible(false);
        self.inner.events.emit(PlayerEvent::HideTextAndUi);
    }

    pub fn show_text(&self) {
        self.inner.flags.set_text_visible(true);
        self.inner.events.emit(PlayerEvent::ShowTextAndUi);
    }

    pub fn text_visible(&self) -> bool {
        self.inner.flags.text_visible()
    }

    pub fn auto_play(&self) -> bool {
        self.inner.flags.auto_play()
    }

    /// Turning auto-play off also turns fast-forward off.
    pub fn set_auto_play(&self, on: bool) {
        let flags = &self.inner.flags;
        if !on && flags.fast_forward() {
            flags.set_fast_forward(false);
            self.inner.events.emit(PlayerEvent::FastForwardChanged);
        }
        if flags.auto_play() == on {
            return;
        }
        flags.set_auto_play(on);

        {
            let mut session = self.inner.session();
            let swap = |s: PlaybackState| if s.is_dispatching() { PlaybackState::dispatching(on) } else { s };
            session.state = swap(session.state);
            session.resume_state = session.resume_state.map(swap);
        }
        self.inner.events.emit(PlayerEvent::AutoPlayChanged);
    }

    pub fn fast_forward(&self) -> bool {
        self.inner.flags.fast_forward()
    }

    /// Turning fast-forward on also turns auto-play on and ends any pending
    /// inter-line wait. While paused the wait holds and ends on the first
    /// tick after `resume()`.
    pub fn set_fast_forward(&self, on: bool) {
        if on {
            self.set_auto_play(true);
        }
        if self.inner.flags.fast_forward() == on {
            return;
        }
        self.inner.flags.set_fast_forward(on);
        self.inner.events.emit(PlayerEvent::FastForwardChanged);
        if on && self.state() != PlaybackState::Paused {
            self.inner.advance.notify_waiters();
        }
    }

    pub fn language(&self) -> Language {
        self.inner.flags.language()
    }

    /// Switches the language; visible text re-renders in place.
    pub fn set_language(&self, language: Language) {
        if self.inner.flags.language() == language {
            return;
        }
        self.inner.flags.set_language(language);
        log::info!("Language -> {}", language);
        self.inner.events.emit(PlayerEvent::LanguageChanged);
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.session().state
    }

    /// Lines dispatched in the current (or last) session.
    pub fn lines_dispatched(&self) -> usize {
        self.inner.dispatched.load(Ordering::Acquire)
    }

    pub fn events(&self) -> &EventHub {
        &self.inner.events
    }

    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(PlayerEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(f)
    }

    pub fn stage(&self) -> Option<Arc<Stage>> {
        self.inner.stage()
    }

    pub fn snapshot(&self) -> StageSnapshot {
        let (state, stage) = {
            let session = self.inner.session();
            (session.state, session.chapter.as_ref().map(|c| c.stage.clone()))
        };
        let flags = &self.inner.flags;
        StageSnapshot {
            state,
            language: flags.language(),
            auto_play: flags.auto_play(),
            fast_forward: flags.fast_forward(),
            text_visible: flags.text_visible(),
            elements: stage.map(|s| s.views()).unwrap_or_default(),
        }
    }
}
