use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cg_script::{Language, StoryLine};
use serde::{Deserialize, Serialize};

use crate::config::PlayerConfig;
use crate::element::typewriter::Typewriter;
use crate::element::ElementView;
use crate::event::{PlayerEvent, Subscription};
use crate::runtime::{Outcome, Pacer};

/// Which operation a unit is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Entering,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElementKind {
    Scene,
    Narration,
    Dialog,
}

/// How a unit becomes visible or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    #[default]
    Fade,
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speeds {
    pub fade: f32,
    pub typing: f32,
    pub fast_typing: f32,
}

impl From<&PlayerConfig> for Speeds {
    fn from(cfg: &PlayerConfig) -> Self {
        Self {
            fade: cfg.fade_speed,
            typing: cfg.type_speed,
            fast_typing: cfg.fast_forward_type_speed,
        }
    }
}

struct UnitState {
    phase: Phase,
    opacity: f32,
    active: bool,
    text: Option<Typewriter>,
    line: Option<Arc<StoryLine>>,
    language_sub: Option<Subscription>,
}

impl UnitState {
    fn relocalize(&mut self, language: Language) {
        let Some(line) = self.line.clone() else { return };
        if let Some(tw) = self.text.as_mut() {
            tw.relocalize(line.text(language));
        }
    }
}

/// A background, narration box or dialog box that can fade in and out.
///
/// Handles are cheap to clone; clones drive the same element, which lets the
/// engine hand one to a spawned exit task while still being able to skip it.
#[derive(Clone)]
pub struct TransitionUnit {
    name: Arc<str>,
    kind: ElementKind,
    appearance: Appearance,
    speeds: Speeds,
    state: Arc<Mutex<UnitState>>,
}

impl TransitionUnit {
    pub fn new(name: impl Into<Arc<str>>, kind: ElementKind, appearance: Appearance, speeds: Speeds) -> Self {
        let text = match kind {
            ElementKind::Scene => None,
            ElementKind::Narration | ElementKind::Dialog => Some(Typewriter::new()),
        };
        Self {
            name: name.into(),
            kind,
            appearance,
            speeds,
            state: Arc::new(Mutex::new(UnitState {
                phase: Phase::Idle,
                opacity: 0.0,
                active: false,
                text,
                line: None,
                language_sub: None,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn opacity(&self) -> f32 {
        self.state().opacity
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    pub fn displayed_text(&self) -> String {
        self.state().text.as_ref().map(|tw| tw.display_text.clone()).unwrap_or_default()
    }

    pub fn line(&self) -> Option<Arc<StoryLine>> {
        self.state().line.clone()
    }

    /// Loads the line this unit will show next, nothing revealed yet.
    pub fn configure(&self, line: Arc<StoryLine>, language: Language) {
        let mut st = self.state();
        if let Some(tw) = st.text.as_mut() {
            tw.set_text(line.text(language));
        }
        st.line = Some(line);
    }

    /// Fades in, then reveals the configured text.
    ///
    /// A cancelled enter leaves the unit exactly as last rendered, phase
    /// included; only a new session's reset clears it.
    pub async fn enter(&self, pacer: &Pacer) -> Outcome {
        {
            let mut st = self.state();
            st.active = true;
            st.phase = Phase::Entering;
        }
        self.watch_language(pacer);

        let outcome = match self.fade_to(1.0, pacer).await {
            Outcome::Completed => self.type_text(pacer).await,
            cancelled => cancelled,
        };
        self.settle(outcome);
        outcome
    }

    /// Reveals the configured text without touching opacity.
    pub async fn reveal_text(&self, pacer: &Pacer) -> Outcome {
        self.state().phase = Phase::Entering;
        self.watch_language(pacer);
        let outcome = self.type_text(pacer).await;
        self.settle(outcome);
        outcome
    }

    /// Fades out; a completed exit leaves the unit inactive with no text.
    pub async fn exit(&self, pacer: &Pacer) -> Outcome {
        {
            let mut st = self.state();
            if !st.active && st.opacity <= 0.0 {
                return Outcome::Completed;
            }
            st.phase = Phase::Exiting;
        }

        let outcome = self.fade_to(0.0, pacer).await;
        if !outcome.is_cancelled() {
            self.hide_immediately();
        }
        self.settle(outcome);
        outcome
    }

    /// Snaps whatever is in flight to its end state.
    pub fn skip(&self) {
        let mut st = self.state();
        match st.phase {
            Phase::Idle => return,
            Phase::Entering => st.opacity = 1.0,
            Phase::Exiting => st.opacity = 0.0,
        }
        if let Some(tw) = st.text.as_mut() {
            tw.skip();
        }
        log::trace!("skip {}", self.name);
    }

    pub fn show_immediately(&self) {
        let mut st = self.state();
        st.active = true;
        st.opacity = 1.0;
    }

    pub fn hide_immediately(&self) {
        let sub = {
            let mut st = self.state();
            st.active = false;
            st.opacity = 0.0;
            st.line = None;
            if let Some(tw) = st.text.as_mut() {
                tw.clear();
            }
            st.language_sub.take()
        };
        drop(sub);
    }

    /// Back to the initial hidden, idle state.
    pub fn reset(&self) {
        self.hide_immediately();
        self.state().phase = Phase::Idle;
    }

    pub fn relocalize(&self, language: Language) {
        self.state().relocalize(language);
    }

    pub fn view(&self) -> ElementView {
        let st = self.state();
        ElementView {
            name: self.name.to_string(),
            kind: self.kind,
            phase: st.phase,
            opacity: st.opacity,
            active: st.active,
            text: st.text.as_ref().map(|tw| tw.display_text.clone()).unwrap_or_default(),
            text_complete: st.text.as_ref().is_none_or(|tw| !tw.is_active()),
            speaker: st.line.as_ref().and_then(|l| l.character.clone()),
            expression: st.line.as_ref().and_then(|l| l.expression.clone()),
            frame: None,
        }
    }

    async fn fade_to(&self, target: f32, pacer: &Pacer) -> Outcome {
        if self.appearance == Appearance::Immediate {
            self.state().opacity = target;
            return Outcome::Completed;
        }

        let mut ticker = pacer.ticker();
        loop {
            {
                let mut st = self.state();
                if st.opacity == target {
                    return Outcome::Completed;
                }
                if pacer.flags().fast_forward() {
                    st.opacity = target;
                    return Outcome::Completed;
                }
            }

            let Some(dt) = ticker.tick().await else {
                return Outcome::Cancelled;
            };

            let step = self.speeds.fade * dt;
            let mut st = self.state();
            st.opacity = if target > st.opacity {
                (st.opacity + step).min(target)
            } else {
                (st.opacity - step).max(target)
            };
        }
    }

    async fn type_text(&self, pacer: &Pacer) -> Outcome {
        let mut ticker = pacer.ticker();
        loop {
            let typing = self.state().text.as_ref().is_some_and(Typewriter::is_active);
            if !typing {
                return Outcome::Completed;
            }

            let Some(dt) = ticker.tick().await else {
                return Outcome::Cancelled;
            };

            let speed = if pacer.flags().fast_forward() {
                self.speeds.fast_typing
            } else {
                self.speeds.typing
            };
            if let Some(tw) = self.state().text.as_mut() {
                tw.update(dt, speed);
            }
        }
    }

    /// Re-renders the text whenever the language changes while shown.
    fn watch_language(&self, pacer: &Pacer) {
        if self.kind == ElementKind::Scene {
            return;
        }
        let weak = Arc::downgrade(&self.state);
        let flags = pacer.flags().clone();
        let sub = pacer.events().on(PlayerEvent::LanguageChanged, move || {
            if let Some(state) = weak.upgrade() {
                let mut st = state.lock().unwrap_or_else(PoisonError::into_inner);
                st.relocalize(flags.language());
            }
        });

        // 替换旧订阅，避免重复注册
        let old = self.state().language_sub.replace(sub);
        drop(old);
    }

    /// Back to idle once an operation finished. A cancelled session never
    /// writes to the unit again.
    fn settle(&self, outcome: Outcome) {
        if !outcome.is_cancelled() {
            self.state().phase = Phase::Idle;
        }
    }

    fn state(&self) -> MutexGuard<'_, UnitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
