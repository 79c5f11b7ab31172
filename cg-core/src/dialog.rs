//! Hands the single dialog slot from one box variant to the next.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cg_script::{DialogBoxType, StoryLine};
use rustc_hash::FxHashMap;

use crate::element::{ElementView, TransitionUnit};
use crate::error::{CgError, Result};
use crate::runtime::{Outcome, Pacer};

#[derive(Debug, Default)]
struct Slots {
    current: Option<DialogBoxType>,
    next: Option<DialogBoxType>,
}

/// Owns every dialog box and keeps at most one of them on screen.
pub struct DialogCoordinator {
    boxes: FxHashMap<DialogBoxType, TransitionUnit>,
    slots: Mutex<Slots>,
}

impl DialogCoordinator {
    pub fn new(boxes: impl IntoIterator<Item = (DialogBoxType, TransitionUnit)>) -> Self {
        Self {
            boxes: boxes.into_iter().collect(),
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn current(&self) -> Option<DialogBoxType> {
        self.slots().current
    }

    pub fn next(&self) -> Option<DialogBoxType> {
        self.slots().next
    }

    pub fn get(&self, box_type: DialogBoxType) -> Option<&TransitionUnit> {
        self.boxes.get(&box_type)
    }

    pub fn current_unit(&self) -> Option<&TransitionUnit> {
        self.current().and_then(|t| self.boxes.get(&t))
    }

    /// Shows `line` in the box its text box type selects.
    ///
    /// A different box on screen is faded out first. When the same box is
    /// asked for again it is swapped in place without a fade so consecutive
    /// lines do not flicker.
    pub async fn enter(&self, line: Arc<StoryLine>, pacer: &Pacer) -> Result<Outcome> {
        let box_type = line.text_box_type.dialog_box();
        let target = self.boxes.get(&box_type).ok_or_else(|| {
            CgError::Config(format!("no dialog box registered for {:?}", box_type))
        })?;
        let language = pacer.flags().language();

        if self.current() == Some(box_type) {
            target.hide_immediately();
            target.configure(line, language);
            target.show_immediately();
            return Ok(target.reveal_text(pacer).await);
        }

        self.slots().next = Some(box_type);
        if self.exit(pacer).await.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        target.configure(line, language);
        let outcome = target.enter(pacer).await;
        if outcome.is_cancelled() {
            // 会话已结束，槽位留给下一次 reset
            return Ok(outcome);
        }

        let mut slots = self.slots();
        slots.current = Some(box_type);
        slots.next = None;
        Ok(outcome)
    }

    /// Fades out the box on screen, if any. The box stays current until
    /// its exit completes.
    pub async fn exit(&self, pacer: &Pacer) -> Outcome {
        let Some(box_type) = self.current() else {
            return Outcome::Completed;
        };
        let Some(unit) = self.boxes.get(&box_type) else {
            return Outcome::Completed;
        };

        let outcome = unit.exit(pacer).await;
        if !outcome.is_cancelled() {
            let mut slots = self.slots();
            if slots.current == Some(box_type) {
                slots.current = None;
            }
        }
        outcome
    }

    pub fn skip(&self) {
        for unit in self.boxes.values() {
            unit.skip();
        }
    }

    pub fn reset(&self) {
        for unit in self.boxes.values() {
            unit.reset();
        }
        *self.slots() = Slots::default();
    }

    pub fn views(&self) -> Vec<ElementView> {
        self.boxes.values().filter(|u| u.is_active()).map(TransitionUnit::view).collect()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Appearance, ElementKind, Speeds};
    use crate::event::EventHub;
    use crate::runtime::PlaybackFlags;
    use cg_script::{Language, LineType, TextBoxType};
    use std::time::Duration;
    use tokio::time::sleep;
    use tokio_util::sync::CancellationToken;

    const SPEEDS: Speeds = Speeds { fade: 2.0, typing: 20.0, fast_typing: 100.0 };

    fn coordinator() -> Arc<DialogCoordinator> {
        Arc::new(DialogCoordinator::new([
            (DialogBoxType::Normal, TransitionUnit::new("normal", ElementKind::Dialog, Appearance::Fade, SPEEDS)),
            (DialogBoxType::NoAvatar, TransitionUnit::new("no_avatar", ElementKind::Dialog, Appearance::Fade, SPEEDS)),
        ]))
    }

    fn pacer() -> (Pacer, CancellationToken) {
        let scope = CancellationToken::new();
        let flags = Arc::new(PlaybackFlags::new(Language::English));
        (Pacer::new(scope.clone(), flags, EventHub::new(), Duration::from_millis(50)), scope)
    }

    fn line(box_type: TextBoxType, text: &str) -> Arc<StoryLine> {
        Arc::new(
            StoryLine::new(LineType::Dialog)
                .with_box(box_type)
                .with_character("bob", Some("smile"))
                .with_text(Language::English, text),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn exit_without_current_is_noop() {
        let (pacer, _scope) = pacer();
        let dialogs = coordinator();
        assert_eq!(dialogs.exit(&pacer).await, Outcome::Completed);
        assert_eq!(dialogs.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_boxes_exits_the_old_one_first() {
        let (pacer, _scope) = pacer();
        let dialogs = coordinator();

        let outcome = dialogs.enter(line(TextBoxType::Normal, "Hi"), &pacer).await.unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(dialogs.current(), Some(DialogBoxType::Normal));

        let d = dialogs.clone();
        let p = pacer.clone();
        let task = tokio::spawn(async move { d.enter(line(TextBoxType::NoAvatar, "Bye"), &p).await });
        sleep(Duration::from_millis(120)).await;

        let normal = dialogs.get(DialogBoxType::Normal).unwrap();
        let no_avatar = dialogs.get(DialogBoxType::NoAvatar).unwrap();
        assert_eq!(dialogs.next(), Some(DialogBoxType::NoAvatar));
        assert!(normal.opacity() < 1.0);
        assert!(!no_avatar.is_active());

        assert_eq!(task.await.unwrap().unwrap(), Outcome::Completed);
        assert!(!normal.is_active());
        assert_eq!(normal.opacity(), 0.0);
        assert_eq!(no_avatar.displayed_text(), "Bye");
        assert_eq!(dialogs.current(), Some(DialogBoxType::NoAvatar));
        assert_eq!(dialogs.next(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn same_box_is_swapped_without_fade() {
        let (pacer, _scope) = pacer();
        let dialogs = coordinator();
        dialogs.enter(line(TextBoxType::Normal, "First"), &pacer).await.unwrap();

        let d = dialogs.clone();
        let p = pacer.clone();
        let task = tokio::spawn(async move { d.enter(line(TextBoxType::Normal, "Second line"), &p).await });
        tokio::task::yield_now().await;

        let normal = dialogs.get(DialogBoxType::Normal).unwrap();
        assert_eq!(normal.opacity(), 1.0);
        assert!(normal.is_active());
        assert_eq!(normal.displayed_text(), "");

        assert_eq!(task.await.unwrap().unwrap(), Outcome::Completed);
        assert_eq!(normal.displayed_text(), "Second line");
        assert_eq!(normal.opacity(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_box_is_a_configuration_error() {
        let (pacer, _scope) = pacer();
        let dialogs = DialogCoordinator::new([(
            DialogBoxType::Normal,
            TransitionUnit::new("normal", ElementKind::Dialog, Appearance::Fade, SPEEDS),
        )]);
        let err = dialogs.enter(line(TextBoxType::NoAvatar, "x"), &pacer).await.unwrap_err();
        assert!(matches!(err, CgError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_exit_keeps_ownership() {
        let (pacer, scope) = pacer();
        let dialogs = coordinator();
        dialogs.enter(line(TextBoxType::Normal, "Hi"), &pacer).await.unwrap();

        let d = dialogs.clone();
        let p = pacer.clone();
        let task = tokio::spawn(async move { d.exit(&p).await });
        sleep(Duration::from_millis(120)).await;
        scope.cancel();

        assert_eq!(task.await.unwrap(), Outcome::Cancelled);
        assert_eq!(dialogs.current(), Some(DialogBoxType::Normal));
        let normal = dialogs.get(DialogBoxType::Normal).unwrap();
        assert!(normal.opacity() > 0.0 && normal.opacity() < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_enter_does_not_claim_the_slot() {
        let (pacer, scope) = pacer();
        let dialogs = coordinator();

        let d = dialogs.clone();
        let p = pacer.clone();
        let task = tokio::spawn(async move { d.enter(line(TextBoxType::Normal, "Hi"), &p).await });
        sleep(Duration::from_millis(120)).await;
        scope.cancel();
        assert_eq!(task.await.unwrap().unwrap(), Outcome::Cancelled);

        // 下一次进入同一个对话框时仍然要淡入
        assert_eq!(dialogs.current(), None);
        let normal = dialogs.get(DialogBoxType::Normal).unwrap();
        let frozen = normal.opacity();
        assert!(frozen > 0.0 && frozen < 1.0);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(normal.opacity(), frozen);

        dialogs.reset();
        assert_eq!((dialogs.current(), dialogs.next()), (None, None));
        assert!(!normal.is_active());
    }
}
