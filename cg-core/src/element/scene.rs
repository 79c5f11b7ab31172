use std::sync::Arc;

use crate::animator::SceneAnimator;
use crate::element::unit::{Appearance, ElementKind, Speeds, TransitionUnit};
use crate::element::ElementView;

/// A background with its frame animation and the narration boxes laid over it.
#[derive(Clone)]
pub struct Scene {
    unit: TransitionUnit,
    background: Arc<str>,
    animator: SceneAnimator,
    narrations: Arc<[TransitionUnit]>,
}

impl Scene {
    pub fn new(
        name: &str,
        background: &str,
        animator: SceneAnimator,
        narration_names: &[String],
        speeds: Speeds,
    ) -> Self {
        let narrations = narration_names
            .iter()
            .map(|n| TransitionUnit::new(format!("{name}/{n}"), ElementKind::Narration, Appearance::Fade, speeds))
            .collect();

        Self {
            unit: TransitionUnit::new(name, ElementKind::Scene, Appearance::Fade, speeds),
            background: background.into(),
            animator,
            narrations,
        }
    }

    pub fn name(&self) -> &str {
        self.unit.name()
    }

    pub fn unit(&self) -> &TransitionUnit {
        &self.unit
    }

    pub fn animator(&self) -> &SceneAnimator {
        &self.animator
    }

    pub fn narrations(&self) -> &[TransitionUnit] {
        &self.narrations
    }

    pub fn narration(&self, index: usize) -> Option<&TransitionUnit> {
        self.narrations.get(index)
    }

    pub fn skip(&self) {
        self.unit.skip();
        self.animator.skip();
        for n in self.narrations.iter() {
            n.skip();
        }
    }

    pub fn reset(&self) {
        self.unit.reset();
        self.animator.reset();
        for n in self.narrations.iter() {
            n.reset();
        }
    }

    pub fn view(&self) -> ElementView {
        let mut view = self.unit.view();
        view.frame = Some(
            self.animator
                .current_frame()
                .unwrap_or_else(|| self.background.to_string()),
        );
        view
    }
}
